//! Reconciliation: joining the three feeds into enriched view events.
//!
//! Each load is a one-shot batch: [`reconcile`] consumes fresh snapshots of
//! the three feeds and returns an independently-owned [`ReconciledSet`].
//! There is no ambient state; every rollup consumer receives the set (or a
//! [`CategorySlice`] of it) as an argument. Embedders that allow overlapping
//! refreshes must keep the latest-completing set and discard earlier ones.

use std::collections::HashMap;

use crate::phone::PhoneIndex;
use crate::types::{CampaignRecord, EngineConfig, EnrichedViewEvent, UserProfile, ViewEvent};

/// Campaign lookup keyed by `distribution_id` and, for records carrying an
/// A/B group tag, by `distribution_id|tag`.
///
/// Only allow-listed source labels participate. On resolve, a compound-key
/// hit never falls through to the plain key, even if the plain entry names a
/// different campaign.
struct CampaignIndex<'a> {
    by_key: HashMap<String, &'a CampaignRecord>,
}

fn compound_key(distribution_id: &str, ab_group_tag: &str) -> String {
    format!("{distribution_id}|{ab_group_tag}")
}

impl<'a> CampaignIndex<'a> {
    fn build(campaigns: &'a [CampaignRecord], config: &EngineConfig) -> Self {
        let mut by_key = HashMap::new();
        for record in campaigns {
            if !config.is_source_allowed(&record.source_label) {
                continue;
            }
            by_key.insert(record.distribution_id.clone(), record);
            if !record.ab_group_tag.is_empty() {
                by_key.insert(
                    compound_key(&record.distribution_id, &record.ab_group_tag),
                    record,
                );
            }
        }
        Self { by_key }
    }

    fn resolve(&self, event: &ViewEvent) -> Option<&'a CampaignRecord> {
        if !event.ab_group_tag.is_empty() {
            if let Some(record) = self
                .by_key
                .get(&compound_key(&event.distribution_id, &event.ab_group_tag))
            {
                return Some(record);
            }
        }
        self.by_key.get(event.distribution_id.as_str()).copied()
    }
}

/// The result of one load: the enriched event set plus the eligible
/// (allow-listed) campaign records the rollups attribute against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledSet {
    pub events: Vec<EnrichedViewEvent>,
    pub campaigns: Vec<CampaignRecord>,
}

/// A read-only, category-filtered view of a [`ReconciledSet`], the unit all
/// rollups are computed over.
#[derive(Debug, Clone)]
pub struct CategorySlice<'a> {
    /// The selected category; `None` is the unfiltered "all" view. Campaign
    /// rollups use this to decide whether campaigns without slice events
    /// still appear (they do only in the "all" view, since a campaign is
    /// tied to a category through its events).
    pub category: Option<String>,
    pub events: Vec<&'a EnrichedViewEvent>,
    pub campaigns: &'a [CampaignRecord],
}

impl ReconciledSet {
    /// Slices the set by content category; `None` selects every event.
    pub fn slice(&self, category: Option<&str>) -> CategorySlice<'_> {
        let events = self
            .events
            .iter()
            .filter(|e| category.is_none_or(|c| e.event.content_category == c))
            .collect();
        CategorySlice {
            category: category.map(str::to_string),
            events,
            campaigns: &self.campaigns,
        }
    }

    /// Distinct content categories in first-seen order, for selector UIs.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for event in &self.events {
            let category = event.event.content_category.as_str();
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }
}

/// Joins events against the directory and the campaign log and applies the
/// inclusion rules.
///
/// An event with no resolved campaign is dropped; an event whose matched
/// profile has an excluded specialty is dropped; an event with no profile
/// match is kept with empty profile fields (anonymous viewing passes
/// through). Output order follows input event order, so reconciling the same
/// snapshots twice yields identical sets.
pub fn reconcile(
    events: &[ViewEvent],
    profiles: &[UserProfile],
    campaigns: &[CampaignRecord],
    config: &EngineConfig,
) -> ReconciledSet {
    let phone_index = PhoneIndex::build(profiles);
    let campaign_index = CampaignIndex::build(campaigns, config);

    let mut enriched = Vec::new();
    let mut dropped_no_campaign = 0_usize;
    let mut dropped_specialty = 0_usize;

    for event in events {
        let Some(campaign) = campaign_index.resolve(event) else {
            dropped_no_campaign += 1;
            continue;
        };

        let profile = phone_index.resolve(&event.phone_raw);
        if let Some(profile) = profile {
            if config.is_specialty_excluded(&profile.specialty) {
                dropped_specialty += 1;
                continue;
            }
        }

        enriched.push(EnrichedViewEvent {
            event: event.clone(),
            full_name: profile.map_or_else(String::new, |p| p.full_name.clone()),
            specialty: profile.map_or_else(String::new, |p| p.specialty.clone()),
            workplace: profile.map_or_else(String::new, |p| p.workplace.clone()),
            district: profile.map_or_else(String::new, |p| p.district.clone()),
            campaign_name: campaign.campaign_name.clone(),
            sms_text: campaign.sms_text.clone(),
            has_user_match: profile.is_some(),
            has_campaign_match: true,
        });
    }

    let eligible: Vec<CampaignRecord> = campaigns
        .iter()
        .filter(|c| config.is_source_allowed(&c.source_label))
        .cloned()
        .collect();

    tracing::info!(
        kept = enriched.len(),
        dropped_no_campaign,
        dropped_specialty,
        eligible_campaign_rows = eligible.len(),
        "reconciled load"
    );

    ReconciledSet {
        events: enriched,
        campaigns: eligible,
    }
}

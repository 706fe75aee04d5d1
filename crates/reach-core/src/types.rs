//! Domain records and derived statistics.
//!
//! The three source feeds arrive as string-typed rows ([`ViewEvent`],
//! [`UserProfile`], [`CampaignRecord`] keep the original text fields).
//! Reconciliation produces [`EnrichedViewEvent`]s; aggregation derives
//! [`CampaignStatistic`], [`ClientStatistic`] and [`TimeSeriesPoint`].

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One occurrence of a subject viewing a piece of content.
///
/// Fields are carried as they appeared in the source; in particular
/// `timestamp` stays unparsed (different consumers parse it under different
/// null policies) and `view_percent` is not clamped to 0–100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEvent {
    pub timestamp: String,
    pub phone_raw: String,
    pub content_category: String,
    pub video_name: String,
    pub view_duration_seconds: u32,
    pub view_percent: u32,
    pub session_id: String,
    /// Join key to the campaign log.
    pub distribution_id: String,
    /// Optional secondary join key; empty means "no A/B group".
    pub ab_group_tag: String,
}

/// One row of the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub phone_raw: String,
    pub full_name: String,
    pub specialty: String,
    pub workplace: String,
    pub district: String,
}

/// One row of the campaign log (one per contact batch, so several rows may
/// share a `campaign_name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRecord {
    /// Must match the configured allow list to participate in joins.
    pub source_label: String,
    pub distribution_id: String,
    pub ab_group_tag: String,
    pub campaign_name: String,
    pub sms_text: String,
    pub contacts_sent: u32,
    pub timestamp: String,
}

/// A view event joined against the directory and the campaign log.
///
/// Created once per load by reconciliation and never mutated. Profile fields
/// are empty strings when the phone matched no directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedViewEvent {
    #[serde(flatten)]
    pub event: ViewEvent,
    pub full_name: String,
    pub specialty: String,
    pub workplace: String,
    pub district: String,
    pub campaign_name: String,
    pub sms_text: String,
    pub has_user_match: bool,
    pub has_campaign_match: bool,
}

/// Per-campaign rollup over one category slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignStatistic {
    pub campaign_name: String,
    /// Max parsable timestamp over the campaign's contributing records.
    pub latest_timestamp: Option<NaiveDateTime>,
    /// Sum of `contacts_sent` over every record with this name, repeated
    /// batches included.
    pub sms_sent: u64,
    /// Proportionally rounded estimate; the per-campaign values always sum
    /// to the rounded grand total.
    pub sms_viewed_estimate: i64,
    /// Slice events attributed to this campaign, each distribution id
    /// counted once.
    pub page_views: u64,
}

/// Per-client rollup (distinct normalized phone with a matched name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStatistic {
    pub phone: String,
    pub full_name: String,
    pub specialty: String,
    pub workplace: String,
    pub page_views: u64,
    pub total_view_seconds: u64,
}

/// One daily bucket of the view time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub count: u64,
}

/// Counts per day of week, Monday first.
pub type WeekdayHistogram = [u64; 7];

/// Counts per hour of day.
pub type HourHistogram = [u64; 24];

/// Engine configuration, owned by the embedding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Campaign rows whose `source_label` is not listed here are invisible
    /// to the join and to the rollups.
    #[serde(default)]
    pub allowed_sources: Vec<String>,

    /// Specialty values whose matched events are dropped during
    /// reconciliation.
    #[serde(default)]
    pub excluded_specialties: Vec<String>,

    /// SMS-view estimator ratio per content category.
    #[serde(default)]
    pub category_view_ratios: HashMap<String, f64>,

    /// Ratio applied to categories absent from `category_view_ratios`.
    #[serde(default = "default_view_ratio")]
    pub default_view_ratio: f64,
}

const fn default_view_ratio() -> f64 {
    1.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allowed_sources: Vec::new(),
            excluded_specialties: Vec::new(),
            category_view_ratios: HashMap::new(),
            default_view_ratio: default_view_ratio(),
        }
    }
}

impl EngineConfig {
    /// Returns the estimator ratio for a content category.
    pub fn view_ratio(&self, category: &str) -> f64 {
        self.category_view_ratios
            .get(category)
            .copied()
            .unwrap_or(self.default_view_ratio)
    }

    pub fn is_source_allowed(&self, source_label: &str) -> bool {
        self.allowed_sources.iter().any(|s| s == source_label)
    }

    pub fn is_specialty_excluded(&self, specialty: &str) -> bool {
        self.excluded_specialties.iter().any(|s| s == specialty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_ratio_falls_back_to_default() {
        let mut config = EngineConfig::default();
        config.category_view_ratios.insert("cardio".to_string(), 0.4);
        config.default_view_ratio = 0.25;

        assert!((config.view_ratio("cardio") - 0.4).abs() < f64::EPSILON);
        assert!((config.view_ratio("unknown") - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn default_config_allows_nothing_and_excludes_nothing() {
        let config = EngineConfig::default();
        assert!(!config.is_source_allowed("Allowed"));
        assert!(!config.is_specialty_excluded("Не врач"));
    }

    #[test]
    fn enriched_event_serializes_flat() {
        let enriched = EnrichedViewEvent {
            event: ViewEvent {
                timestamp: "05.03.2024 14:30:00".to_string(),
                phone_raw: "+375 29 111-22-33".to_string(),
                content_category: "cardio".to_string(),
                video_name: "intro".to_string(),
                view_duration_seconds: 42,
                view_percent: 80,
                session_id: "s-1".to_string(),
                distribution_id: "D1".to_string(),
                ab_group_tag: String::new(),
            },
            full_name: "Ivanova".to_string(),
            specialty: "Cardiologist".to_string(),
            workplace: String::new(),
            district: String::new(),
            campaign_name: "X".to_string(),
            sms_text: String::new(),
            has_user_match: true,
            has_campaign_match: true,
        };

        let json: serde_json::Value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(json["distribution_id"], "D1");
        assert_eq!(json["campaign_name"], "X");
        assert_eq!(json["has_user_match"], true);
    }
}

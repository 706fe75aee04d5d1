//! Rollups over a category slice.
//!
//! All aggregation is recomputed from a fresh [`CategorySlice`] on every
//! load; nothing here holds state between calls. The campaign rollup carries
//! the one numerically delicate rule in the system: per-campaign "SMS
//! viewed" estimates are fractional and must round so that their sum equals
//! the rounded grand total ([`apportion`]).

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Timelike};

use crate::phone;
use crate::reconcile::CategorySlice;
use crate::timestamp;
use crate::types::{
    CampaignStatistic, ClientStatistic, EngineConfig, HourHistogram, TimeSeriesPoint,
    WeekdayHistogram,
};

/// Rounds a list of fractional estimates so the rounded values sum to the
/// rounded grand total.
///
/// Every entry but the last rounds to nearest; the last receives the
/// remainder of the rounded total. The rounding error therefore lands
/// entirely on the final entry, which is why callers must iterate campaigns
/// in a fixed first-seen order.
pub fn apportion(fractions: &[f64]) -> Vec<i64> {
    let Some((_, head)) = fractions.split_last() else {
        return Vec::new();
    };

    #[allow(clippy::cast_possible_truncation)]
    let total = fractions.iter().sum::<f64>().round() as i64;
    #[allow(clippy::cast_possible_truncation)]
    let mut values: Vec<i64> = head.iter().map(|f| f.round() as i64).collect();
    let assigned: i64 = values.iter().sum();
    values.push(total - assigned);
    values
}

/// Computes per-campaign statistics over the slice.
///
/// Campaign records group by `campaign_name` in first-seen campaign-log
/// order. In the unfiltered view every allow-listed campaign appears, even
/// with zero attributed events; in a category-filtered view only campaigns
/// whose distribution ids occur in the slice do, since that is the only link
/// between a campaign and a category.
pub fn campaign_rollup(slice: &CategorySlice<'_>, config: &EngineConfig) -> Vec<CampaignStatistic> {
    // Per-distribution event count and fractional view estimate. The ratio
    // is looked up per event so mixed-category slices stay consistent.
    let mut by_id: HashMap<&str, (u64, f64)> = HashMap::new();
    for event in &slice.events {
        let entry = by_id
            .entry(event.event.distribution_id.as_str())
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += config.view_ratio(&event.event.content_category);
    }

    // Group eligible records by campaign name, first-seen order.
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&crate::types::CampaignRecord>> = HashMap::new();
    for record in slice.campaigns {
        if slice.category.is_some() && !by_id.contains_key(record.distribution_id.as_str()) {
            continue;
        }
        let name = record.campaign_name.as_str();
        if !groups.contains_key(name) {
            order.push(name);
        }
        groups.entry(name).or_default().push(record);
    }

    let mut stats = Vec::with_capacity(order.len());
    let mut fractions = Vec::with_capacity(order.len());
    for name in order {
        let records = &groups[name];

        // Repeated contact batches for the same campaign all count.
        let sms_sent: u64 = records.iter().map(|r| u64::from(r.contacts_sent)).sum();

        // Unparsable timestamps never update the max.
        let latest_timestamp = records
            .iter()
            .filter_map(|r| timestamp::parse(&r.timestamp))
            .max();

        // Each distribution id is attributed once per campaign, even when
        // several batch rows share it.
        let mut seen_ids: HashSet<&str> = HashSet::new();
        let mut page_views = 0_u64;
        let mut fraction = 0.0_f64;
        for record in records {
            if !seen_ids.insert(record.distribution_id.as_str()) {
                continue;
            }
            if let Some((count, estimate)) = by_id.get(record.distribution_id.as_str()) {
                page_views += count;
                fraction += estimate;
            }
        }

        fractions.push(fraction);
        stats.push(CampaignStatistic {
            campaign_name: name.to_string(),
            latest_timestamp,
            sms_sent,
            sms_viewed_estimate: 0,
            page_views,
        });
    }

    for (stat, value) in stats.iter_mut().zip(apportion(&fractions)) {
        stat.sms_viewed_estimate = value;
    }
    stats
}

/// Computes per-client statistics over the slice.
///
/// Only events with a usable phone and a resolved name participate; sorted
/// by page views descending, ties by name.
pub fn client_rollup(slice: &CategorySlice<'_>) -> Vec<ClientStatistic> {
    let mut order: Vec<String> = Vec::new();
    let mut clients: HashMap<String, ClientStatistic> = HashMap::new();

    for event in &slice.events {
        if event.full_name.is_empty() {
            continue;
        }
        let key = phone::canonical(&event.event.phone_raw);
        if key.is_empty() {
            continue;
        }
        let stat = clients.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            ClientStatistic {
                phone: key.clone(),
                full_name: event.full_name.clone(),
                specialty: event.specialty.clone(),
                workplace: event.workplace.clone(),
                page_views: 0,
                total_view_seconds: 0,
            }
        });
        stat.page_views += 1;
        stat.total_view_seconds += u64::from(event.event.view_duration_seconds);
    }

    let mut stats: Vec<ClientStatistic> = order
        .into_iter()
        .map(|key| clients.remove(&key).expect("keyed by order"))
        .collect();
    stats.sort_by(|a, b| {
        b.page_views
            .cmp(&a.page_views)
            .then_with(|| a.full_name.cmp(&b.full_name))
    });
    stats
}

/// Daily view counts, sorted chronologically by the parsed date. Events with
/// unparsable timestamps contribute to no bucket.
pub fn daily_series(slice: &CategorySlice<'_>) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
    for event in &slice.events {
        if let Some(parsed) = timestamp::parse(&event.event.timestamp) {
            *buckets.entry(parsed.date()).or_insert(0) += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(date, count)| TimeSeriesPoint { date, count })
        .collect()
}

/// View counts per day of week, Monday first.
pub fn weekday_histogram(slice: &CategorySlice<'_>) -> WeekdayHistogram {
    let mut histogram = [0_u64; 7];
    for event in &slice.events {
        if let Some(parsed) = timestamp::parse(&event.event.timestamp) {
            histogram[parsed.weekday().num_days_from_monday() as usize] += 1;
        }
    }
    histogram
}

/// View counts per hour of day.
pub fn hour_histogram(slice: &CategorySlice<'_>) -> HourHistogram {
    let mut histogram = [0_u64; 24];
    for event in &slice.events {
        if let Some(parsed) = timestamp::parse(&event.event.timestamp) {
            histogram[parsed.hour() as usize] += 1;
        }
    }
    histogram
}

/// Mean `view_percent` over events that registered one. A zero percentage
/// means "did not register", not "watched 0%", and is excluded.
#[allow(clippy::cast_precision_loss)]
pub fn average_view_percent(slice: &CategorySlice<'_>) -> Option<f64> {
    let percents: Vec<u64> = slice
        .events
        .iter()
        .filter(|e| e.event.view_percent > 0)
        .map(|e| u64::from(e.event.view_percent))
        .collect();
    if percents.is_empty() {
        return None;
    }
    Some(percents.iter().sum::<u64>() as f64 / percents.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::ReconciledSet;
    use crate::types::{CampaignRecord, EnrichedViewEvent, ViewEvent};

    fn enriched(
        distribution_id: &str,
        category: &str,
        timestamp: &str,
        phone: &str,
        name: &str,
    ) -> EnrichedViewEvent {
        EnrichedViewEvent {
            event: ViewEvent {
                timestamp: timestamp.to_string(),
                phone_raw: phone.to_string(),
                content_category: category.to_string(),
                video_name: "intro".to_string(),
                view_duration_seconds: 30,
                view_percent: 50,
                session_id: "s".to_string(),
                distribution_id: distribution_id.to_string(),
                ab_group_tag: String::new(),
            },
            full_name: name.to_string(),
            specialty: String::new(),
            workplace: String::new(),
            district: String::new(),
            campaign_name: String::new(),
            sms_text: String::new(),
            has_user_match: !name.is_empty(),
            has_campaign_match: true,
        }
    }

    fn campaign(distribution_id: &str, name: &str, sent: u32, ts: &str) -> CampaignRecord {
        CampaignRecord {
            source_label: "Allowed".to_string(),
            distribution_id: distribution_id.to_string(),
            ab_group_tag: String::new(),
            campaign_name: name.to_string(),
            sms_text: String::new(),
            contacts_sent: sent,
            timestamp: ts.to_string(),
        }
    }

    fn set(events: Vec<EnrichedViewEvent>, campaigns: Vec<CampaignRecord>) -> ReconciledSet {
        ReconciledSet { events, campaigns }
    }

    // ========== apportion ==========

    #[test]
    fn apportion_empty_input() {
        assert!(apportion(&[]).is_empty());
    }

    #[test]
    fn apportion_single_value_gets_rounded_total() {
        assert_eq!(apportion(&[2.6]), vec![3]);
    }

    #[test]
    fn apportion_sum_equals_rounded_total() {
        // Naive rounding would give 1 + 1 + 1 = 3, but the total 1.4*3 = 4.2
        // rounds to 4; the last entry absorbs the residual.
        let values = apportion(&[1.4, 1.4, 1.4]);
        assert_eq!(values, vec![1, 1, 2]);
        assert_eq!(values.iter().sum::<i64>(), 4);
    }

    #[test]
    fn apportion_residual_can_be_negative_adjustment() {
        // 0.6 + 0.6 + 0.6 = 1.8 -> 2, naive would sum to 3.
        let values = apportion(&[0.6, 0.6, 0.6]);
        assert_eq!(values.iter().sum::<i64>(), 2);
        assert_eq!(values, vec![1, 1, 0]);
    }

    #[test]
    fn apportion_exact_values_are_untouched() {
        assert_eq!(apportion(&[2.0, 3.0, 5.0]), vec![2, 3, 5]);
    }

    // ========== campaign rollup ==========

    #[test]
    fn rollup_sums_batches_but_counts_views_once() {
        // Two batch rows share D2; three events reference it.
        let s = set(
            vec![
                enriched("D2", "cardio", "05.03.2024", "", ""),
                enriched("D2", "cardio", "06.03.2024", "", ""),
                enriched("D2", "cardio", "07.03.2024", "", ""),
            ],
            vec![
                campaign("D2", "Y", 50, "01.03.2024"),
                campaign("D2", "Y", 50, "02.03.2024"),
            ],
        );
        let stats = campaign_rollup(&s.slice(None), &EngineConfig::default());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].sms_sent, 100);
        assert_eq!(stats[0].page_views, 3);
    }

    #[test]
    fn rollup_includes_eventless_campaign_in_all_view() {
        let s = set(vec![], vec![campaign("D1", "X", 100, "01.03.2024")]);
        let stats = campaign_rollup(&s.slice(None), &EngineConfig::default());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].sms_sent, 100);
        assert_eq!(stats[0].page_views, 0);
        assert_eq!(stats[0].sms_viewed_estimate, 0);
    }

    #[test]
    fn rollup_excludes_unrelated_campaign_in_category_view() {
        let s = set(
            vec![enriched("D1", "cardio", "05.03.2024", "", "")],
            vec![
                campaign("D1", "X", 100, "01.03.2024"),
                campaign("D9", "Z", 40, "01.03.2024"),
            ],
        );
        let stats = campaign_rollup(&s.slice(Some("cardio")), &EngineConfig::default());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].campaign_name, "X");
    }

    #[test]
    fn rollup_latest_timestamp_ignores_unparsable() {
        let s = set(
            vec![enriched("D1", "cardio", "05.03.2024", "", "")],
            vec![
                campaign("D1", "X", 10, "01.03.2024"),
                campaign("D1", "X", 10, "soon"),
                campaign("D1", "X", 10, "15.02.2024"),
            ],
        );
        let stats = campaign_rollup(&s.slice(None), &EngineConfig::default());
        assert_eq!(
            stats[0].latest_timestamp,
            timestamp::parse("01.03.2024")
        );
        assert_eq!(stats[0].sms_sent, 30);
    }

    #[test]
    fn rollup_page_views_sum_matches_slice_size() {
        let s = set(
            vec![
                enriched("D1", "cardio", "05.03.2024", "", ""),
                enriched("D1", "cardio", "05.03.2024", "", ""),
                enriched("D2", "cardio", "06.03.2024", "", ""),
            ],
            vec![
                campaign("D1", "X", 100, "01.03.2024"),
                campaign("D2", "Y", 50, "02.03.2024"),
            ],
        );
        let slice = s.slice(None);
        let stats = campaign_rollup(&slice, &EngineConfig::default());
        let total: u64 = stats.iter().map(|c| c.page_views).sum();
        assert_eq!(total as usize, slice.events.len());
    }

    #[test]
    fn rollup_estimates_reconcile_with_grand_total() {
        let config = EngineConfig {
            default_view_ratio: 0.7,
            ..EngineConfig::default()
        };

        // Three campaigns with one event each: fractions 0.7 each, grand
        // total 2.1 -> 2. Naive per-campaign rounding would sum to 3.
        let s = set(
            vec![
                enriched("D1", "cardio", "05.03.2024", "", ""),
                enriched("D2", "cardio", "05.03.2024", "", ""),
                enriched("D3", "cardio", "05.03.2024", "", ""),
            ],
            vec![
                campaign("D1", "A", 10, "01.03.2024"),
                campaign("D2", "B", 10, "01.03.2024"),
                campaign("D3", "C", 10, "01.03.2024"),
            ],
        );
        let stats = campaign_rollup(&s.slice(None), &config);
        let sum: i64 = stats.iter().map(|c| c.sms_viewed_estimate).sum();
        assert_eq!(sum, 2);
        assert_eq!(stats[0].sms_viewed_estimate, 1);
        assert_eq!(stats[1].sms_viewed_estimate, 1);
        assert_eq!(stats[2].sms_viewed_estimate, 0);
    }

    #[test]
    fn rollup_uses_category_specific_ratio() {
        let mut config = EngineConfig::default();
        config.category_view_ratios.insert("cardio".to_string(), 0.5);

        let s = set(
            vec![
                enriched("D1", "cardio", "05.03.2024", "", ""),
                enriched("D1", "cardio", "05.03.2024", "", ""),
            ],
            vec![campaign("D1", "X", 10, "01.03.2024")],
        );
        let stats = campaign_rollup(&s.slice(Some("cardio")), &config);
        assert_eq!(stats[0].sms_viewed_estimate, 1);
    }

    #[test]
    fn rollup_groups_in_first_seen_order() {
        let s = set(
            vec![
                enriched("D1", "cardio", "05.03.2024", "", ""),
                enriched("D2", "cardio", "05.03.2024", "", ""),
            ],
            vec![
                campaign("D2", "Second", 10, "01.03.2024"),
                campaign("D1", "First", 10, "01.03.2024"),
            ],
        );
        let stats = campaign_rollup(&s.slice(None), &EngineConfig::default());
        assert_eq!(stats[0].campaign_name, "Second");
        assert_eq!(stats[1].campaign_name, "First");
    }

    // ========== client rollup ==========

    #[test]
    fn client_rollup_groups_by_normalized_phone() {
        let s = set(
            vec![
                enriched("D1", "cardio", "05.03.2024", "+375 29 111-22-33", "Ivanova"),
                enriched("D1", "cardio", "06.03.2024", "375291112233", "Ivanova"),
                enriched("D1", "cardio", "06.03.2024", "375440000000", "Petrova"),
            ],
            vec![],
        );
        let stats = client_rollup(&s.slice(None));
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].full_name, "Ivanova");
        assert_eq!(stats[0].page_views, 2);
        assert_eq!(stats[0].total_view_seconds, 60);
        assert_eq!(stats[1].page_views, 1);
    }

    #[test]
    fn client_rollup_skips_anonymous_and_phoneless_events() {
        let s = set(
            vec![
                enriched("D1", "cardio", "05.03.2024", "375291112233", ""),
                enriched("D1", "cardio", "05.03.2024", "", "Ghost"),
            ],
            vec![],
        );
        assert!(client_rollup(&s.slice(None)).is_empty());
    }

    // ========== time series ==========

    #[test]
    fn daily_series_buckets_and_sorts_by_parsed_date() {
        let s = set(
            vec![
                enriched("D1", "cardio", "06.03.2024 10:00:00", "", ""),
                enriched("D1", "cardio", "05.03.2024 23:59:59", "", ""),
                enriched("D1", "cardio", "05.03.2024", "", ""),
                enriched("D1", "cardio", "not a date", "", ""),
            ],
            vec![],
        );
        let series = daily_series(&s.slice(None));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(series[0].count, 2);
        assert_eq!(series[1].count, 1);
    }

    #[test]
    fn histograms_bucket_by_weekday_and_hour() {
        // 05.03.2024 is a Tuesday.
        let s = set(
            vec![
                enriched("D1", "cardio", "05.03.2024 14:30:00", "", ""),
                enriched("D1", "cardio", "05.03.2024 14:59:00", "", ""),
                enriched("D1", "cardio", "garbage", "", ""),
            ],
            vec![],
        );
        let slice = s.slice(None);
        let weekdays = weekday_histogram(&slice);
        assert_eq!(weekdays[1], 2);
        assert_eq!(weekdays.iter().sum::<u64>(), 2);

        let hours = hour_histogram(&slice);
        assert_eq!(hours[14], 2);
        assert_eq!(hours.iter().sum::<u64>(), 2);
    }

    // ========== average view percent ==========

    #[test]
    fn average_excludes_zero_percent_events() {
        let mut zero = enriched("D1", "cardio", "05.03.2024", "", "");
        zero.event.view_percent = 0;
        let mut eighty = enriched("D1", "cardio", "05.03.2024", "", "");
        eighty.event.view_percent = 80;
        let mut twenty = enriched("D1", "cardio", "05.03.2024", "", "");
        twenty.event.view_percent = 20;

        let s = set(vec![zero, eighty, twenty], vec![]);
        let average = average_view_percent(&s.slice(None)).unwrap();
        assert!((average - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_is_none_when_nothing_registered() {
        let mut zero = enriched("D1", "cardio", "05.03.2024", "", "");
        zero.event.view_percent = 0;
        let s = set(vec![zero], vec![]);
        assert!(average_view_percent(&s.slice(None)).is_none());
    }
}

//! Dump the reconciled event set as JSON lines.

use std::io::Write;

use anyhow::Result;
use reach_core::ReconciledSet;

pub fn run<W: Write>(writer: &mut W, set: &ReconciledSet, category: Option<&str>) -> Result<()> {
    let slice = set.slice(category);
    for event in &slice.events {
        writeln!(writer, "{}", serde_json::to_string(event)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::{CampaignRecord, EngineConfig, ViewEvent, reconcile};

    #[test]
    fn dumps_one_json_line_per_event() {
        let engine = EngineConfig {
            allowed_sources: vec!["Viber".to_string()],
            ..EngineConfig::default()
        };
        let events = vec![ViewEvent {
            timestamp: "05.03.2024".to_string(),
            phone_raw: String::new(),
            content_category: "cardio".to_string(),
            video_name: "intro".to_string(),
            view_duration_seconds: 10,
            view_percent: 20,
            session_id: "s-1".to_string(),
            distribution_id: "D1".to_string(),
            ab_group_tag: String::new(),
        }];
        let campaigns = vec![CampaignRecord {
            source_label: "Viber".to_string(),
            distribution_id: "D1".to_string(),
            ab_group_tag: String::new(),
            campaign_name: "X".to_string(),
            sms_text: String::new(),
            contacts_sent: 5,
            timestamp: "01.03.2024".to_string(),
        }];
        let set = reconcile(&events, &[], &campaigns, &engine);

        let mut buffer = Vec::new();
        run(&mut buffer, &set, None).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(value["campaign_name"], "X");
        assert_eq!(value["has_campaign_match"], true);
    }
}

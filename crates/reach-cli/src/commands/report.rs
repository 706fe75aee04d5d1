//! Campaign report command.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;
use reach_core::{CampaignStatistic, EngineConfig, ReconciledSet, aggregate};
use serde::Serialize;

/// Computed report data for one category selection.
#[derive(Debug)]
pub struct ReportData {
    pub category: Option<String>,
    pub campaigns: Vec<CampaignStatistic>,
    pub event_count: usize,
    pub average_view_percent: Option<f64>,
}

/// Generates report data from a reconciled set.
pub fn generate(
    set: &ReconciledSet,
    engine: &EngineConfig,
    category: Option<&str>,
) -> ReportData {
    let slice = set.slice(category);
    let campaigns = aggregate::campaign_rollup(&slice, engine);
    ReportData {
        category: category.map(str::to_string),
        campaigns,
        event_count: slice.events.len(),
        average_view_percent: aggregate::average_view_percent(&slice),
    }
}

fn format_category(category: Option<&str>) -> String {
    category.map_or_else(|| "all categories".to_string(), |c| format!("category \"{c}\""))
}

fn format_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    timestamp.map_or_else(|| "-".to_string(), |t| t.format("%d.%m.%Y %H:%M").to_string())
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "CAMPAIGN REPORT: {}",
        format_category(data.category.as_deref())
    )
    .unwrap();
    writeln!(output).unwrap();

    if data.campaigns.is_empty() {
        writeln!(output, "No campaigns matched this selection.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<32} {:>8} {:>8} {:>7}  {}",
        "CAMPAIGN", "SENT", "VIEWED~", "VIEWS", "LAST SENT"
    )
    .unwrap();
    for campaign in &data.campaigns {
        writeln!(
            output,
            "{:<32} {:>8} {:>8} {:>7}  {}",
            campaign.campaign_name,
            campaign.sms_sent,
            campaign.sms_viewed_estimate,
            campaign.page_views,
            format_timestamp(campaign.latest_timestamp),
        )
        .unwrap();
    }

    let total_sent: u64 = data.campaigns.iter().map(|c| c.sms_sent).sum();
    let total_viewed: i64 = data.campaigns.iter().map(|c| c.sms_viewed_estimate).sum();
    let total_views: u64 = data.campaigns.iter().map(|c| c.page_views).sum();

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Events:           {}", data.event_count).unwrap();
    writeln!(output, "SMS sent:         {total_sent}").unwrap();
    writeln!(output, "Estimated viewed: {total_viewed}").unwrap();
    writeln!(output, "Page views:       {total_views}").unwrap();
    match data.average_view_percent {
        Some(average) => writeln!(output, "Average watched:  {average:.1}%").unwrap(),
        None => writeln!(output, "Average watched:  n/a").unwrap(),
    }

    output
}

/// JSON report structure.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    category: Option<&'a str>,
    campaigns: &'a [CampaignStatistic],
    totals: JsonTotals,
}

#[derive(Debug, Serialize)]
struct JsonTotals {
    event_count: usize,
    sms_sent: u64,
    sms_viewed_estimate: i64,
    page_views: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    average_view_percent: Option<f64>,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let report = JsonReport {
        category: data.category.as_deref(),
        campaigns: &data.campaigns,
        totals: JsonTotals {
            event_count: data.event_count,
            sms_sent: data.campaigns.iter().map(|c| c.sms_sent).sum(),
            sms_viewed_estimate: data.campaigns.iter().map(|c| c.sms_viewed_estimate).sum(),
            page_views: data.campaigns.iter().map(|c| c.page_views).sum(),
            average_view_percent: data.average_view_percent,
        },
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the report command against an already-loaded set.
pub fn run<W: Write>(
    writer: &mut W,
    set: &ReconciledSet,
    engine: &EngineConfig,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let data = generate(set, engine, category);
    if json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }
    Ok(())
}

//! One-shot load: fetch the three feeds and reconcile them.

use anyhow::{Context, Result, bail};
use reach_core::{CampaignRecord, ReconciledSet, UserProfile, ViewEvent, reconcile};
use reach_sheets::Client;

use crate::config::{Config, SourceRef};

fn require_sheet<'a>(source: &'a SourceRef, name: &str) -> Result<&'a str> {
    if source.sheet.is_empty() {
        bail!("missing {name} source (set sources.{name}.sheet in config.toml)");
    }
    Ok(&source.sheet)
}

/// Fetches all three feeds concurrently and reconciles them into a fresh
/// [`ReconciledSet`].
///
/// The engine never sees a partial load: any fetch failure aborts the whole
/// load and nothing is returned.
pub fn run(config: &Config) -> Result<ReconciledSet> {
    let events_sheet = require_sheet(&config.sources.events, "events")?;
    let directory_sheet = require_sheet(&config.sources.directory, "directory")?;
    let campaigns_sheet = require_sheet(&config.sources.campaigns, "campaigns")?;

    let client = Client::new().context("failed to create fetch client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let (event_rows, profile_rows, campaign_rows) = runtime
        .block_on(async {
            tokio::try_join!(
                client.fetch_rows(events_sheet, config.sources.events.tab.as_deref()),
                client.fetch_rows(directory_sheet, config.sources.directory.tab.as_deref()),
                client.fetch_rows(campaigns_sheet, config.sources.campaigns.tab.as_deref()),
            )
        })
        .context("failed to fetch source feeds")?;

    let events: Vec<ViewEvent> = event_rows.iter().map(ViewEvent::from_row).collect();
    let profiles: Vec<UserProfile> = profile_rows.iter().map(UserProfile::from_row).collect();
    let campaigns: Vec<CampaignRecord> = campaign_rows.iter().map(CampaignRecord::from_row).collect();
    tracing::debug!(
        events = events.len(),
        profiles = profiles.len(),
        campaigns = campaigns.len(),
        "fetched feeds"
    );

    Ok(reconcile(&events, &profiles, &campaigns, &config.engine))
}

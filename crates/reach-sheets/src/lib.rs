//! Published-spreadsheet fetch layer.
//!
//! Each of the three feeds lives in a published spreadsheet tab. This crate
//! fetches a tab's CSV export over HTTP and hands the engine parsed rows.
//! Fetch failures surface as [`SheetsError`] and fail the whole load; there
//! is no retry here and the caller keeps its previous state.

use std::fmt;
use std::time::Duration;

use reach_core::RawRow;
use thiserror::Error;

/// Default request timeout for feed fetches.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const EXPORT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Fetch layer errors (the transport taxonomy: fatal to the current load).
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// The HTTP request itself failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The source responded with a non-success status.
    #[error("source {source_id} responded with status {status}")]
    Status { source_id: String, status: u16 },
    /// The response body could not be read as a table.
    #[error(transparent)]
    Parse(#[from] reach_core::EngineError),
}

/// HTTP client for published-CSV exports.
///
/// Safe to clone and share; clones reuse the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(SheetsError::ClientBuild)?;
        Ok(Self { http })
    }

    /// Fetches one tab of a published spreadsheet as parsed rows.
    pub async fn fetch_rows(
        &self,
        source_id: &str,
        subsheet_id: Option<&str>,
    ) -> Result<Vec<RawRow>, SheetsError> {
        let url = export_url(source_id, subsheet_id);
        tracing::debug!(source_id, subsheet = subsheet_id, "fetching feed");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SheetsError::Status {
                source_id: source_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let rows = reach_core::parse_table(&body)?;
        tracing::debug!(source_id, rows = rows.len(), "fetched feed");
        Ok(rows)
    }
}

/// Assembles the CSV export URL for a spreadsheet tab.
fn export_url(source_id: &str, subsheet_id: Option<&str>) -> String {
    match subsheet_id {
        Some(gid) => format!("{EXPORT_BASE_URL}/{source_id}/export?format=csv&gid={gid}"),
        None => format!("{EXPORT_BASE_URL}/{source_id}/export?format=csv"),
    }
}

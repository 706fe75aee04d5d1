//! Tabular source reading and field mapping.
//!
//! The three feeds arrive as delimited text. [`parse_table`] turns a feed into
//! ordered [`RawRow`]s; the `from_row` constructors below are the only place
//! that knows which header means what. Missing columns read as empty strings
//! and missing numeric fields read as zero ([`int_or_zero`]), so a malformed
//! row degrades to an empty-field record instead of failing the load.

use std::sync::Arc;

use crate::error::EngineError;
use crate::types::{CampaignRecord, UserProfile, ViewEvent};

/// One source line: ordered values addressable by the header of its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl RawRow {
    /// Builds a row from a shared header and its values.
    pub const fn new(headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Returns the value under `column`, or `""` if the column is absent or
    /// the row is shorter than the header.
    pub fn get(&self, column: &str) -> &str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|idx| self.values.get(idx))
            .map_or("", String::as_str)
    }
}

/// Parses delimited text into rows. The first line is the header; header
/// cells and values are trimmed. Rows shorter or longer than the header are
/// accepted as-is.
pub fn parse_table(text: &str) -> Result<Vec<RawRow>, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Arc<Vec<String>> =
        Arc::new(reader.headers()?.iter().map(str::to_string).collect());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let values = record.iter().map(str::to_string).collect();
        rows.push(RawRow::new(Arc::clone(&headers), values));
    }
    tracing::debug!(rows = rows.len(), "parsed tabular source");
    Ok(rows)
}

/// Numeric conversion used for every count/duration column: the leading
/// digit run of the trimmed value, or 0 when there is none.
pub fn int_or_zero(value: &str) -> u32 {
    let digits: String = value
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Header names of the event log feed.
mod event_columns {
    pub const TIMESTAMP: &str = "Дата и время";
    pub const PHONE: &str = "Телефон";
    pub const CATEGORY: &str = "Категория";
    pub const VIDEO: &str = "Видео";
    pub const DURATION: &str = "Длительность";
    pub const PERCENT: &str = "Процент просмотра";
    pub const SESSION: &str = "Сессия";
    pub const DISTRIBUTION: &str = "Рассылка";
    pub const AB_GROUP: &str = "Группа";
}

/// Header names of the identity directory feed.
mod profile_columns {
    pub const PHONE: &str = "Телефон";
    pub const FULL_NAME: &str = "ФИО";
    pub const SPECIALTY: &str = "Специальность";
    pub const WORKPLACE: &str = "Место работы";
    pub const DISTRICT: &str = "Район";
}

/// Header names of the campaign log feed.
mod campaign_columns {
    pub const SOURCE: &str = "Источник";
    pub const DISTRIBUTION: &str = "Рассылка";
    pub const AB_GROUP: &str = "Группа";
    pub const CAMPAIGN: &str = "Кампания";
    pub const SMS_TEXT: &str = "Текст SMS";
    pub const CONTACTS: &str = "Отправлено";
    pub const TIMESTAMP: &str = "Дата";
}

impl ViewEvent {
    /// Maps an event-log row to a typed record.
    pub fn from_row(row: &RawRow) -> Self {
        use event_columns as col;
        Self {
            timestamp: row.get(col::TIMESTAMP).to_string(),
            phone_raw: row.get(col::PHONE).to_string(),
            content_category: row.get(col::CATEGORY).to_string(),
            video_name: row.get(col::VIDEO).to_string(),
            view_duration_seconds: int_or_zero(row.get(col::DURATION)),
            view_percent: int_or_zero(row.get(col::PERCENT)),
            session_id: row.get(col::SESSION).to_string(),
            distribution_id: row.get(col::DISTRIBUTION).to_string(),
            ab_group_tag: row.get(col::AB_GROUP).to_string(),
        }
    }
}

impl UserProfile {
    /// Maps an identity-directory row to a typed record.
    pub fn from_row(row: &RawRow) -> Self {
        use profile_columns as col;
        Self {
            phone_raw: row.get(col::PHONE).to_string(),
            full_name: row.get(col::FULL_NAME).to_string(),
            specialty: row.get(col::SPECIALTY).to_string(),
            workplace: row.get(col::WORKPLACE).to_string(),
            district: row.get(col::DISTRICT).to_string(),
        }
    }
}

impl CampaignRecord {
    /// Maps a campaign-log row to a typed record.
    pub fn from_row(row: &RawRow) -> Self {
        use campaign_columns as col;
        Self {
            source_label: row.get(col::SOURCE).to_string(),
            distribution_id: row.get(col::DISTRIBUTION).to_string(),
            ab_group_tag: row.get(col::AB_GROUP).to_string(),
            campaign_name: row.get(col::CAMPAIGN).to_string(),
            sms_text: row.get(col::SMS_TEXT).to_string(),
            contacts_sent: int_or_zero(row.get(col::CONTACTS)),
            timestamp: row.get(col::TIMESTAMP).to_string(),
        }
    }
}

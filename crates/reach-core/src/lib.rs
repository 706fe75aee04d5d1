//! Core reconciliation and aggregation engine.
//!
//! This crate contains the pure, synchronous logic for:
//! - Table reading: delimited feeds into typed records
//! - Reconciliation: joining events against the directory and campaign log
//! - Aggregation: campaign/client rollups and time-bucketed series
//!
//! It performs no I/O; the fetch layer hands it complete snapshots of the
//! three feeds and every load produces a fresh, independently-owned result.

pub mod aggregate;
mod error;
pub mod phone;
pub mod reconcile;
pub mod table;
pub mod timestamp;
pub mod types;

pub use error::EngineError;
pub use reconcile::{CategorySlice, ReconciledSet, reconcile};
pub use table::{RawRow, int_or_zero, parse_table};
pub use types::{
    CampaignRecord, CampaignStatistic, ClientStatistic, EngineConfig, EnrichedViewEvent,
    HourHistogram, TimeSeriesPoint, UserProfile, ViewEvent, WeekdayHistogram,
};

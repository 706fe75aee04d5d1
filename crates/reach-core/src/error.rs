//! Engine errors.
//!
//! The engine degrades on bad data instead of failing: malformed rows become
//! empty-field records, unparsable timestamps become `None`, unmatched events
//! are filtering outcomes. The only error it surfaces is a source that cannot
//! be read as a table at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A source could not be read as delimited text.
    #[error("failed to read tabular source: {0}")]
    Table(#[from] csv::Error),
}

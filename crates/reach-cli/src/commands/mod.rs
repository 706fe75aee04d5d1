//! CLI command implementations.

pub mod clients;
pub mod events;
pub mod load;
pub mod report;
pub mod series;

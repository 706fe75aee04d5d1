//! Reach CLI library.
//!
//! This crate provides the CLI interface for the reach analytics tool.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, SourceRef, SourcesConfig};

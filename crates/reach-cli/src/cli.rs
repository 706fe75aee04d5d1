//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SMS campaign reach and video-view analytics.
///
/// Fetches the event log, identity directory and campaign log from their
/// published spreadsheet tabs, reconciles them into one enriched record per
/// view, and reports campaign, client and time-bucketed rollups.
#[derive(Debug, Parser)]
#[command(name = "reach", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Per-campaign rollup with the load summary.
    Report {
        /// Restrict to one content category.
        #[arg(long)]
        category: Option<String>,

        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Per-client rollup.
    Clients {
        /// Restrict to one content category.
        #[arg(long)]
        category: Option<String>,

        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Daily series and day-of-week / hour-of-day histograms.
    Series {
        /// Restrict to one content category.
        #[arg(long)]
        category: Option<String>,

        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Dump the reconciled event set as JSON lines.
    Events {
        /// Restrict to one content category.
        #[arg(long)]
        category: Option<String>,
    },
}

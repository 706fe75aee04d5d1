//! Client report command.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use reach_core::{ClientStatistic, ReconciledSet, aggregate};
use serde::Serialize;

/// Formats seconds of watch time for the table.
/// Returns "Xh Ym" above an hour, "Xm Ys" above a minute, "Xs" otherwise.
pub fn format_watch_time(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else if minutes >= 1 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Formats the human-readable client table.
pub fn format_clients(category: Option<&str>, clients: &[ClientStatistic]) -> String {
    let mut output = String::new();

    let selection = category.map_or_else(
        || "all categories".to_string(),
        |c| format!("category \"{c}\""),
    );
    writeln!(output, "CLIENT REPORT: {selection}").unwrap();
    writeln!(output).unwrap();

    if clients.is_empty() {
        writeln!(output, "No identified clients in this selection.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<28} {:<24} {:>6}  {}",
        "NAME", "SPECIALTY", "VIEWS", "WATCH TIME"
    )
    .unwrap();
    for client in clients {
        writeln!(
            output,
            "{:<28} {:<24} {:>6}  {}",
            client.full_name,
            client.specialty,
            client.page_views,
            format_watch_time(client.total_view_seconds),
        )
        .unwrap();
    }

    output
}

#[derive(Debug, Serialize)]
struct JsonClients<'a> {
    category: Option<&'a str>,
    clients: &'a [ClientStatistic],
}

/// Runs the clients command against an already-loaded set.
pub fn run<W: Write>(
    writer: &mut W,
    set: &ReconciledSet,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let slice = set.slice(category);
    let clients = aggregate::client_rollup(&slice);

    if json {
        let report = JsonClients {
            category,
            clients: &clients,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_clients(category, &clients))?;
    }
    Ok(())
}

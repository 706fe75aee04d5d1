//! Time-series report command: daily counts plus weekday and hour histograms.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use reach_core::{HourHistogram, ReconciledSet, TimeSeriesPoint, WeekdayHistogram, aggregate};
use serde::Serialize;

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Generates a 10-character bar scaled to `max`.
/// Non-zero values below 5% of max still get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return "░░░░░░░░░░".to_string();
    }
    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Formats the human-readable series output.
pub fn format_series(
    category: Option<&str>,
    daily: &[TimeSeriesPoint],
    weekdays: &WeekdayHistogram,
    hours: &HourHistogram,
) -> String {
    let mut output = String::new();

    let selection = category.map_or_else(
        || "all categories".to_string(),
        |c| format!("category \"{c}\""),
    );
    writeln!(output, "VIEW SERIES: {selection}").unwrap();

    writeln!(output).unwrap();
    writeln!(output, "DAILY").unwrap();
    writeln!(output, "─────").unwrap();
    if daily.is_empty() {
        writeln!(output, "(no dated events)").unwrap();
    } else {
        let max = daily.iter().map(|p| p.count).max().unwrap_or(0);
        for point in daily {
            writeln!(
                output,
                "{}  {:>5}  {}",
                point.date.format("%d.%m.%Y"),
                point.count,
                bar(point.count, max)
            )
            .unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "BY WEEKDAY").unwrap();
    writeln!(output, "──────────").unwrap();
    let weekday_max = weekdays.iter().copied().max().unwrap_or(0);
    for (label, count) in WEEKDAY_LABELS.iter().zip(weekdays.iter()) {
        writeln!(output, "{label}  {count:>5}  {}", bar(*count, weekday_max)).unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "BY HOUR").unwrap();
    writeln!(output, "───────").unwrap();
    let hour_max = hours.iter().copied().max().unwrap_or(0);
    for (hour, count) in hours.iter().enumerate() {
        writeln!(output, "{hour:>02}  {count:>5}  {}", bar(*count, hour_max)).unwrap();
    }

    output
}

#[derive(Debug, Serialize)]
struct JsonSeries<'a> {
    category: Option<&'a str>,
    daily: &'a [TimeSeriesPoint],
    weekdays: &'a WeekdayHistogram,
    hours: &'a HourHistogram,
}

/// Runs the series command against an already-loaded set.
pub fn run<W: Write>(
    writer: &mut W,
    set: &ReconciledSet,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let slice = set.slice(category);
    let daily = aggregate::daily_series(&slice);
    let weekdays = aggregate::weekday_histogram(&slice);
    let hours = aggregate::hour_histogram(&slice);

    if json {
        let report = JsonSeries {
            category,
            daily: &daily,
            weekdays: &weekdays,
            hours: &hours,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_series(category, &daily, &weekdays, &hours))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn bar_scales_and_clamps() {
        assert_eq!(bar(100, 100), "██████████");
        assert_eq!(bar(50, 100), "█████░░░░░");
        assert_eq!(bar(1, 100), "█░░░░░░░░░");
        assert_eq!(bar(0, 0), "░░░░░░░░░░");
    }

    #[test]
    fn format_series_renders_all_sections() {
        let daily = vec![
            TimeSeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                count: 2,
            },
            TimeSeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
                count: 1,
            },
        ];
        let mut weekdays = [0_u64; 7];
        weekdays[1] = 2;
        weekdays[2] = 1;
        let mut hours = [0_u64; 24];
        hours[14] = 3;

        let output = format_series(None, &daily, &weekdays, &hours);
        assert!(output.contains("VIEW SERIES: all categories"));
        assert!(output.contains("05.03.2024      2  ██████████"));
        assert!(output.contains("Tue      2"));
        assert!(output.contains("14      3"));
    }

    #[test]
    fn format_series_empty_daily() {
        let output = format_series(Some("cardio"), &[], &[0; 7], &[0; 24]);
        assert!(output.contains("(no dated events)"));
    }
}

// Powermon CLI - Text renderer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Plain-text rendering of the dashboard view.

use chrono::NaiveDateTime;
use powermon::summary::{time_range, trend_line, DebugInfo, Summary};
use powermon::table::{Table, CURRENT, ENTITY_ID, POWER, STATUS, TIMESTAMP, VOLTAGE};
use powermon::{DashboardSession, MAX_BUFFER_SIZE};
use std::fmt::Write;

const CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rows listed under "Latest readings".
const LATEST_ROWS: usize = 5;

/// Shown when there is nothing to display.
pub const NO_DATA_PROMPT: &str =
    "No sensor data available. Run a fetch to generate simulated data.";

/// Render one dashboard frame.
pub fn frame(session: &DashboardSession) -> String {
    let mut out = String::new();
    let view = session.view();
    let settings = session.settings();

    let _ = writeln!(out, "Power Monitoring Dashboard");
    match session.last_refresh() {
        Some(at) => {
            let _ = writeln!(out, "Last updated: {}", at.format(CLOCK_FORMAT));
        }
        None => {
            let _ = writeln!(out, "Last updated: never");
        }
    }

    if view.is_empty() {
        let _ = writeln!(out, "{}", NO_DATA_PROMPT);
    } else {
        out.push_str(&metrics(&view));
        if let Some(line) = trend_line(&view) {
            let _ = writeln!(
                out,
                "Trend: current = {:.4} * voltage {:+.4} ({} points)",
                line.slope, line.intercept, line.points
            );
        }
        out.push_str(&latest(&view));
    }

    if settings.simulation {
        let _ = writeln!(out, "---");
        let _ = writeln!(
            out,
            "Real-time simulation active, {} points per tick",
            settings.simulation_speed
        );
        let buffer = session.buffer();
        if !buffer.is_empty() {
            if let Some((from, to)) = time_range(&view) {
                let _ = writeln!(
                    out,
                    "Simulation stats: {}/{} points in buffer, showing {} to {} (cursor {} of {})",
                    buffer.len(),
                    MAX_BUFFER_SIZE,
                    from.format("%H:%M:%S"),
                    to.format("%H:%M:%S"),
                    session.cursor().position(),
                    session.batch().len()
                );
            }
        }
    }

    let _ = writeln!(out, "---");
    let _ = writeln!(out, "{}", footer(session));
    out
}

/// Metric tiles for a table.
pub fn metrics(table: &Table) -> String {
    let summary = Summary::of(table);
    format!(
        "Total Readings: {} | Average Voltage: {} | Average Current: {} | Average Power: {}\n",
        summary.total_readings,
        tile(summary.avg_voltage, "V"),
        tile(summary.avg_current, "A"),
        tile(summary.avg_power, "W"),
    )
}

fn tile(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.2} {}", v, unit),
        None => "n/a".to_string(),
    }
}

fn latest(table: &Table) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Latest readings:");
    let tail = table.tail(LATEST_ROWS);
    for i in 0..tail.len() {
        let cell = |name: &str| {
            tail.cell(i, name)
                .map(|c| c.to_string())
                .unwrap_or_default()
        };
        let _ = writeln!(
            out,
            "  {:<26} {:<12} {:>8} V {:>7} A {:>9} W  {}",
            cell(TIMESTAMP),
            cell(ENTITY_ID),
            short(&cell(VOLTAGE)),
            short(&cell(CURRENT)),
            short(&cell(POWER)),
            cell(STATUS)
        );
    }
    out
}

/// Round numeric text to two decimals; pass anything else through.
fn short(text: &str) -> String {
    match text.parse::<f64>() {
        Ok(v) => format!("{:.2}", v),
        Err(_) => text.to_string(),
    }
}

/// Refresh-mode footer.
pub fn footer(session: &DashboardSession) -> String {
    let settings = session.settings();
    if settings.simulation {
        format!(
            "Simulating real-time data flow, next update every {}s.",
            powermon::config::TICK_PERIOD.as_secs()
        )
    } else if settings.auto_refresh {
        format!(
            "Auto-refresh is enabled. Data will update every {} seconds.",
            settings.refresh_interval_secs
        )
    } else {
        "Auto-refresh is disabled. Run a fetch to update.".to_string()
    }
}

/// Multi-line troubleshooting report.
pub fn debug_report(info: &DebugInfo, window: Option<(NaiveDateTime, NaiveDateTime)>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Powermon v{}", powermon::VERSION);
    if let Some((start, end)) = window {
        let _ = writeln!(
            out,
            "Date range: {} to {}",
            start.format(CLOCK_FORMAT),
            end.format(CLOCK_FORMAT)
        );
    }
    let _ = writeln!(out, "Data shape: ({}, {})", info.rows, info.columns.len());

    let _ = writeln!(out, "Key columns present:");
    for (name, present) in &info.key_columns {
        let _ = writeln!(out, "  {}: {}", name, present);
    }

    let _ = writeln!(out, "Data types:");
    for column in &info.columns {
        let _ = writeln!(out, "  {}: {}", column.name, column.kind);
    }

    let _ = writeln!(out, "Missing value counts:");
    for (name, nulls) in &info.null_counts {
        let _ = writeln!(out, "  {}: {}", name, nulls);
    }

    if info.sample.is_empty() {
        let _ = writeln!(out, "Table is empty");
    } else {
        let _ = writeln!(out, "Sample data (first {} rows):", info.sample.len());
        for record in &info.sample {
            let _ = writeln!(out, "  {}", serde_json::Value::Object(record.clone()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use powermon::{DashboardSettings, EntityFilter, FetchWindow};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn loaded(settings: DashboardSettings) -> DashboardSession {
        let mut session = DashboardSession::new(settings).unwrap();
        let window = FetchWindow::new(now() - Duration::hours(2), now()).unwrap();
        session.fetch(window, EntityFilter::All, now());
        session
    }

    #[test]
    fn test_empty_session_prompts_for_data() {
        let session = DashboardSession::new(DashboardSettings::default()).unwrap();
        let text = frame(&session);
        assert!(text.contains(NO_DATA_PROMPT));
        assert!(text.contains("Last updated: never"));
        assert!(text.contains("Auto-refresh is disabled"));
    }

    #[test]
    fn test_batch_frame() {
        let session = loaded(DashboardSettings::new().with_seed(1).with_auto_refresh(10));
        let text = frame(&session);

        assert!(text.contains("Total Readings: 27"));
        assert!(text.contains("Last updated: 2024-02-01 10:00:00"));
        assert!(text.contains("Trend: current ="));
        assert!(text.contains("every 10 seconds"));
        assert!(!text.contains(NO_DATA_PROMPT));
    }

    #[test]
    fn test_simulation_frame() {
        let mut session = loaded(DashboardSettings::new().with_seed(2).with_simulation(4));
        session.tick(now());
        let text = frame(&session);

        assert!(text.contains("Total Readings: 4"));
        assert!(text.contains("Real-time simulation active, 4 points per tick"));
        assert!(text.contains("4/100 points in buffer"));
        assert!(text.contains("cursor 4 of 27"));
    }

    #[test]
    fn test_metric_tiles_without_values() {
        assert_eq!(
            metrics(&Table::empty()),
            "Total Readings: 0 | Average Voltage: n/a | Average Current: n/a | Average Power: n/a\n"
        );
    }

    #[test]
    fn test_debug_report() {
        let session = loaded(DashboardSettings::new().with_seed(3));
        let info = DebugInfo::of(session.batch());
        let text = debug_report(&info, Some((now() - Duration::hours(2), now())));

        assert!(text.contains("Data shape: (27, 6)"));
        assert!(text.contains("power: true"));
        assert!(text.contains("voltage: float"));
        assert!(text.contains("Sample data (first 5 rows):"));
    }
}

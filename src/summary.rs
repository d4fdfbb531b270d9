// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Summary metrics and diagnostics over a processed table.

use crate::table::{
    Column, ColumnKind, Record, Table, CURRENT, ENTITY_ID, POWER, TIMESTAMP, VOLTAGE,
};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Rows shown in the debug sample.
pub const DEBUG_SAMPLE_ROWS: usize = 5;

/// Headline metrics for the current view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_readings: usize,
    pub avg_voltage: Option<f64>,
    pub avg_current: Option<f64>,
    pub avg_power: Option<f64>,
}

impl Summary {
    /// Compute metrics; an average is `None` when its column is missing,
    /// unconverted, or holds no values.
    pub fn of(table: &Table) -> Self {
        Self {
            total_readings: table.len(),
            avg_voltage: mean(table, VOLTAGE),
            avg_current: mean(table, CURRENT),
            avg_power: mean(table, POWER),
        }
    }
}

/// Mean of the present values of a float column.
pub fn mean(table: &Table, column: &str) -> Option<f64> {
    let values: Vec<f64> = table.floats(column)?.into_iter().flatten().collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Least-squares line `current = slope * voltage + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    /// Number of rows the fit used.
    pub points: usize,
}

impl TrendLine {
    pub fn predict(&self, voltage: f64) -> f64 {
        self.slope * voltage + self.intercept
    }
}

/// Fit current against voltage over rows where both are present.
///
/// Needs at least two points and some spread in voltage.
pub fn trend_line(table: &Table) -> Option<TrendLine> {
    let voltage = table.floats(VOLTAGE)?;
    let current = table.floats(CURRENT)?;
    let points: Vec<(f64, f64)> = voltage
        .into_iter()
        .zip(current)
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect();
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
        .sum();
    if sxx <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    Some(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
        points: points.len(),
    })
}

/// Earliest and latest timestamp in the table.
pub fn time_range(table: &Table) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let times = table.times(TIMESTAMP)?;
    let mut present = times.into_iter().flatten();
    let first = present.next()?;
    Some(present.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
}

/// Unique entity ids in first-seen order.
pub fn entity_ids(table: &Table) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    if let Some(values) = table.values(ENTITY_ID) {
        for cell in values {
            let id = cell.to_string();
            if !cell.is_null() && !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Structural view of a table for troubleshooting.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub rows: usize,
    pub columns: Vec<Column>,
    /// Presence of the columns the dashboard relies on.
    pub key_columns: Vec<(String, bool)>,
    /// Missing values per column.
    pub null_counts: Vec<(String, usize)>,
    pub sample: Vec<Record>,
}

impl DebugInfo {
    pub fn of(table: &Table) -> Self {
        let key_columns = [TIMESTAMP, VOLTAGE, CURRENT, POWER, ENTITY_ID]
            .iter()
            .map(|name| (name.to_string(), table.has_column(name)))
            .collect();

        let null_counts = table
            .columns()
            .iter()
            .map(|c| {
                let nulls = table
                    .values(&c.name)
                    .map(|values| values.filter(|cell| cell.is_null()).count())
                    .unwrap_or(0);
                (c.name.clone(), nulls)
            })
            .collect();

        Self {
            rows: table.len(),
            columns: table.columns().to_vec(),
            key_columns,
            null_counts,
            sample: table.head(DEBUG_SAMPLE_ROWS).to_records(),
        }
    }

    /// Columns left unconverted by post-processing.
    pub fn raw_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Raw)
            .map(|c| c.name.as_str())
            .collect()
    }
}

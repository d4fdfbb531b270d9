// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Tabular post-processing.
//!
//! Turns raw records into a [`Table`] with typed columns and a derived
//! `power` column. Every column is converted independently: a column that
//! fails keeps its raw cells and the failure is reported as a
//! [`ConversionFault`] next to the table. Processing itself never fails.

use crate::error::ConversionFault;
use crate::reading::Series;
use crate::table::{
    Cell, Column, ColumnKind, Record, Table, CURRENT, ENTITY_ID, POWER, TIMESTAMP, VOLTAGE,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{error, info, warn};
use serde_json::Value;

/// Output of [`process`].
#[derive(Debug, Clone, Default)]
pub struct Processed {
    /// Processed table (possibly with unconverted columns).
    pub table: Table,
    /// Column faults encountered, in processing order.
    pub faults: Vec<ConversionFault>,
}

impl Processed {
    /// True when every present column converted cleanly.
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

type Converter = fn(&Value) -> Result<Cell, String>;

/// Convert raw records into a typed table.
pub fn process(records: &[Record]) -> Processed {
    info!("Processing sensor data");

    if records.is_empty() {
        warn!("No data to process");
        return Processed::default();
    }

    let mut table = Table::from_records(records);
    info!(
        "Created table with {} rows and {} columns",
        table.len(),
        table.columns().len()
    );

    let mut faults = Vec::new();
    coerce(&mut table, TIMESTAMP, ColumnKind::Time, to_time, &mut faults);
    coerce(&mut table, VOLTAGE, ColumnKind::Float, to_float, &mut faults);
    coerce(&mut table, CURRENT, ColumnKind::Float, to_float, &mut faults);
    derive_power(&mut table, &mut faults);
    coerce(&mut table, ENTITY_ID, ColumnKind::Text, to_text, &mut faults);

    info!("Data processing complete ({} faults)", faults.len());
    Processed { table, faults }
}

/// Render a generated series as records and process them.
pub fn process_series(series: &Series) -> Processed {
    process(&series.to_records())
}

/// Parse an RFC 3339 or naive ISO-8601 timestamp.
///
/// Offsets are dropped after converting to the offset's wall clock. A bare
/// date maps to midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn coerce(
    table: &mut Table,
    name: &str,
    kind: ColumnKind,
    convert: Converter,
    faults: &mut Vec<ConversionFault>,
) {
    if table.kind(name) == Some(kind) {
        return;
    }
    let values = match table.values(name) {
        Some(values) => values,
        None => return,
    };

    let mut cells = Vec::with_capacity(table.len());
    for (row, cell) in values.enumerate() {
        let converted = match cell {
            Cell::Null => Ok(Cell::Null),
            Cell::Raw(v) => convert(v),
            typed => convert(&typed.to_value()),
        };
        match converted {
            Ok(c) => cells.push(c),
            Err(reason) => {
                let fault = ConversionFault::Cell {
                    column: name.to_string(),
                    row,
                    reason,
                };
                error!("Error converting {}: {}", name, fault);
                faults.push(fault);
                return;
            }
        }
    }

    table.set_column(Column::new(name, kind), cells);
    info!("Converted {} to {}", name, kind);
}

fn derive_power(table: &mut Table, faults: &mut Vec<ConversionFault>) {
    if !(table.has_column(VOLTAGE) && table.has_column(CURRENT)) {
        return;
    }

    match (table.floats(VOLTAGE), table.floats(CURRENT)) {
        (Some(voltage), Some(current)) => {
            let cells = voltage
                .into_iter()
                .zip(current)
                .map(|pair| match pair {
                    (Some(v), Some(c)) => Cell::Float(v * c),
                    _ => Cell::Null,
                })
                .collect();
            table.set_column(Column::new(POWER, ColumnKind::Float), cells);
            info!("Power calculation successful");
        }
        (voltage, _) => {
            let column = if voltage.is_none() { VOLTAGE } else { CURRENT };
            let fault =
                ConversionFault::PowerUnavailable(format!("column '{}' is not numeric", column));
            error!("Error calculating power: {}", fault);
            faults.push(fault);
        }
    }
}

fn to_time(value: &Value) -> Result<Cell, String> {
    match value {
        Value::String(s) => parse_timestamp(s)
            .map(Cell::Time)
            .ok_or_else(|| format!("unrecognised timestamp '{}'", s)),
        other => Err(format!("expected a timestamp string, got {}", other)),
    }
}

fn to_float(value: &Value) -> Result<Cell, String> {
    let v = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("number {} out of range", n))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s))?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        other => return Err(format!("cannot read {} as a number", other)),
    };
    if v.is_nan() {
        Ok(Cell::Null)
    } else {
        Ok(Cell::Float(v))
    }
}

fn to_text(value: &Value) -> Result<Cell, String> {
    Ok(match value {
        Value::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{GeneratorConfig, SeriesGenerator};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let processed = process(&[]);
        assert!(processed.table.is_empty());
        assert!(processed.is_clean());
    }

    #[test]
    fn test_generated_series_power() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = start + chrono::Duration::hours(12);
        let series = SeriesGenerator::new(GeneratorConfig::new().with_seed(5))
            .generate(start, end, &["a", "b"])
            .unwrap();

        let processed = process_series(&series);
        assert!(processed.is_clean());

        let table = &processed.table;
        assert_eq!(table.len(), series.len());
        assert_eq!(table.kind(TIMESTAMP), Some(ColumnKind::Time));
        assert_eq!(table.kind(ENTITY_ID), Some(ColumnKind::Text));
        assert_eq!(table.kind(POWER), Some(ColumnKind::Float));

        let voltage = table.floats(VOLTAGE).unwrap();
        let current = table.floats(CURRENT).unwrap();
        let power = table.floats(POWER).unwrap();
        for i in 0..table.len() {
            assert_relative_eq!(power[i].unwrap(), voltage[i].unwrap() * current[i].unwrap());
            assert_relative_eq!(voltage[i].unwrap(), series.readings()[i].voltage);
        }
        let times = table.times(TIMESTAMP).unwrap();
        assert_eq!(times[0], Some(start));
    }

    #[test]
    fn test_bad_voltage_leaves_column_raw() {
        let records = vec![
            record(&[("voltage", json!(120.0)), ("current", json!(5.0))]),
            record(&[("voltage", json!("abc")), ("current", json!("4.5"))]),
        ];
        let processed = process(&records);
        let table = &processed.table;

        assert_eq!(table.kind(VOLTAGE), Some(ColumnKind::Raw));
        assert_eq!(table.kind(CURRENT), Some(ColumnKind::Float));
        assert_eq!(table.floats(CURRENT).unwrap(), vec![Some(5.0), Some(4.5)]);
        assert!(!table.has_column(POWER));

        assert_eq!(processed.faults.len(), 2);
        assert_eq!(processed.faults[0].column(), VOLTAGE);
        assert!(matches!(
            processed.faults[0],
            ConversionFault::Cell { row: 1, .. }
        ));
        assert!(matches!(
            processed.faults[1],
            ConversionFault::PowerUnavailable(_)
        ));
    }

    #[test]
    fn test_missing_columns_are_skipped() {
        let records = vec![record(&[("entity_id", json!(42)), ("voltage", json!(118.0))])];
        let processed = process(&records);

        assert!(processed.is_clean());
        assert!(!processed.table.has_column(POWER));
        assert_eq!(
            processed.table.cell(0, ENTITY_ID),
            Some(&Cell::Text("42".to_string()))
        );
    }

    #[test]
    fn test_missing_inputs_give_missing_power() {
        let records = vec![
            record(&[("voltage", json!(100.0)), ("current", Value::Null)]),
            record(&[("voltage", json!("NaN")), ("current", json!(2.0))]),
            record(&[("voltage", json!(100.0)), ("current", json!(2.0))]),
        ];
        let processed = process(&records);
        assert!(processed.is_clean());
        assert_eq!(
            processed.table.floats(POWER).unwrap(),
            vec![None, None, Some(200.0)]
        );
    }

    #[test]
    fn test_bad_timestamp_is_isolated() {
        let records = vec![record(&[
            ("timestamp", json!("yesterday")),
            ("voltage", json!(120.0)),
            ("current", json!(5.0)),
        ])];
        let processed = process(&records);

        assert_eq!(processed.table.kind(TIMESTAMP), Some(ColumnKind::Raw));
        assert_eq!(processed.faults.len(), 1);
        assert_eq!(processed.table.floats(POWER).unwrap(), vec![Some(600.0)]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let naive = parse_timestamp("2024-01-01T18:30:00").unwrap();
        assert_eq!(naive.hour(), 18);

        let fractional = parse_timestamp("2024-01-01T18:30:00.250").unwrap();
        assert_eq!(fractional.nanosecond(), 250_000_000);

        let spaced = parse_timestamp("2024-01-01 18:30:00").unwrap();
        assert_eq!(spaced, naive);

        let offset = parse_timestamp("2024-01-01T18:30:00+02:00").unwrap();
        assert_eq!(offset, naive);

        let date = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(date.hour(), 0);

        assert!(parse_timestamp("not a time").is_none());
    }
}

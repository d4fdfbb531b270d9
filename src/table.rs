// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Loosely typed table of readings.
//!
//! A [`Table`] is built from raw records and refined column by column by the
//! post-processor. Columns that fail to convert keep their raw JSON cells,
//! so consumers must check a column's [`ColumnKind`] before relying on it.

use crate::error::TableError;
use crate::reading::TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::io::Write;

/// Loosely typed input record (one reading before post-processing).
pub type Record = serde_json::Map<String, Value>;

/// A table row; one cell per column, in column order.
pub type Row = Vec<Cell>;

/// Name of the timestamp column.
pub const TIMESTAMP: &str = "timestamp";
/// Name of the entity id column.
pub const ENTITY_ID: &str = "entity_id";
/// Name of the voltage column.
pub const VOLTAGE: &str = "voltage";
/// Name of the current column.
pub const CURRENT: &str = "current";
/// Name of the derived power column.
pub const POWER: &str = "power";
/// Name of the status column.
pub const STATUS: &str = "status";

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Unconverted JSON values.
    Raw,
    Time,
    Float,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Raw => "raw",
            ColumnKind::Time => "time",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
        };
        f.write_str(label)
    }
}

/// Column descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// A single table value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value.
    Null,
    Raw(Value),
    Time(NaiveDateTime),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert back to a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Raw(v) => v.clone(),
            Cell::Time(t) => Value::String(t.format(TIMESTAMP_FORMAT).to_string()),
            Cell::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Raw(Value::String(s)) => f.write_str(s),
            Cell::Raw(v) => write!(f, "{}", v),
            Cell::Time(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Row-oriented table with a shared column layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a table without columns or rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a raw table from records.
    ///
    /// Columns are the union of record keys in first-seen order; a key
    /// missing from a record yields a null cell.
    pub fn from_records(records: &[Record]) -> Self {
        let mut columns: Vec<Column> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| &c.name == key) {
                    columns.push(Column::new(key, ColumnKind::Raw));
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| match record.get(&c.name) {
                        None | Some(Value::Null) => Cell::Null,
                        Some(v) => Cell::Raw(v.clone()),
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Storage type of a column, if present.
    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(|c| c.kind)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    /// Get a cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Iterate over the cells of one column.
    pub fn values<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Float column values; `None` unless the column exists and is converted.
    pub fn floats(&self, column: &str) -> Option<Vec<Option<f64>>> {
        if self.kind(column)? != ColumnKind::Float {
            return None;
        }
        Some(self.values(column)?.map(Cell::as_f64).collect())
    }

    /// Time column values; `None` unless the column exists and is converted.
    pub fn times(&self, column: &str) -> Option<Vec<Option<NaiveDateTime>>> {
        if self.kind(column)? != ColumnKind::Time {
            return None;
        }
        Some(self.values(column)?.map(Cell::as_time).collect())
    }

    /// Replace a column's cells and kind, or append it when absent.
    ///
    /// `cells` must hold one cell per row.
    pub(crate) fn set_column(&mut self, column: Column, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.rows.len());
        match self.column_index(&column.name) {
            Some(idx) => {
                self.columns[idx].kind = column.kind;
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            None => {
                self.columns.push(column);
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
    }

    /// Whether two tables share the same column layout.
    pub fn same_layout(&self, other: &Table) -> bool {
        self.columns == other.columns
    }

    /// Stable sort by the timestamp column.
    ///
    /// Returns `false` (leaving the order untouched) when the column is
    /// missing or unconverted. Missing timestamps sort last.
    pub fn sort_by_timestamp(&mut self) -> bool {
        let idx = match self.column_index(TIMESTAMP) {
            Some(idx) if self.columns[idx].kind == ColumnKind::Time => idx,
            _ => return false,
        };
        self.rows
            .sort_by(|a, b| match (a[idx].as_time(), b[idx].as_time()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        true
    }

    /// New table with the rows at `indices`, in the given order.
    ///
    /// Out-of-range indices are skipped.
    pub fn take<I: IntoIterator<Item = usize>>(&self, indices: I) -> Table {
        let rows = indices
            .into_iter()
            .filter_map(|i| self.rows.get(i).cloned())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        self.take(0..n.min(self.len()))
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Table {
        let start = self.len().saturating_sub(n);
        self.take(start..self.len())
    }

    /// Rows rendered back to JSON records.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(c, cell)| (c.name.clone(), cell.to_value()))
                    .collect()
            })
            .collect()
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.columns.iter().map(|c| c.name.as_str()))?;
        for row in &self.rows {
            csv.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the table as a pretty JSON array of records.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), TableError> {
        serde_json::to_writer_pretty(writer, &self.to_records())?;
        Ok(())
    }
}

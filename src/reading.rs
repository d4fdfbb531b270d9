// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Reading, baseline and series types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::table::Record;

/// Format used when readings are rendered as loosely typed records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Reading status flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
}

impl Status {
    /// Lowercase label used in records and tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Warning => "warning",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation from a simulated sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Sensor identifier.
    pub entity_id: String,
    /// Wall-clock sample instant.
    pub timestamp: NaiveDateTime,
    /// Volts.
    pub voltage: f64,
    /// Amps.
    pub current: f64,
    pub status: Status,
}

impl Reading {
    /// Render as a loosely typed record, the shape the post-processor consumes.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("entity_id".to_string(), json!(self.entity_id));
        record.insert(
            "timestamp".to_string(),
            json!(self.timestamp.format(TIMESTAMP_FORMAT).to_string()),
        );
        record.insert("voltage".to_string(), float_value(self.voltage));
        record.insert("current".to_string(), float_value(self.current));
        record.insert("status".to_string(), json!(self.status.as_str()));
        record
    }
}

fn float_value(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Per-entity generation parameters, drawn once per generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityBaseline {
    pub voltage_base: f64,
    pub current_base: f64,
}

/// Ordered readings for one or more entities, interleaved by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    readings: Vec<Reading>,
}

impl Series {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            readings: Vec::with_capacity(capacity),
        }
    }

    /// Append a reading.
    pub fn push(&mut self, reading: Reading) {
        self.readings.push(reading);
    }

    /// Get all readings.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Readings belonging to one entity, in timestamp order.
    pub fn for_entity<'a>(&'a self, entity_id: &'a str) -> impl Iterator<Item = &'a Reading> + 'a {
        self.readings.iter().filter(move |r| r.entity_id == entity_id)
    }

    /// Render every reading as a loosely typed record.
    pub fn to_records(&self) -> Vec<Record> {
        self.readings.iter().map(Reading::to_record).collect()
    }

    pub fn into_readings(self) -> Vec<Reading> {
        self.readings
    }
}

impl From<Vec<Reading>> for Series {
    fn from(readings: Vec<Reading>) -> Self {
        Self { readings }
    }
}

impl IntoIterator for Series {
    type Item = Reading;
    type IntoIter = std::vec::IntoIter<Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.into_iter()
    }
}

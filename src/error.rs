// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for Powermon
//!
//! Faults fall into three groups: generation faults raised while building a
//! synthetic series, conversion faults raised per column during
//! post-processing, and configuration faults raised when validating
//! dashboard settings. Bounds faults (empty batch, empty buffer) never
//! surface as errors; the playback operations guard against them.

use thiserror::Error;

/// Result type alias for generation operations
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Errors raised while generating a synthetic series
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// Sampling interval must be strictly positive
    #[error("Invalid sampling interval: {minutes} minutes")]
    InvalidInterval { minutes: u32 },

    /// The same entity id was requested twice
    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(String),

    /// Stepping the clock left the representable date range
    #[error("Timestamp overflow after {samples} samples")]
    TimeOverflow { samples: usize },
}

/// A single column coercion failure recorded by the post-processor.
///
/// Faults never abort processing: the affected column is left unconverted
/// and the fault is returned next to the table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionFault {
    /// A cell could not be converted to the column's target type
    #[error("Cannot convert column '{column}' at row {row}: {reason}")]
    Cell {
        column: String,
        row: usize,
        reason: String,
    },

    /// Power could not be derived from voltage and current
    #[error("Cannot derive power: {0}")]
    PowerUnavailable(String),
}

impl ConversionFault {
    /// Column the fault refers to.
    pub fn column(&self) -> &str {
        match self {
            ConversionFault::Cell { column, .. } => column,
            ConversionFault::PowerUnavailable(_) => "power",
        }
    }
}

/// Errors raised while exporting a table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while validating dashboard settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Auto-refresh interval outside the accepted range
    #[error("Refresh interval {value}s outside {min}..={max}s")]
    RefreshInterval { value: u64, min: u64, max: u64 },

    /// Simulation speed outside the accepted range
    #[error("Simulation speed {value} outside {min}..={max} points per tick")]
    SimulationSpeed { value: usize, min: usize, max: usize },

    /// Sampling interval must be strictly positive
    #[error("Sampling interval must be at least one minute")]
    ZeroSampleInterval,

    /// Fetch window ends before it starts
    #[error("Fetch window ends ({end}) before it starts ({start})")]
    InvertedWindow { start: String, end: String },

    /// Fetch window start falls outside the representable calendar
    #[error("Fetch window of {days} days ending {end} is out of range")]
    WindowOutOfRange { days: i64, end: String },

    /// Settings document could not be parsed
    #[error("Invalid settings document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_error_display() {
        let err = GenerateError::InvalidInterval { minutes: 0 };
        assert_eq!(err.to_string(), "Invalid sampling interval: 0 minutes");

        let err = GenerateError::DuplicateEntity("s1".to_string());
        assert!(err.to_string().contains("s1"));
    }

    #[test]
    fn test_conversion_fault_column() {
        let fault = ConversionFault::Cell {
            column: "voltage".to_string(),
            row: 3,
            reason: "not a number".to_string(),
        };
        assert_eq!(fault.column(), "voltage");
        assert!(fault.to_string().contains("row 3"));

        let fault = ConversionFault::PowerUnavailable("voltage missing".to_string());
        assert_eq!(fault.column(), "power");
    }

    #[test]
    fn test_config_error_from_json() {
        let err: ConfigError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

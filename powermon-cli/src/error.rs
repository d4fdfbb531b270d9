// Powermon CLI - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use powermon::{ConfigError, GenerateError, TableError};
use thiserror::Error;

/// Errors that end a CLI command.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation failed: {0}")]
    Generate(#[from] GenerateError),

    #[error("Output error: {0}")]
    Output(#[from] TableError),

    #[error("Cannot read settings file {path}: {source}")]
    SettingsFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CliError::from(ConfigError::ZeroSampleInterval);
        assert!(err.to_string().starts_with("Configuration error"));

        let err = CliError::SettingsFile {
            path: "dash.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("dash.json"));
    }
}

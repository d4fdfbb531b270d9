// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dashboard configuration.

use crate::error::ConfigError;
use crate::generator::{GeneratorConfig, DEFAULT_INTERVAL_MINUTES};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Period between simulation ticks.
pub const TICK_PERIOD: std::time::Duration = std::time::Duration::from_secs(1);

/// Accepted auto-refresh intervals in seconds.
pub const REFRESH_INTERVAL_RANGE: RangeInclusive<u64> = 5..=60;

/// Accepted simulation speeds in rows per tick.
pub const SIMULATION_SPEED_RANGE: RangeInclusive<usize> = 1..=10;

/// Days covered by the default fetch window.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Label selecting every entity.
pub const ALL_ENTITIES: &str = "All";

/// User-facing dashboard settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Re-fetch the batch periodically (batch mode only).
    pub auto_refresh: bool,
    /// Seconds between auto-refreshes.
    pub refresh_interval_secs: u64,
    /// Replay the batch through the rolling buffer.
    pub simulation: bool,
    /// Rows advanced per tick.
    pub simulation_speed: usize,
    /// Minutes between generated samples.
    pub interval_minutes: u32,
    /// Seed for reproducible batches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            auto_refresh: false,
            refresh_interval_secs: 30,
            simulation: false,
            simulation_speed: 1,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            seed: None,
        }
    }
}

impl DashboardSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a JSON document; absent fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_auto_refresh(mut self, interval_secs: u64) -> Self {
        self.auto_refresh = true;
        self.refresh_interval_secs = interval_secs;
        self
    }

    pub fn with_simulation(mut self, speed: usize) -> Self {
        self.simulation = true;
        self.simulation_speed = speed;
        self
    }

    pub fn with_interval_minutes(mut self, minutes: u32) -> Self {
        self.interval_minutes = minutes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every range constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !REFRESH_INTERVAL_RANGE.contains(&self.refresh_interval_secs) {
            return Err(ConfigError::RefreshInterval {
                value: self.refresh_interval_secs,
                min: *REFRESH_INTERVAL_RANGE.start(),
                max: *REFRESH_INTERVAL_RANGE.end(),
            });
        }
        if !SIMULATION_SPEED_RANGE.contains(&self.simulation_speed) {
            return Err(ConfigError::SimulationSpeed {
                value: self.simulation_speed,
                min: *SIMULATION_SPEED_RANGE.start(),
                max: *SIMULATION_SPEED_RANGE.end(),
            });
        }
        if self.interval_minutes == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        Ok(())
    }

    /// Generator configuration derived from these settings.
    pub fn generator_config(&self) -> GeneratorConfig {
        let config = GeneratorConfig::new().with_interval_minutes(self.interval_minutes);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

/// Which entities a fetch covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityFilter {
    #[default]
    All,
    Entity(String),
}

impl EntityFilter {
    /// Entity ids to request from the generator; empty means defaults.
    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            EntityFilter::All => Vec::new(),
            EntityFilter::Entity(id) => vec![id.clone()],
        }
    }
}

impl FromStr for EntityFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == ALL_ENTITIES {
            Ok(EntityFilter::All)
        } else {
            Ok(EntityFilter::Entity(s.to_string()))
        }
    }
}

impl fmt::Display for EntityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityFilter::All => f.write_str(ALL_ENTITIES),
            EntityFilter::Entity(id) => f.write_str(id),
        }
    }
}

/// Inclusive time range for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl FetchWindow {
    /// Window over `[start, end]`; rejects inverted ranges.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending at `now`.
    ///
    /// Fails when the start cannot be represented, and rejects a negative
    /// day count as an inverted window.
    pub fn last_days(now: NaiveDateTime, days: i64) -> Result<Self, ConfigError> {
        let start = Duration::try_days(days)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| ConfigError::WindowOutOfRange {
                days,
                end: now.to_string(),
            })?;
        Self::new(start, now)
    }

    /// The default seven-day window ending at `now`.
    pub fn default_ending(now: NaiveDateTime) -> Result<Self, ConfigError> {
        Self::last_days(now, DEFAULT_WINDOW_DAYS)
    }
}

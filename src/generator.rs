// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Synthetic series generation.
//!
//! Each call draws a fresh [`EntityBaseline`] per entity, then walks the
//! time range at a fixed interval emitting one reading per entity per
//! instant. Voltage sags by 2% during the evening peak (18:00-22:59).

use crate::error::{GenerateError, Result};
use crate::reading::{EntityBaseline, Reading, Series, Status};
use chrono::{Duration, NaiveDateTime, Timelike};
use log::{error, info};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::{Range, RangeInclusive};

/// Entities used when the caller does not name any.
pub const DEFAULT_ENTITY_IDS: [&str; 3] = ["sensor-001", "sensor-002", "sensor-003"];

/// Default sampling interval in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 15;

/// Range the per-entity voltage baseline is drawn from.
pub const VOLTAGE_BASE_RANGE: Range<f64> = 110.0..125.0;

/// Range the per-entity current baseline is drawn from.
pub const CURRENT_BASE_RANGE: Range<f64> = 4.0..8.0;

/// Half-width of the per-reading voltage jitter.
pub const VOLTAGE_JITTER: f64 = 5.0;

/// Half-width of the per-reading current jitter.
pub const CURRENT_JITTER: f64 = 1.0;

/// Probability that a reading is flagged as a warning.
pub const WARNING_PROBABILITY: f64 = 0.05;

/// Hours of day (inclusive) during which voltage is dampened.
pub const EVENING_HOURS: RangeInclusive<u32> = 18..=22;

/// Multiplier applied to voltage during evening hours.
pub const EVENING_FACTOR: f64 = 0.98;

/// Upper bound on readings reserved up front; longer series grow on demand.
pub const MAX_PREALLOCATED_READINGS: usize = 1 << 20;

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Minutes between sample instants.
    pub interval_minutes: u32,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Apply the evening voltage sag.
    pub evening_dampening: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            seed: None,
            evening_dampening: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sampling interval in minutes.
    pub fn with_interval_minutes(mut self, minutes: u32) -> Self {
        self.interval_minutes = minutes;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable the evening voltage sag.
    ///
    /// The random draw sequence is identical either way, so two generators
    /// with the same seed differ only by the sag factor.
    pub fn with_evening_dampening(mut self, enabled: bool) -> Self {
        self.evening_dampening = enabled;
        self
    }
}

/// Whether `hour` falls in the evening dampening window.
pub fn is_evening(hour: u32) -> bool {
    EVENING_HOURS.contains(&hour)
}

/// Number of sample instants in `[start, end]` at `interval_minutes`.
///
/// Zero when `start > end` or the interval is zero.
pub fn sample_count(start: NaiveDateTime, end: NaiveDateTime, interval_minutes: u32) -> usize {
    if start > end || interval_minutes == 0 {
        return 0;
    }
    let span = (end - start).num_minutes();
    usize::try_from(span / i64::from(interval_minutes))
        .unwrap_or(usize::MAX)
        .saturating_add(1)
}

/// Readings to reserve for `instants` samples of `entities` entities.
fn preallocation(instants: usize, entities: usize) -> usize {
    instants
        .checked_mul(entities)
        .map_or(MAX_PREALLOCATED_READINGS, |n| n.min(MAX_PREALLOCATED_READINGS))
}

/// Stateful series generator.
///
/// The random source lives as long as the generator: successive calls draw
/// new baselines, and two generators built from the same seed produce the
/// same sequence of series.
pub struct SeriesGenerator {
    config: GeneratorConfig,
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for SeriesGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SeriesGenerator {
    /// Create a generator from configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        let rng: Box<dyn RngCore + Send> = match config.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(StdRng::from_entropy()),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate readings for `entity_ids` over `[start, end]`.
    ///
    /// An empty entity list falls back to [`DEFAULT_ENTITY_IDS`]. A range with
    /// `start > end` yields an empty series.
    pub fn generate<S: AsRef<str>>(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        entity_ids: &[S],
    ) -> Result<Series> {
        let interval_minutes = self.config.interval_minutes;
        if interval_minutes == 0 {
            return Err(GenerateError::InvalidInterval {
                minutes: interval_minutes,
            });
        }

        let entities = resolve_entities(entity_ids)?;
        info!("Generating simulated data from {} to {}", start, end);

        let baselines: Vec<EntityBaseline> = entities
            .iter()
            .map(|_| EntityBaseline {
                voltage_base: self.rng.gen_range(VOLTAGE_BASE_RANGE),
                current_base: self.rng.gen_range(CURRENT_BASE_RANGE),
            })
            .collect();

        let instants = sample_count(start, end, interval_minutes);
        let mut series = Series::with_capacity(preallocation(instants, entities.len()));
        let step = Duration::minutes(i64::from(interval_minutes));

        let mut current_time = start;
        let mut emitted = 0usize;
        while current_time <= end {
            let dampen = self.config.evening_dampening && is_evening(current_time.hour());

            for (entity_id, baseline) in entities.iter().zip(&baselines) {
                let mut voltage =
                    baseline.voltage_base + self.rng.gen_range(-VOLTAGE_JITTER..VOLTAGE_JITTER);
                let current =
                    baseline.current_base + self.rng.gen_range(-CURRENT_JITTER..CURRENT_JITTER);
                if dampen {
                    voltage *= EVENING_FACTOR;
                }
                let status = if self.rng.gen::<f64>() < WARNING_PROBABILITY {
                    Status::Warning
                } else {
                    Status::Normal
                };

                series.push(Reading {
                    entity_id: entity_id.clone(),
                    timestamp: current_time,
                    voltage,
                    current,
                    status,
                });
            }

            emitted += 1;
            current_time = current_time
                .checked_add_signed(step)
                .ok_or(GenerateError::TimeOverflow { samples: emitted })?;
        }

        info!("Generated {} simulated data points", series.len());
        Ok(series)
    }

    /// Generate, logging any fault and degrading to an empty series.
    pub fn generate_or_empty<S: AsRef<str>>(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        entity_ids: &[S],
    ) -> Series {
        match self.generate(start, end, entity_ids) {
            Ok(series) => series,
            Err(e) => {
                error!("Error generating data: {}", e);
                Series::new()
            }
        }
    }
}

/// Generate a series with an entropy-seeded generator.
pub fn generate<S: AsRef<str>>(
    start: NaiveDateTime,
    end: NaiveDateTime,
    entity_ids: &[S],
    interval_minutes: u32,
) -> Result<Series> {
    let config = GeneratorConfig::new().with_interval_minutes(interval_minutes);
    SeriesGenerator::new(config).generate(start, end, entity_ids)
}

fn resolve_entities<S: AsRef<str>>(entity_ids: &[S]) -> Result<Vec<String>> {
    if entity_ids.is_empty() {
        return Ok(DEFAULT_ENTITY_IDS.iter().map(|s| s.to_string()).collect());
    }

    let mut seen = HashSet::with_capacity(entity_ids.len());
    let mut entities = Vec::with_capacity(entity_ids.len());
    for id in entity_ids {
        let id = id.as_ref();
        if !seen.insert(id) {
            return Err(GenerateError::DuplicateEntity(id.to_string()));
        }
        entities.push(id.to_string());
    }
    Ok(entities)
}

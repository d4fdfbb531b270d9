// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dashboard session state.
//!
//! A [`DashboardSession`] is the single owner of everything the shell keeps
//! between refreshes: the cached batch, the playback cursor, the rolling
//! buffer and the last refresh time. A fetch overwrites all of it.

use crate::buffer::RollingBuffer;
use crate::config::{DashboardSettings, EntityFilter, FetchWindow, ALL_ENTITIES};
use crate::error::{ConfigError, ConversionFault, GenerateError};
use crate::generator::SeriesGenerator;
use crate::playback::{advance, PlaybackCursor};
use crate::process::process_series;
use crate::summary::entity_ids;
use crate::table::Table;
use chrono::NaiveDateTime;
use log::{error, info};
use std::borrow::Cow;

/// Outcome of a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Readings produced by the generator.
    pub generated: usize,
    /// Rows in the stored batch.
    pub rows: usize,
    /// Generation fault, if any (the batch is then empty).
    pub error: Option<GenerateError>,
    /// Post-processing faults.
    pub faults: Vec<ConversionFault>,
}

impl FetchReport {
    pub fn has_data(&self) -> bool {
        self.rows > 0
    }
}

/// Outcome of one scheduled tick.
#[derive(Debug, Clone)]
pub enum TickReport {
    /// Nothing to do this tick.
    Idle,
    /// Auto-refresh re-fetched the batch.
    Refreshed(FetchReport),
    /// Simulation advanced the playback.
    Advanced {
        /// Rows appended to the buffer.
        appended: usize,
        cursor: PlaybackCursor,
        /// Rows held by the buffer afterwards.
        buffered: usize,
    },
}

/// Explicit per-session state for the dashboard.
#[derive(Debug)]
pub struct DashboardSession {
    settings: DashboardSettings,
    generator: SeriesGenerator,
    batch: Table,
    cursor: PlaybackCursor,
    buffer: RollingBuffer,
    last_refresh: Option<NaiveDateTime>,
    last_request: Option<(FetchWindow, EntityFilter)>,
    faults: Vec<ConversionFault>,
}

impl DashboardSession {
    /// Create a session with no batch loaded.
    pub fn new(settings: DashboardSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let generator = SeriesGenerator::new(settings.generator_config());
        Ok(Self {
            settings,
            generator,
            batch: Table::empty(),
            cursor: PlaybackCursor::default(),
            buffer: RollingBuffer::new(),
            last_refresh: None,
            last_request: None,
            faults: Vec::new(),
        })
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Replace the settings.
    ///
    /// The generator is rebuilt when the sampling interval or seed changes;
    /// the batch, cursor and buffer are kept.
    pub fn update_settings(&mut self, settings: DashboardSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        if settings.interval_minutes != self.settings.interval_minutes
            || settings.seed != self.settings.seed
        {
            self.generator = SeriesGenerator::new(settings.generator_config());
        }
        self.settings = settings;
        Ok(())
    }

    /// Generate, process and store a fresh batch.
    ///
    /// Resets the cursor, clears the rolling buffer and stamps the refresh
    /// time whatever the outcome.
    pub fn fetch(
        &mut self,
        window: FetchWindow,
        filter: EntityFilter,
        now: NaiveDateTime,
    ) -> FetchReport {
        info!("Fetching {} from {} to {}", filter, window.start, window.end);
        let mut report = FetchReport::default();

        let entity_ids = filter.entity_ids();
        match self
            .generator
            .generate(window.start, window.end, entity_ids.as_slice())
        {
            Ok(series) => {
                report.generated = series.len();
                let processed = process_series(&series);
                let mut table = processed.table;
                table.sort_by_timestamp();
                report.rows = table.len();
                report.faults = processed.faults;
                self.batch = table;
            }
            Err(e) => {
                error!("Error during data generation: {}", e);
                report.error = Some(e);
                self.batch = Table::empty();
            }
        }

        self.faults = report.faults.clone();
        self.cursor.reset();
        self.buffer.clear();
        self.last_refresh = Some(now);
        self.last_request = Some((window, filter));
        info!("Stored batch with {} rows", report.rows);
        report
    }

    /// Repeat the last fetch; `None` before the first fetch.
    pub fn refetch(&mut self, now: NaiveDateTime) -> Option<FetchReport> {
        let (window, filter) = self.last_request.clone()?;
        Some(self.fetch(window, filter, now))
    }

    /// Whether batch-mode auto-refresh should re-fetch at `now`.
    pub fn refresh_due(&self, now: NaiveDateTime) -> bool {
        if !self.settings.auto_refresh || self.settings.simulation {
            return false;
        }
        match self.last_refresh {
            Some(last) => {
                (now - last).num_milliseconds()
                    > (self.settings.refresh_interval_secs * 1000) as i64
            }
            None => true,
        }
    }

    /// Run one scheduled cycle: a simulation step, an auto-refresh, or nothing.
    pub fn tick(&mut self, now: NaiveDateTime) -> TickReport {
        if self.settings.simulation {
            if self.batch.is_empty() {
                return TickReport::Idle;
            }
            let (slice, cursor) =
                advance(self.cursor, &self.batch, self.settings.simulation_speed);
            if slice.is_empty() {
                return TickReport::Idle;
            }
            self.cursor = cursor;
            self.buffer.append(&slice);
            self.last_refresh = Some(now);
            info!(
                "Real-time simulation active. Buffer size: {}",
                self.buffer.len()
            );
            return TickReport::Advanced {
                appended: slice.len(),
                cursor,
                buffered: self.buffer.len(),
            };
        }

        if self.refresh_due(now) {
            info!("Auto-refreshing data");
            if let Some(report) = self.refetch(now) {
                return TickReport::Refreshed(report);
            }
        }
        TickReport::Idle
    }

    /// Rows the shell should display.
    ///
    /// During simulation this is the rolling buffer once it holds rows;
    /// otherwise the cached batch.
    pub fn view(&self) -> Cow<'_, Table> {
        if self.settings.simulation && !self.buffer.is_empty() {
            Cow::Owned(self.buffer.to_table())
        } else {
            Cow::Borrowed(&self.batch)
        }
    }

    /// Filter choices: "All" followed by the batch's entity ids.
    pub fn entity_options(&self) -> Vec<String> {
        let mut options = vec![ALL_ENTITIES.to_string()];
        options.extend(entity_ids(&self.batch));
        options
    }

    pub fn batch(&self) -> &Table {
        &self.batch
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    pub fn last_refresh(&self) -> Option<NaiveDateTime> {
        self.last_refresh
    }

    /// Faults from the most recent fetch's post-processing.
    pub fn faults(&self) -> &[ConversionFault] {
        &self.faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn hour_window() -> FetchWindow {
        FetchWindow::new(now() - Duration::hours(1), now()).unwrap()
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = DashboardSession::new(DashboardSettings::default()).unwrap();
        assert!(session.batch().is_empty());
        assert!(session.view().is_empty());
        assert!(session.last_refresh().is_none());
        assert_eq!(session.entity_options(), vec!["All".to_string()]);
    }

    #[test]
    fn test_new_session_rejects_bad_settings() {
        let result = DashboardSession::new(DashboardSettings::new().with_simulation(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_all_entities() {
        let mut session =
            DashboardSession::new(DashboardSettings::new().with_seed(1)).unwrap();
        let report = session.fetch(hour_window(), EntityFilter::All, now());

        assert!(report.error.is_none());
        assert_eq!(report.generated, 15);
        assert_eq!(report.rows, 15);
        assert!(report.faults.is_empty());
        assert_eq!(session.last_refresh(), Some(now()));
        assert_eq!(session.entity_options().len(), 4);
    }

    #[test]
    fn test_fetch_resets_playback() {
        let settings = DashboardSettings::new().with_seed(2).with_simulation(4);
        let mut session = DashboardSession::new(settings).unwrap();
        session.fetch(hour_window(), EntityFilter::All, now());
        session.tick(now());
        assert_eq!(session.cursor().position(), 4);
        assert_eq!(session.buffer().len(), 4);

        session.fetch(
            hour_window(),
            EntityFilter::Entity("sensor-009".to_string()),
            now(),
        );
        assert_eq!(session.cursor().position(), 0);
        assert!(session.buffer().is_empty());
        assert_eq!(
            session.entity_options(),
            vec!["All".to_string(), "sensor-009".to_string()]
        );
    }

    #[test]
    fn test_fetch_inverted_window_gives_empty_batch() {
        let mut session = DashboardSession::new(DashboardSettings::default()).unwrap();
        let window = FetchWindow {
            start: now(),
            end: now() - Duration::hours(1),
        };
        let report = session.fetch(window, EntityFilter::All, now());
        assert!(report.error.is_none());
        assert!(!report.has_data());
        assert!(session.view().is_empty());
    }

    #[test]
    fn test_simulation_view_switches_to_buffer() {
        let settings = DashboardSettings::new().with_seed(3).with_simulation(2);
        let mut session = DashboardSession::new(settings).unwrap();
        session.fetch(hour_window(), EntityFilter::All, now());
        assert_eq!(session.view().len(), 15);

        let later = now() + Duration::seconds(1);
        match session.tick(later) {
            TickReport::Advanced {
                appended, buffered, ..
            } => {
                assert_eq!(appended, 2);
                assert_eq!(buffered, 2);
            }
            other => panic!("unexpected tick report: {:?}", other),
        }
        assert_eq!(session.view().len(), 2);
        assert_eq!(session.last_refresh(), Some(later));
    }

    #[test]
    fn test_simulation_without_batch_is_idle() {
        let settings = DashboardSettings::new().with_simulation(1);
        let mut session = DashboardSession::new(settings).unwrap();
        assert!(matches!(session.tick(now()), TickReport::Idle));
    }

    #[test]
    fn test_auto_refresh_due() {
        let settings = DashboardSettings::new().with_seed(4).with_auto_refresh(5);
        let mut session = DashboardSession::new(settings).unwrap();
        session.fetch(hour_window(), EntityFilter::All, now());

        assert!(!session.refresh_due(now() + Duration::seconds(5)));
        assert!(session.refresh_due(now() + Duration::seconds(6)));

        let later = now() + Duration::seconds(6);
        assert!(matches!(session.tick(later), TickReport::Refreshed(_)));
        assert_eq!(session.last_refresh(), Some(later));
        assert!(matches!(
            session.tick(later + Duration::seconds(1)),
            TickReport::Idle
        ));
    }

    #[test]
    fn test_auto_refresh_disabled_in_simulation() {
        let settings = DashboardSettings::new()
            .with_auto_refresh(5)
            .with_simulation(1);
        let session = DashboardSession::new(settings).unwrap();
        assert!(!session.refresh_due(now()));
    }

    #[test]
    fn test_update_settings() {
        let mut session = DashboardSession::new(DashboardSettings::default()).unwrap();
        session.fetch(hour_window(), EntityFilter::All, now());

        let settings = DashboardSettings::new().with_simulation(3);
        session.update_settings(settings).unwrap();
        assert!(session.settings().simulation);
        assert_eq!(session.batch().len(), 15);

        let bad = DashboardSettings::new().with_auto_refresh(1);
        assert!(session.update_settings(bad).is_err());
        assert!(session.settings().simulation);
    }
}

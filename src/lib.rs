//! # Powermon - Synthetic power monitoring core
//!
//! Generates synthetic voltage/current readings for a set of sensors,
//! normalizes them into a typed table, and replays a cached batch through a
//! fixed-size rolling buffer to imitate a live feed.
//!
//! ## Key Features
//!
//! - **Synthetic generation**: Per-entity baselines, jitter, evening dampening
//! - **Tolerant post-processing**: Per-column coercion that never aborts
//! - **Simulated playback**: Circular cursor over the batch, newest 100 rows kept
//! - **Explicit session state**: No globals; one [`DashboardSession`] per viewer
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use powermon::{DashboardSession, DashboardSettings, EntityFilter, FetchWindow, TickReport};
//!
//! let now = NaiveDate::from_ymd_opt(2024, 1, 1)
//!     .unwrap()
//!     .and_hms_opt(12, 0, 0)
//!     .unwrap();
//! let settings = DashboardSettings::new().with_seed(7).with_simulation(5);
//! let mut session = DashboardSession::new(settings).unwrap();
//!
//! // One day of 15-minute samples for the three default sensors
//! let window = FetchWindow::last_days(now, 1).unwrap();
//! let report = session.fetch(window, EntityFilter::All, now);
//! assert_eq!(report.rows, 97 * 3);
//!
//! // Replay five rows into the rolling buffer
//! let tick = session.tick(now);
//! assert!(matches!(tick, TickReport::Advanced { appended: 5, .. }));
//! assert_eq!(session.view().len(), 5);
//! ```
//!
//! ## Modules
//!
//! - [`generator`]: Synthetic reading generation
//! - [`process`]: Record-to-table coercion and derived power
//! - [`playback`]: Cursor-driven slicing of a batch
//! - [`buffer`]: Rolling buffer of recent rows
//! - [`summary`]: Metrics, trend line and diagnostics
//! - [`session`]: Per-viewer dashboard state

// Modules
pub mod buffer;
pub mod config;
pub mod error;
pub mod generator;
pub mod playback;
pub mod process;
pub mod reading;
pub mod session;
pub mod summary;
pub mod table;

// Re-exports for convenient access
pub use buffer::{RollingBuffer, MAX_BUFFER_SIZE};
pub use config::{DashboardSettings, EntityFilter, FetchWindow};
pub use error::{ConfigError, ConversionFault, GenerateError, Result, TableError};
pub use generator::{GeneratorConfig, SeriesGenerator, DEFAULT_ENTITY_IDS};
pub use playback::{advance, PlaybackCursor};
pub use process::{process, process_series, Processed};
pub use reading::{Reading, Series, Status};
pub use session::{DashboardSession, FetchReport, TickReport};
pub use summary::{DebugInfo, Summary, TrendLine};
pub use table::{Cell, Column, ColumnKind, Record, Table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

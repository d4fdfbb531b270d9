// Powermon CLI - Terminal dashboard for synthetic power monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Powermon CLI
//!
//! Generates synthetic sensor batches and plays them back as a live feed.
//!
//! ## Usage
//!
//! ```bash
//! # Dump one day of readings as CSV
//! powermon generate --days 1 --format csv
//!
//! # Simulated real-time playback, 5 points per second, 30 ticks
//! powermon run --simulate --speed 5 --ticks 30
//!
//! # Auto-refresh a single sensor every 10 seconds
//! powermon run --entity sensor-002 --auto-refresh --refresh-interval 10
//! ```

mod error;
mod render;
mod scheduler;

use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use error::CliError;
use powermon::config::{DEFAULT_WINDOW_DAYS, TICK_PERIOD};
use powermon::process::parse_timestamp;
use powermon::summary::DebugInfo;
use powermon::{
    DashboardSession, DashboardSettings, EntityFilter, FetchReport, FetchWindow, TickReport,
};
use scheduler::Ticker;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Powermon terminal dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a processed batch and print it
    Generate(GenerateArgs),
    /// Run the dashboard loop
    Run(RunArgs),
    /// Print diagnostics for a fresh batch
    Inspect(InspectArgs),
}

/// Options shared by every command that fetches a batch.
#[derive(Args, Debug, Clone)]
struct FetchArgs {
    /// Window start (defaults to `--days` before the end)
    #[arg(long, value_parser = parse_time)]
    start: Option<NaiveDateTime>,

    /// Window end (defaults to now)
    #[arg(long, value_parser = parse_time)]
    end: Option<NaiveDateTime>,

    /// Days covered when no start is given
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    days: i64,

    /// Entity id, or "All" for the default sensors
    #[arg(short, long, default_value = "All")]
    entity: EntityFilter,

    /// Minutes between samples
    #[arg(short, long)]
    interval: Option<u32>,

    /// Seed for reproducible batches
    #[arg(long)]
    seed: Option<u64>,
}

impl FetchArgs {
    fn window(&self, now: NaiveDateTime) -> Result<FetchWindow, CliError> {
        let end = self.end.unwrap_or(now);
        let window = match self.start {
            Some(start) => FetchWindow::new(start, end)?,
            None => FetchWindow::last_days(end, self.days)?,
        };
        Ok(window)
    }

    fn apply(&self, mut settings: DashboardSettings) -> DashboardSettings {
        if let Some(minutes) = self.interval {
            settings.interval_minutes = minutes;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    fetch: FetchArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    fetch: FetchArgs,

    /// JSON settings file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Re-fetch the batch periodically
    #[arg(long)]
    auto_refresh: bool,

    /// Seconds between auto-refreshes (5-60)
    #[arg(long)]
    refresh_interval: Option<u64>,

    /// Replay the batch as a live feed
    #[arg(long)]
    simulate: bool,

    /// Points added per tick during simulation (1-10)
    #[arg(long)]
    speed: Option<usize>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,
}

impl RunArgs {
    fn settings(&self) -> Result<DashboardSettings, CliError> {
        let mut settings = match &self.config {
            Some(path) => {
                let json =
                    std::fs::read_to_string(path).map_err(|source| CliError::SettingsFile {
                        path: path.display().to_string(),
                        source,
                    })?;
                DashboardSettings::from_json_str(&json)?
            }
            None => DashboardSettings::default(),
        };

        if self.auto_refresh {
            settings.auto_refresh = true;
        }
        if let Some(secs) = self.refresh_interval {
            settings.refresh_interval_secs = secs;
        }
        if self.simulate {
            settings.simulation = true;
        }
        if let Some(speed) = self.speed {
            settings.simulation_speed = speed;
        }

        let settings = self.fetch.apply(settings);
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[command(flatten)]
    fetch: FetchArgs,

    /// Print diagnostics as JSON
    #[arg(long)]
    json: bool,
}

fn parse_time(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).ok_or_else(|| format!("unrecognised timestamp '{}'", s))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match cli.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Powermon v{}", powermon::VERSION);

    let result = match cli.command {
        Command::Generate(args) => generate(args),
        Command::Run(args) => run(args).await,
        Command::Inspect(args) => inspect(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Fetch a batch over `window`, turning a generation fault into an error.
fn fetch_batch(
    fetch: &FetchArgs,
    window: FetchWindow,
    now: NaiveDateTime,
) -> Result<DashboardSession, CliError> {
    let settings = fetch.apply(DashboardSettings::default());
    let mut session = DashboardSession::new(settings)?;
    let report = session.fetch(window, fetch.entity.clone(), now);
    log_report(&report);
    match report.error {
        Some(e) => Err(e.into()),
        None => Ok(session),
    }
}

fn log_report(report: &FetchReport) {
    if let Some(e) = &report.error {
        warn!("Fetch produced no data: {}", e);
        return;
    }
    info!(
        "Successfully generated {} data points for the selected range",
        report.generated
    );
    for fault in &report.faults {
        warn!("{}", fault);
    }
}

fn generate(args: GenerateArgs) -> Result<(), CliError> {
    let now = now();
    let session = fetch_batch(&args.fetch, args.fetch.window(now)?, now)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Csv => session.batch().write_csv(&mut out)?,
        Format::Json => {
            session.batch().write_json(&mut out)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn inspect(args: InspectArgs) -> Result<(), CliError> {
    let now = now();
    let window = args.fetch.window(now)?;
    let session = fetch_batch(&args.fetch, window, now)?;
    let info = DebugInfo::of(session.batch());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!(
            "{}",
            render::debug_report(&info, Some((window.start, window.end)))
        );
    }
    Ok(())
}

async fn run(args: RunArgs) -> Result<(), CliError> {
    let settings = args.settings()?;
    let mut session = DashboardSession::new(settings)?;

    let started = now();
    let window = args.fetch.window(started)?;
    let report = session.fetch(window, args.fetch.entity.clone(), started);
    log_report(&report);
    print!("{}", render::frame(&session));

    if args.ticks == Some(0) {
        return Ok(());
    }

    let mut ticker = Ticker::new(TICK_PERIOD);
    let handle = ticker.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping dashboard");
            handle.stop();
        }
    });

    let mut cycles = 0u64;
    while ticker.tick().await {
        match session.tick(now()) {
            TickReport::Idle => {}
            TickReport::Refreshed(report) => {
                log_report(&report);
                print!("{}", render::frame(&session));
            }
            TickReport::Advanced {
                appended, buffered, ..
            } => {
                info!("Added {} points, buffer holds {}", appended, buffered);
                print!("{}", render::frame(&session));
            }
        }

        cycles += 1;
        if args.ticks.map_or(false, |limit| cycles >= limit) {
            break;
        }
    }

    info!("Dashboard stopped after {} ticks", cycles);
    Ok(())
}

//! timelimitd - The timelimit background service
//!
//! This is the main entry point for the timelimitd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Usage tracker
//! - Shutdown and daylight collaborators (Linux)
//! - Signal handling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use timelimit_config::{Policy, load_config, load_config_or_default};
use timelimit_core::{
    AuditObserver, ObserverSet, StopReason, TracingObserver, UsageReport, UsageTracker,
};
use timelimit_host_api::{DaylightOracle, OnceShutdown, ShutdownTrigger};
use timelimit_host_linux::{DryRunShutdown, SolarDaylight, shutdown_from_policy};
use timelimit_store::{AuditEvent, AuditEventType, CounterStore, SqliteStore};
use timelimit_util::{
    DATABASE_FILENAME, LOG_FILENAME, default_config_path, format_datetime_full, format_duration,
};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// timelimitd - Shuts the machine down when its usage budget is spent
#[derive(Parser, Debug)]
#[command(name = "timelimitd")]
#[command(about = "Shuts the machine down when its usage budget is spent", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file path (default: ~/.config/timelimit/config.toml, built-in defaults if absent)
    #[arg(short, long, env = "TIMELIMIT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override (or set TIMELIMIT_DATA_DIR env var)
    #[arg(short, long, env = "TIMELIMIT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log directory override
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    log_stderr: bool,

    /// Compressed time for trying things out: budgets in seconds, no real shutdown
    #[arg(long, global = true)]
    debug: bool,

    /// Log the shutdown instead of running the shutdown command
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Track usage until a limit, the night cutoff, or a signal (default)
    Run,

    /// Print the counters and the remaining budgets
    Status {
        /// Number of recent audit events to show
        #[arg(long, default_value_t = 10)]
        events: usize,
    },
}

impl Args {
    /// Load the policy and apply command line overrides
    fn policy(&self) -> Result<Policy> {
        let mut policy = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => {
                let path = default_config_path();
                load_config_or_default(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            }
        };

        if let Some(data_dir) = &self.data_dir {
            policy.daemon.data_dir = data_dir.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            policy.daemon.log_dir = log_dir.clone();
        }
        if self.dry_run {
            policy.shutdown.dry_run = true;
        }
        if self.debug {
            policy = policy.debug_profile();
        }

        Ok(policy)
    }

    fn logs_to_stderr(&self) -> bool {
        self.debug || self.log_stderr || matches!(self.command, Some(Command::Status { .. }))
    }
}

/// Install the global subscriber. The returned guard flushes the log file on drop.
fn init_logging(args: &Args, log_dir: &Path) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.logs_to_stderr() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
        return Ok(None);
    }

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILENAME));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .init();

    Ok(Some(guard))
}

fn open_store(policy: &Policy) -> Result<Arc<SqliteStore>> {
    let db_path = policy.daemon.data_dir.join(DATABASE_FILENAME);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!(db_path = %db_path.display(), "Store initialized");
    Ok(Arc::new(store))
}

/// Build the tracker with the real collaborators
fn build_tracker(policy: &Policy, store: Arc<SqliteStore>) -> UsageTracker {
    let shutdown: Arc<dyn ShutdownTrigger> =
        Arc::new(OnceShutdown::new(shutdown_from_policy(&policy.shutdown)));

    let daylight = policy.night_cutoff.map(|location| {
        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            "Night cutoff enabled"
        );
        Arc::new(SolarDaylight::new(location)) as Arc<dyn DaylightOracle>
    });

    let observer = ObserverSet::new()
        .with(Arc::new(TracingObserver))
        .with(Arc::new(AuditObserver::new(store.clone())));

    UsageTracker::new(
        policy.limits.clone(),
        store,
        shutdown,
        daylight,
        Arc::new(observer),
    )
}

/// Cancel `cancel` on SIGTERM or SIGINT
fn spawn_signal_listener(cancel: CancellationToken) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, stopping"),
            _ = sigint.recv() => info!("Received SIGINT, stopping"),
            _ = cancel.cancelled() => return,
        }
        cancel.cancel();
    });

    Ok(())
}

fn audit(store: &dyn CounterStore, event: AuditEventType) {
    if let Err(e) = store.append_audit(AuditEvent::new(event)) {
        warn!(error = %e, "Failed to record audit event");
    }
}

async fn run(policy: Policy) -> Result<()> {
    let store = open_store(&policy)?;
    if !store.is_healthy() {
        anyhow::bail!("Store is not usable");
    }
    audit(store.as_ref(), AuditEventType::DaemonStarted);

    let mut tracker = build_tracker(&policy, store.clone());

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone())?;

    info!("Service running");
    let result = tracker.run(cancel.clone()).await;
    cancel.cancel();

    match &result {
        Ok(reason) => {
            info!(%reason, "Service stopped");
            audit(
                store.as_ref(),
                AuditEventType::DaemonStopped {
                    reason: reason.to_string(),
                },
            );
            if matches!(reason, StopReason::LimitReached(_)) {
                info!("Shutdown has been requested, exiting");
            }
        }
        Err(e) => {
            error!(error = %e, "Usage tracking failed");
            audit(
                store.as_ref(),
                AuditEventType::DaemonStopped {
                    reason: format!("error: {e}"),
                },
            );
        }
    }

    result.context("Usage tracking failed")?;
    Ok(())
}

fn status(policy: &Policy, events: usize) -> Result<()> {
    let store = open_store(policy)?;
    let recent = store.recent_audits(events)?;
    let tracker = UsageTracker::new(
        policy.limits.clone(),
        store,
        Arc::new(DryRunShutdown),
        None,
        Arc::new(TracingObserver),
    );
    let report = tracker.report(timelimit_util::now())?;

    print_report(&report);

    if !recent.is_empty() {
        println!();
        println!("Recent events:");
        for event in recent.iter().rev() {
            println!(
                "  {}  {:?}",
                format_datetime_full(&event.timestamp),
                event.event
            );
        }
    }

    Ok(())
}

fn print_report(report: &UsageReport) {
    println!(
        "Cycle:    started {}, ends {}",
        format_datetime_full(&report.cycle_start),
        format_datetime_full(&report.cycle_ends_at)
    );
    println!(
        "          {} used, {} left",
        format_duration(report.cycle_used),
        format_duration(report.cycle_remaining)
    );
    println!(
        "Session:  {} used, {} left",
        format_duration(report.session_used),
        format_duration(report.session_remaining)
    );
    println!(
        "Last tick: {}",
        format_datetime_full(&report.last_time_on)
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let policy = args.policy()?;

    let _log_guard = init_logging(&args, &policy.daemon.log_dir)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        debug = args.debug,
        dry_run = policy.shutdown.dry_run,
        mock_time = timelimit_util::is_mock_time_active(),
        "timelimitd starting"
    );

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(policy).await,
        Command::Status { events } => status(&policy, events),
    }
}

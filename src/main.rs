//! sqlpulse - Periodic database poller
//!
//! CLI entry point: loads the server configuration, wires the executor and
//! scheduler, and drives polling cycles on a fixed interval.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sqlpulse::config::MonitorConfig;
use sqlpulse::conn::credentials::Base64Decryptor;
use sqlpulse::cycle::scheduler::{CycleReport, CycleScheduler};
use sqlpulse::dispatch::{ChannelExecutor, HeartbeatRunner};
use sqlpulse::log::jsonl::{CycleRecord, JsonlLogger, SkippedEntry};
use sqlpulse::metrics::StdoutMetricWriter;

/// Periodic database poller
///
/// Polls every configured server on a fixed interval and publishes the
/// results as time-series metrics.
#[derive(Parser, Debug)]
#[command(name = "sqlpulse", version, about)]
struct Cli {
    /// Path to the servers.toml configuration file
    #[arg(long, default_value = "servers.toml")]
    config: PathBuf,

    /// Directory for log files (.sqlpulse by default)
    #[arg(long, default_value = ".sqlpulse")]
    log_dir: PathBuf,
}

/// Build a `CycleRecord` from a `CycleReport` for JSONL logging.
fn build_record(cycle: u64, report: &CycleReport, target_count: usize) -> CycleRecord {
    CycleRecord {
        cycle,
        timestamp: chrono::Utc::now(),
        window_start_ms: report.window.map(|w| w.previous_ms),
        window_end_ms: report.window.map(|w| w.current_ms),
        dispatched: report.dispatched.clone(),
        skipped: report
            .skipped
            .iter()
            .map(|s| SkippedEntry {
                server: s.server.clone(),
                reason: s.reason.clone(),
            })
            .collect(),
        target_count,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = MonitorConfig::from_path(&cli.config)
        .with_context(|| format!("Failed to load config from '{}'", cli.config.display()))?;

    info!(
        servers = config.servers.len(),
        interval_secs = config.global.poll_interval_secs,
        "configuration loaded"
    );

    // Initialize
    let logger = JsonlLogger::new(&cli.log_dir).context("Failed to initialize JSONL logger")?;
    let executor = Arc::new(ChannelExecutor::spawn(
        config.global.workers,
        Arc::new(HeartbeatRunner),
    ));
    let mut scheduler = CycleScheduler::new(
        config.servers,
        config.global.metric_prefix,
        Arc::new(StdoutMetricWriter),
        Arc::new(Base64Decryptor),
        executor,
    );

    // Drive cycles at a fixed interval. Nothing inside the loop is allowed
    // to end it: per-target errors are already captured in the report, and
    // anything else (e.g. a failed log write) is logged and skipped.
    let mut interval = tokio::time::interval(Duration::from_secs(config.global.poll_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut cycle: u64 = 0;

    loop {
        interval.tick().await;
        cycle += 1;

        let report = scheduler.tick();
        let record = build_record(cycle, &report, scheduler.task_count());

        if let Err(err) = logger.append(&record) {
            error!("Failed to write to JSONL log: {err:#}");
        }
    }
}

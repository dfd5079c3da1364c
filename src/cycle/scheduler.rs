//! Per-cycle orchestration
//!
//! On each tick the scheduler advances the time window, builds one task per
//! configured server and submits them for concurrent execution. Every
//! target-scoped failure is captured at that target's boundary: a server
//! with a broken declaration is skipped and reported, and the rest of the
//! cycle proceeds untouched.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ServerSpec;
use crate::conn::credentials::Decryptor;
use crate::cycle::task::{create_task, TaskParams};
use crate::cycle::window::{TimeWindow, WindowTracker};
use crate::dispatch::TaskSink;
use crate::metrics::MetricWriter;

/// One server skipped during a cycle, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTarget {
    /// Display name of the server (or `<unnamed>`)
    pub server: String,
    /// Human-readable reason
    pub reason: String,
}

/// What one tick did: the window it ran against (absent on the baseline
/// tick), which servers were dispatched and which were skipped.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// The query window, or `None` for the baseline tick
    pub window: Option<TimeWindow>,
    /// Servers whose tasks were submitted, in configuration order
    pub dispatched: Vec<String>,
    /// Servers skipped this cycle, with reasons
    pub skipped: Vec<SkippedTarget>,
}

/// Drives one polling cycle across all configured servers.
///
/// The window timestamps are owned here and mutated only at the start of a
/// tick; everything else sees them as read-only snapshots inside tasks. The
/// scheduler itself is single-threaded: concurrency starts at the sink.
pub struct CycleScheduler {
    servers: Vec<ServerSpec>,
    metric_prefix: String,
    writer: Arc<dyn MetricWriter>,
    decryptor: Arc<dyn Decryptor>,
    sink: Arc<dyn TaskSink>,
    window: WindowTracker,
}

impl CycleScheduler {
    /// Create a scheduler over the given servers and capability handles.
    #[must_use]
    pub fn new(
        servers: Vec<ServerSpec>,
        metric_prefix: String,
        writer: Arc<dyn MetricWriter>,
        decryptor: Arc<dyn Decryptor>,
        sink: Arc<dyn TaskSink>,
    ) -> Self {
        Self {
            servers,
            metric_prefix,
            writer,
            decryptor,
            sink,
            window: WindowTracker::new(),
        }
    }

    /// Number of configured servers, evaluated fresh on every call.
    ///
    /// Reported for capacity/health purposes; independent of how many tasks
    /// actually succeed in a cycle.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.servers.len()
    }

    /// Replace the configured server list between ticks.
    ///
    /// The window state is unaffected: reconfiguration never resets the
    /// polling baseline.
    pub fn reconfigure(&mut self, servers: Vec<ServerSpec>) {
        self.servers = servers;
    }

    /// Run one cycle at the current wall-clock time.
    pub fn tick(&mut self) -> CycleReport {
        self.tick_at(Utc::now().timestamp_millis())
    }

    /// Run one cycle as of `now_ms`.
    ///
    /// The first tick ever establishes the baseline timestamp and dispatches
    /// nothing. Later ticks attempt every server independently; no error
    /// from one server's pipeline can escape into another's.
    pub fn tick_at(&mut self, now_ms: i64) -> CycleReport {
        let Some(window) = self.window.advance(now_ms) else {
            info!(baseline_ms = now_ms, "first cycle: baseline established, no dispatch");
            return CycleReport::default();
        };

        let mut report = CycleReport {
            window: Some(window),
            ..CycleReport::default()
        };

        for server in &self.servers {
            let result = create_task(TaskParams {
                server,
                window,
                metric_prefix: &self.metric_prefix,
                writer: &self.writer,
                decryptor: self.decryptor.as_ref(),
            })
            .map_err(|err| err.to_string())
            .and_then(|task| {
                self.sink
                    .submit(&server.display_name, task)
                    .map_err(|err| format!("{err:#}"))
            });

            match result {
                Ok(()) => {
                    debug!(server = %server.display_name, "poll task dispatched");
                    report.dispatched.push(server.display_name.clone());
                }
                Err(reason) => {
                    warn!(server = %server.label(), reason = %reason, "server skipped this cycle");
                    report.skipped.push(SkippedTarget {
                        server: server.label().to_string(),
                        reason,
                    });
                }
            }
        }

        info!(
            dispatched = report.dispatched.len(),
            skipped = report.skipped.len(),
            window_start_ms = window.previous_ms,
            window_end_ms = window.current_ms,
            "cycle complete"
        );

        report
    }
}

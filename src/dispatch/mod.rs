//! Concurrent task dispatch
//!
//! The scheduler hands finished tasks to a [`TaskSink`] and moves on; it
//! never waits for execution. The shipped sink is a channel executor: an
//! unbounded queue drained by a pool of workers, each running tasks through
//! a [`TaskRunner`]. One task's failure is logged by its worker and touches
//! nothing else.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

use crate::cycle::task::PollTask;

/// Fire-and-forget dispatch seam between the scheduler and the executor.
pub trait TaskSink: Send + Sync {
    /// Submit one task for asynchronous execution, keyed by server name.
    ///
    /// Returns an error only when the executor can no longer accept work
    /// (shut down); the caller treats that as one more skipped target.
    fn submit(&self, name: &str, task: PollTask) -> Result<()>;
}

/// Executes one poll task.
///
/// The query-and-publish stage is an external collaborator; this trait is
/// its seam. Implementations must be safe to call concurrently.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Run the task to completion.
    async fn run(&self, task: PollTask) -> Result<()>;
}

/// Channel-backed executor: tasks queue on an unbounded channel and a fixed
/// pool of workers drains it concurrently.
pub struct ChannelExecutor {
    tx: mpsc::UnboundedSender<(String, PollTask)>,
}

impl ChannelExecutor {
    /// Spawn `workers` consumer tasks draining the queue through `runner`.
    ///
    /// Must be called from within a tokio runtime. At least one worker is
    /// always spawned.
    #[must_use]
    pub fn spawn(workers: usize, runner: Arc<dyn TaskRunner>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<(String, PollTask)>();
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let runner = Arc::clone(&runner);
            tokio::spawn(async move {
                loop {
                    // Lock only to dequeue; execution happens outside it so
                    // the pool actually runs tasks concurrently.
                    let received = { rx.lock().await.recv().await };
                    let Some((name, task)) = received else {
                        break;
                    };

                    debug!(worker = worker_id, server = %name, "running poll task");
                    if let Err(err) = runner.run(task).await {
                        error!(server = %name, "poll task failed: {err:#}");
                    }
                }
            });
        }

        Self { tx }
    }
}

impl TaskSink for ChannelExecutor {
    fn submit(&self, name: &str, task: PollTask) -> Result<()> {
        self.tx
            .send((name.to_string(), task))
            .map_err(|_| anyhow!("executor is shut down"))
    }
}

/// Runner that reports only the per-server availability metric.
///
/// Emits `<prefix>|<display name>|HeartBeat = 1` through the task's writer.
/// Deployments wire their query-executing runner in its place.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeartbeatRunner;

#[async_trait]
impl TaskRunner for HeartbeatRunner {
    async fn run(&self, task: PollTask) -> Result<()> {
        let name = format!(
            "{}|{}|HeartBeat",
            task.metric_prefix, task.server.display_name
        );
        task.writer.write_metric(&name, 1.0);
        Ok(())
    }
}

//! Poll task assembly
//!
//! A poll task is the immutable unit of work handed to the executor: one
//! server, its resolved connection descriptor, the window snapshot for this
//! cycle, and the metric-writing handles the execution stage needs.

use std::sync::Arc;

use crate::config::ServerSpec;
use crate::conn::credentials::Decryptor;
use crate::conn::descriptor::{build_descriptor, ConnectionDescriptor};
use crate::cycle::window::TimeWindow;
use crate::error::TargetError;
use crate::metrics::MetricWriter;

/// One server's unit of work for one cycle.
///
/// Created once per server per cycle and consumed by the executor; the
/// scheduler never sees it again after submission.
#[derive(Clone)]
pub struct PollTask {
    /// The raw server record, kept for downstream labeling
    pub server: ServerSpec,
    /// Resolved connection URL and properties
    pub descriptor: ConnectionDescriptor,
    /// Window snapshot taken at creation time
    pub window: TimeWindow,
    /// Prefix for every metric this task publishes
    pub metric_prefix: String,
    /// Opaque handle to the metric-publishing pipeline
    pub writer: Arc<dyn MetricWriter>,
}

impl std::fmt::Debug for PollTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollTask")
            .field("server", &self.server)
            .field("descriptor", &self.descriptor)
            .field("window", &self.window)
            .field("metric_prefix", &self.metric_prefix)
            .field("writer", &"<dyn MetricWriter>")
            .finish()
    }
}

/// Everything needed to assemble one poll task.
pub struct TaskParams<'a> {
    /// The server to poll
    pub server: &'a ServerSpec,
    /// This cycle's window
    pub window: TimeWindow,
    /// Metric path prefix
    pub metric_prefix: &'a str,
    /// Metric-publishing handle, passed through opaquely
    pub writer: &'a Arc<dyn MetricWriter>,
    /// Password decryption capability
    pub decryptor: &'a dyn Decryptor,
}

/// Assemble the poll task for one server.
///
/// Required fields are checked first; a failure there, or in descriptor
/// construction, aborts this server's task only. No shared state is touched,
/// so the call is idempotent.
pub fn create_task(params: TaskParams<'_>) -> Result<PollTask, TargetError> {
    params.server.validate()?;
    let descriptor = build_descriptor(params.server, params.decryptor)?;

    Ok(PollTask {
        server: params.server.clone(),
        descriptor,
        window: params.window,
        metric_prefix: params.metric_prefix.to_string(),
        writer: Arc::clone(params.writer),
    })
}

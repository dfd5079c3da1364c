//! sqlpulse - Periodic database poller
//!
//! sqlpulse polls a configured set of database servers on a fixed interval
//! and feeds the results to a monitoring pipeline as time-series metrics.
//! Each cycle derives an incremental query window, resolves per-server
//! credentials, builds one isolated task per server and dispatches them
//! concurrently; one server's failure never blocks another's.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod conn;
pub mod cycle;
pub mod dispatch;
pub mod error;
pub mod log;
pub mod metrics;

// Re-export commonly used types
pub use config::{GlobalConfig, MonitorConfig, PropertyEntry, ServerSpec};
pub use conn::credentials::{resolve_password, Base64Decryptor, Decryptor};
pub use conn::descriptor::{build_descriptor, ConnectionDescriptor};
pub use cycle::scheduler::{CycleReport, CycleScheduler, SkippedTarget};
pub use cycle::task::{create_task, PollTask, TaskParams};
pub use cycle::window::{TimeWindow, WindowTracker};
pub use dispatch::{ChannelExecutor, HeartbeatRunner, TaskRunner, TaskSink};
pub use error::TargetError;
pub use log::{CycleRecord, JsonlLogger, SkippedEntry};
pub use metrics::{MetricWriter, StdoutMetricWriter};

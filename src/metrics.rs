//! Metric writer capability
//!
//! The metric-publishing pipeline is an external collaborator; tasks carry an
//! opaque [`MetricWriter`] handle and never know where metrics end up.

/// Sink for published metric values.
pub trait MetricWriter: Send + Sync {
    /// Publish one metric observation under the given full path.
    fn write_metric(&self, name: &str, value: f64);
}

/// Writes metrics as `name=<path>,value=<n>` lines on stdout, the wire
/// convention of the machine-agent pipeline this feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutMetricWriter;

impl MetricWriter for StdoutMetricWriter {
    fn write_metric(&self, name: &str, value: f64) {
        println!("{}", format_metric(name, value));
    }
}

/// Format one metric observation as a pipeline line.
#[must_use]
pub fn format_metric(name: &str, value: f64) -> String {
    format!("name={name},value={value}")
}

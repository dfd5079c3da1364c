#![allow(missing_docs)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use tempfile::TempDir;

use sqlpulse::config::MonitorConfig;
use sqlpulse::conn::credentials::Decryptor;
use sqlpulse::cycle::scheduler::CycleScheduler;
use sqlpulse::cycle::task::PollTask;
use sqlpulse::dispatch::{ChannelExecutor, TaskRunner, TaskSink};
use sqlpulse::log::jsonl::{CycleRecord, JsonlLogger, SkippedEntry};
use sqlpulse::metrics::MetricWriter;

const TEST_CONFIG: &str = r#"
[global]
metric_prefix = "Custom Metrics|SQL"
poll_interval_secs = 10
workers = 2

[[server]]
display_name = "orders-db"
connection_url = "jdbc:postgresql://db1:5432/orders"
driver = "org.postgresql.Driver"
connection_properties = [
    { key = "user", value = "scott" },
    { key = "password", value = "" },
]
encrypted_password = "E"
encryption_key = "K"

[[server]]
display_name = "billing-db"
connection_url = "jdbc:mysql://db2:3306/billing"
driver = "com.mysql.jdbc.Driver"

[[server]]
display_name = "legacy-db"
connection_url = "//malformed-no-scheme"
driver = "org.h2.Driver"
"#;

/// Maps the fixture pair `("E", "K")` to `"secret"`, anything else fails.
struct StaticDecryptor;

impl Decryptor for StaticDecryptor {
    fn decrypt(&self, ciphertext: &str, key: &str) -> anyhow::Result<String> {
        if ciphertext == "E" && key == "K" {
            Ok("secret".to_string())
        } else {
            bail!("unknown ciphertext")
        }
    }
}

struct NullWriter;

impl MetricWriter for NullWriter {
    fn write_metric(&self, _name: &str, _value: f64) {}
}

/// Captures submitted tasks instead of executing them.
#[derive(Default)]
struct RecordingSink {
    submitted: Mutex<Vec<(String, PollTask)>>,
}

impl TaskSink for RecordingSink {
    fn submit(&self, name: &str, task: PollTask) -> anyhow::Result<()> {
        self.submitted.lock().unwrap().push((name.to_string(), task));
        Ok(())
    }
}

fn scheduler_from(config: &MonitorConfig, sink: Arc<dyn TaskSink>) -> CycleScheduler {
    CycleScheduler::new(
        config.servers.clone(),
        config.global.metric_prefix.clone(),
        Arc::new(NullWriter),
        Arc::new(StaticDecryptor),
        sink,
    )
}

/// Integration test: config → scheduler → dispatch, across the first two
/// ticks. The baseline tick dispatches nothing; the second tick attempts
/// every server, isolates the malformed one, and hands fully resolved
/// descriptors to the sink.
#[test]
fn test_two_ticks_end_to_end() {
    let config = MonitorConfig::parse(TEST_CONFIG).unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut scheduler = scheduler_from(&config, sink.clone());

    assert_eq!(scheduler.task_count(), 3);

    // Tick 1: baseline only
    let first = scheduler.tick_at(1_000);
    assert!(first.window.is_none());
    assert!(first.dispatched.is_empty());
    assert!(sink.submitted.lock().unwrap().is_empty());

    // Tick 2: both healthy servers dispatch, the malformed one is skipped
    let second = scheduler.tick_at(2_000);
    assert_eq!(second.dispatched, vec!["orders-db", "billing-db"]);
    assert_eq!(second.skipped.len(), 1);
    assert_eq!(second.skipped[0].server, "legacy-db");

    let submitted = sink.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2);

    // The orders-db task carries the decrypted password in declared order
    let (name, task) = &submitted[0];
    assert_eq!(name, "orders-db");
    assert_eq!(task.window.previous_ms, 1_000);
    assert_eq!(task.window.current_ms, 2_000);
    assert_eq!(task.metric_prefix, "Custom Metrics|SQL");
    assert_eq!(
        task.descriptor.properties,
        Some(vec![
            ("user".to_string(), "scott".to_string()),
            ("password".to_string(), "secret".to_string()),
        ])
    );

    // billing-db declares no properties: absent map, not an empty one
    let (_, billing) = &submitted[1];
    assert!(billing.descriptor.properties.is_none());
}

/// Integration test: cycle reports round-trip through the JSONL history log.
#[test]
fn test_cycle_history_logged_to_jsonl() {
    let config = MonitorConfig::parse(TEST_CONFIG).unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut scheduler = scheduler_from(&config, sink);

    let temp_dir = TempDir::new().unwrap();
    let logger = JsonlLogger::new(temp_dir.path()).unwrap();

    for (cycle, now_ms) in [(1u64, 1_000i64), (2, 2_000)] {
        let report = scheduler.tick_at(now_ms);
        let record = CycleRecord {
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
            target_count: scheduler.task_count(),
        };
        logger.append(&record).unwrap();
    }

    let entries = logger.read_all().unwrap();
    assert_eq!(entries.len(), 2);

    // Baseline cycle: no window, nothing dispatched, capacity still reported
    assert_eq!(entries[0].window_start_ms, None);
    assert!(entries[0].dispatched.is_empty());
    assert_eq!(entries[0].target_count, 3);

    // Second cycle: real window, dispatches and the skip reason
    assert_eq!(entries[1].window_start_ms, Some(1_000));
    assert_eq!(entries[1].window_end_ms, Some(2_000));
    assert_eq!(entries[1].dispatched, vec!["orders-db", "billing-db"]);
    assert_eq!(entries[1].skipped[0].server, "legacy-db");
}

/// Integration test: config loads from a file and drives the scheduler,
/// proving the file-based path used by the real CLI.
#[test]
fn test_config_from_file_and_tick() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("servers.toml");
    std::fs::write(&config_path, TEST_CONFIG).unwrap();

    let config = MonitorConfig::from_path(&config_path).unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut scheduler = scheduler_from(&config, sink.clone());

    scheduler.tick_at(1_000);
    scheduler.tick_at(2_000);

    assert_eq!(sink.submitted.lock().unwrap().len(), 2);
}

/// Integration test: reconfiguration between ticks changes the reported
/// capacity and the dispatched set, without resetting the window baseline.
#[test]
fn test_reconfiguration_between_ticks() {
    let config = MonitorConfig::parse(TEST_CONFIG).unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut scheduler = scheduler_from(&config, sink.clone());

    scheduler.tick_at(1_000);

    // Drop everything but billing-db before the second tick
    let billing = config.servers[1].clone();
    scheduler.reconfigure(vec![billing]);
    assert_eq!(scheduler.task_count(), 1);

    let report = scheduler.tick_at(2_000);
    assert_eq!(report.dispatched, vec!["billing-db"]);

    let submitted = sink.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    // Baseline survived reconfiguration: the window starts at tick 1
    assert_eq!(submitted[0].1.window.previous_ms, 1_000);
}

/// Integration test: scheduler feeding the real channel executor. Tasks
/// reach the runner asynchronously while the scheduler returns immediately.
#[tokio::test]
async fn test_dispatch_through_channel_executor() {
    #[derive(Default)]
    struct RecordingRunner {
        ran: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl TaskRunner for RecordingRunner {
        async fn run(&self, task: PollTask) -> anyhow::Result<()> {
            self.ran
                .lock()
                .unwrap()
                .push(task.server.display_name.clone());
            Ok(())
        }
    }

    let config = MonitorConfig::parse(TEST_CONFIG).unwrap();
    let runner = Arc::new(RecordingRunner::default());
    let executor = Arc::new(ChannelExecutor::spawn(2, runner.clone()));
    let mut scheduler = scheduler_from(&config, executor);

    scheduler.tick_at(1_000);
    let report = scheduler.tick_at(2_000);
    assert_eq!(report.dispatched.len(), 2);

    // The workers drain the queue shortly after the cycle finishes
    for _ in 0..100 {
        if runner.ran.lock().unwrap().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut ran = runner.ran.lock().unwrap().clone();
    ran.sort();
    assert_eq!(ran, vec!["billing-db", "orders-db"]);
}

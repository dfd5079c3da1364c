//! Logging and observability
//!
//! This module provides the append-only JSONL history of polling cycles.

pub mod jsonl;

pub use jsonl::{CycleRecord, JsonlLogger, SkippedEntry};

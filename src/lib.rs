//! krazy2view core library.
//!
//! This crate turns the raw output of the krazy2 static analyzer into
//! structured state: live progress from its status stream, and checkers and
//! issues from its XML report.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `progress`: Incremental status-stream parser emitting progress events.
//! - `report`: Incremental XML report parser filling `AnalysisResults`.
//! - `job`: One analysis run tying both parsers to the displayed results.
//! - `models`: Checkers, issues, results, and the issue table model.
//! - `output`: Human/JSON printers.
//! - `error`: Crate error type.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod models;
pub mod output;
pub mod progress;
pub mod report;
pub mod utils;

pub use error::{Error, Result};

//! Error types for procrec
//!
//! Two layers: [`ProbeError`] describes a single failed query against the
//! operating system and is always absorbed by the sampling loop, while
//! [`MonitorError`] covers the failures that abort a run before (or instead
//! of) sampling.

use std::path::PathBuf;
use thiserror::Error;

/// A failed per-process query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// The process no longer exists
    #[error("process {pid} no longer exists")]
    ProcessGone { pid: u32 },

    /// The process exists but one metric could not be read
    #[error("{metric} unavailable for process {pid}: {reason}")]
    MetricUnavailable {
        pid: u32,
        metric: &'static str,
        reason: String,
    },
}

impl ProbeError {
    pub fn unavailable(pid: u32, metric: &'static str, reason: impl ToString) -> Self {
        ProbeError::MetricUnavailable {
            pid,
            metric,
            reason: reason.to_string(),
        }
    }
}

/// Fatal errors surfaced to the caller
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("cannot write log file {path}: {source}")]
    LogUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("process {0} not found")]
    ProcessNotFound(u32),

    #[error("failed to start command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

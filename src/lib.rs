//! Record CPU, memory and I/O usage of a process over time
//!
//! Attach to a running process or start a shell command, sample it (and
//! optionally its descendants) until it exits or a time budget runs out, and
//! write the series to a fixed-width text log and/or a chart.

pub mod config;
pub mod core;
pub mod error;
pub mod output;
pub mod probe;
pub mod series;
pub mod tree;

// Re-export the main types for use in tests and binaries
pub use crate::config::{MonitorConfig, MonitorConfigBuilder, Target};
pub use crate::core::{Report, Sampler, SamplingConfig, Session, Termination};
pub use crate::error::{MonitorError, ProbeError, Result};
pub use crate::probe::{ProcessProbe, ProcessStatus, SystemProbe};
pub use crate::series::{Sample, Series, Summary};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Run a complete monitoring session
///
/// `interrupt` is an optional "keep running" flag; clearing it stops the
/// loop at its next check and all outputs are still written.
pub fn run_monitor(config: MonitorConfig, interrupt: Option<Arc<AtomicBool>>) -> Result<Report> {
    Session::start(config)?.run(interrupt)
}

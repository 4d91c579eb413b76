//! Run configuration
//!
//! [`MonitorConfig`] is built through [`MonitorConfigBuilder`], which validates
//! the numeric options up front so that a bad value fails before any process
//! is spawned or attached.

use crate::error::{MonitorError, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// What to monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Target {
    /// Attach to an already running process
    Pid(u32),
    /// Start a shell command and monitor the resulting process
    Command(String),
}

impl Target {
    /// Integers are process ids, anything else is a shell command
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<u32>() {
            Ok(pid) => Target::Pid(pid),
            Err(_) => Target::Command(value.to_string()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Pid(pid) => write!(f, "pid {pid}"),
            Target::Command(cmd) => write!(f, "'{cmd}'"),
        }
    }
}

/// Validated configuration for one monitoring run
#[derive(Debug, Clone, Serialize)]
pub struct MonitorConfig {
    pub target: Target,
    /// Text log destination; `None` disables the log
    pub log_path: Option<PathBuf>,
    /// Chart destination; `None` disables rendering and sample accumulation
    pub chart_path: Option<PathBuf>,
    /// Stop once elapsed time exceeds this
    pub max_duration: Option<Duration>,
    /// Pause between samples; `None` samples as fast as a pass completes
    pub interval: Option<Duration>,
    pub include_children: bool,
    /// Plot I/O read/write on the secondary chart axis
    pub include_io: bool,
    /// Fix the CPU axis at 100% per logical core
    pub max_cpu_scale: bool,
}

impl MonitorConfig {
    pub fn builder(target: Target) -> MonitorConfigBuilder {
        MonitorConfigBuilder::new(target)
    }

    pub fn records_series(&self) -> bool {
        self.chart_path.is_some()
    }
}

/// Builder for [`MonitorConfig`]
#[derive(Debug, Clone)]
pub struct MonitorConfigBuilder {
    target: Target,
    log_path: Option<PathBuf>,
    chart_path: Option<PathBuf>,
    duration_secs: Option<f64>,
    interval_secs: Option<f64>,
    include_children: bool,
    include_io: bool,
    max_cpu_scale: bool,
}

impl MonitorConfigBuilder {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            log_path: None,
            chart_path: None,
            duration_secs: None,
            interval_secs: None,
            include_children: false,
            include_io: true,
            max_cpu_scale: false,
        }
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn chart_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_path = Some(path.into());
        self
    }

    pub fn duration_secs(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    pub fn interval_secs(mut self, secs: f64) -> Self {
        self.interval_secs = Some(secs);
        self
    }

    pub fn include_children(mut self, include: bool) -> Self {
        self.include_children = include;
        self
    }

    pub fn include_io(mut self, include: bool) -> Self {
        self.include_io = include;
        self
    }

    pub fn max_cpu_scale(mut self, enabled: bool) -> Self {
        self.max_cpu_scale = enabled;
        self
    }

    pub fn build(self) -> Result<MonitorConfig> {
        if let Target::Command(cmd) = &self.target {
            if cmd.trim().is_empty() {
                return Err(MonitorError::InvalidConfiguration(
                    "Command cannot be empty".to_string(),
                ));
            }
        }

        let max_duration = self
            .duration_secs
            .map(|secs| seconds_to_duration("duration", secs))
            .transpose()?;

        let interval = self
            .interval_secs
            .map(|secs| seconds_to_duration("interval", secs))
            .transpose()?
            .filter(|interval| !interval.is_zero());

        Ok(MonitorConfig {
            target: self.target,
            log_path: self.log_path,
            chart_path: self.chart_path,
            max_duration,
            interval,
            include_children: self.include_children,
            include_io: self.include_io,
            max_cpu_scale: self.max_cpu_scale,
        })
    }
}

fn seconds_to_duration(name: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(MonitorError::InvalidConfiguration(format!(
            "{name} must be a non-negative number of seconds, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| MonitorError::InvalidConfiguration(format!("{name}: {e}")))
}

//! Process handle adapter
//!
//! The sampling loop only talks to processes through [`ProcessProbe`]. The
//! production implementation is [`SystemProbe`]; platform differences are
//! resolved inside it and never leak into the loop.

mod system;

#[cfg(test)]
pub(crate) mod scripted;

pub use system::{logical_core_count, SystemProbe};

use crate::error::ProbeError;
use serde::Serialize;

/// Liveness of a process as seen at the last refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessStatus {
    Running,
    /// Alive but not currently on a CPU (sleeping, stopped, idle, ...)
    Sleeping,
    Zombie,
    Dead,
    NotFound,
}

impl ProcessStatus {
    /// The process has exited, even if it has not been reaped yet
    pub fn is_finished(self) -> bool {
        matches!(self, ProcessStatus::Zombie | ProcessStatus::Dead)
    }
}

/// Memory usage in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryInfo {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

/// Cumulative storage I/O in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IoCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Read-only view of OS process state
///
/// `refresh` is called once at the top of every sampling pass; all other
/// methods answer from the state captured by the most recent refresh (or
/// query the OS directly where no snapshot is kept). Every per-process query
/// returns [`ProbeError::ProcessGone`] when the process has vanished.
pub trait ProcessProbe {
    /// Update cached state for `root` (and the whole process table when
    /// children are needed)
    fn refresh(&mut self, root: u32, include_children: bool);

    fn status(&self, pid: u32) -> ProcessStatus;

    /// CPU usage since the previous refresh, as a percentage of one logical core
    fn cpu_percent(&self, pid: u32) -> Result<f32, ProbeError>;

    fn memory(&self, pid: u32) -> Result<MemoryInfo, ProbeError>;

    fn io_counters(&self, pid: u32) -> Result<IoCounters, ProbeError>;

    /// Direct children, ordered by pid
    fn children(&self, pid: u32) -> Result<Vec<u32>, ProbeError>;
}

//! Deterministic in-memory probe for loop and tree tests

use super::{IoCounters, MemoryInfo, ProcessProbe, ProcessStatus};
use crate::error::ProbeError;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FakeProcess {
    pub cpu: f32,
    pub memory: MemoryInfo,
    pub io: IoCounters,
}

/// Root status is scripted per refresh; the last scripted status repeats
#[derive(Default)]
pub(crate) struct ScriptedProbe {
    root_statuses: VecDeque<ProcessStatus>,
    current_root_status: Option<ProcessStatus>,
    root: Option<u32>,
    processes: HashMap<u32, FakeProcess>,
    children: HashMap<u32, Vec<u32>>,
    failing_metrics: HashSet<u32>,
    failing_io: HashSet<u32>,
    failing_children: HashSet<u32>,
    refreshes: usize,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(mut self, pid: u32, cpu: f32, resident_mb: u64) -> Self {
        self.processes.insert(
            pid,
            FakeProcess {
                cpu,
                memory: MemoryInfo {
                    resident_bytes: resident_mb * 1024 * 1024,
                    virtual_bytes: resident_mb * 2 * 1024 * 1024,
                },
                io: IoCounters::default(),
            },
        );
        self
    }

    pub fn with_io(mut self, pid: u32, read_bytes: u64, write_bytes: u64) -> Self {
        if let Some(process) = self.processes.get_mut(&pid) {
            process.io = IoCounters {
                read_bytes,
                write_bytes,
            };
        }
        self
    }

    pub fn with_children(mut self, pid: u32, children: &[u32]) -> Self {
        self.children.insert(pid, children.to_vec());
        self
    }

    pub fn with_root_statuses(mut self, statuses: &[ProcessStatus]) -> Self {
        self.root_statuses = statuses.iter().copied().collect();
        self
    }

    /// CPU and memory queries for `pid` fail with `ProcessGone`
    pub fn failing_metrics(mut self, pid: u32) -> Self {
        self.failing_metrics.insert(pid);
        self
    }

    pub fn failing_io(mut self, pid: u32) -> Self {
        self.failing_io.insert(pid);
        self
    }

    /// `children(pid)` fails as if the process vanished mid-walk
    pub fn failing_children(mut self, pid: u32) -> Self {
        self.failing_children.insert(pid);
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    fn lookup(&self, pid: u32) -> Result<&FakeProcess, ProbeError> {
        if self.failing_metrics.contains(&pid) {
            return Err(ProbeError::ProcessGone { pid });
        }
        self.processes
            .get(&pid)
            .ok_or(ProbeError::ProcessGone { pid })
    }
}

impl ProcessProbe for ScriptedProbe {
    fn refresh(&mut self, root: u32, _include_children: bool) {
        self.root = Some(root);
        self.refreshes += 1;
        if let Some(next) = self.root_statuses.pop_front() {
            self.current_root_status = Some(next);
        }
    }

    fn status(&self, pid: u32) -> ProcessStatus {
        if Some(pid) == self.root {
            if let Some(status) = self.current_root_status {
                return status;
            }
        }
        if self.processes.contains_key(&pid) {
            ProcessStatus::Running
        } else {
            ProcessStatus::NotFound
        }
    }

    fn cpu_percent(&self, pid: u32) -> Result<f32, ProbeError> {
        Ok(self.lookup(pid)?.cpu)
    }

    fn memory(&self, pid: u32) -> Result<MemoryInfo, ProbeError> {
        Ok(self.lookup(pid)?.memory)
    }

    fn io_counters(&self, pid: u32) -> Result<IoCounters, ProbeError> {
        if self.failing_io.contains(&pid) {
            return Err(ProbeError::unavailable(pid, "io counters", "permission denied"));
        }
        Ok(self.lookup(pid)?.io)
    }

    fn children(&self, pid: u32) -> Result<Vec<u32>, ProbeError> {
        if self.failing_children.contains(&pid) {
            return Err(ProbeError::ProcessGone { pid });
        }
        Ok(self.children.get(&pid).cloned().unwrap_or_default())
    }
}

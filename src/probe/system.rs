use super::{IoCounters, MemoryInfo, ProcessProbe, ProcessStatus};
use crate::error::ProbeError;
use sysinfo::{
    CpuRefreshKind, Pid, Process, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System,
};

/// [`ProcessProbe`] backed by sysinfo, with procfs for I/O on Linux
pub struct SystemProbe {
    system: System,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// Check whether a process exists right now, without touching the snapshot
    pub fn process_exists(pid: u32) -> bool {
        #[cfg(target_os = "linux")]
        {
            std::path::Path::new(&format!("/proc/{}", pid)).exists()
        }

        #[cfg(not(target_os = "linux"))]
        {
            let mut system = System::new();
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[Pid::from_u32(pid)]),
                true,
                ProcessRefreshKind::nothing(),
            );
            system.process(Pid::from_u32(pid)).is_some()
        }
    }

    fn process(&self, pid: u32) -> Result<&Process, ProbeError> {
        self.system
            .process(Pid::from_u32(pid))
            .ok_or(ProbeError::ProcessGone { pid })
    }

    fn refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing()
            .with_cpu()
            .with_memory()
            .with_disk_usage()
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SystemProbe {
    fn refresh(&mut self, root: u32, include_children: bool) {
        let root = [Pid::from_u32(root)];
        let targets = if include_children {
            // Child discovery needs parent links for the whole table
            ProcessesToUpdate::All
        } else {
            ProcessesToUpdate::Some(&root)
        };
        self.system
            .refresh_processes_specifics(targets, true, Self::refresh_kind());
    }

    fn status(&self, pid: u32) -> ProcessStatus {
        match self.system.process(Pid::from_u32(pid)) {
            None => ProcessStatus::NotFound,
            Some(process) => match process.status() {
                sysinfo::ProcessStatus::Run => ProcessStatus::Running,
                sysinfo::ProcessStatus::Zombie => ProcessStatus::Zombie,
                sysinfo::ProcessStatus::Dead => ProcessStatus::Dead,
                _ => ProcessStatus::Sleeping,
            },
        }
    }

    fn cpu_percent(&self, pid: u32) -> Result<f32, ProbeError> {
        let cpu = self.process(pid)?.cpu_usage();
        if cpu.is_finite() {
            Ok(cpu.max(0.0))
        } else {
            Err(ProbeError::unavailable(pid, "cpu", "non-finite value"))
        }
    }

    fn memory(&self, pid: u32) -> Result<MemoryInfo, ProbeError> {
        let process = self.process(pid)?;
        Ok(MemoryInfo {
            resident_bytes: process.memory(),
            virtual_bytes: process.virtual_memory(),
        })
    }

    fn io_counters(&self, pid: u32) -> Result<IoCounters, ProbeError> {
        #[cfg(target_os = "linux")]
        {
            self.process(pid)?;
            read_proc_io(pid)
        }

        #[cfg(not(target_os = "linux"))]
        {
            let usage = self.process(pid)?.disk_usage();
            Ok(IoCounters {
                read_bytes: usage.total_read_bytes,
                write_bytes: usage.total_written_bytes,
            })
        }
    }

    fn children(&self, pid: u32) -> Result<Vec<u32>, ProbeError> {
        let parent = self.process(pid)?.pid();
        let mut children: Vec<u32> = self
            .system
            .processes()
            .values()
            // Linux threads show up as tasks of their process; skip them
            .filter(|p| p.parent() == Some(parent) && p.thread_kind().is_none())
            .map(|p| p.pid().as_u32())
            .collect();
        children.sort_unstable();
        Ok(children)
    }
}

/// Read `/proc/<pid>/io`
#[cfg(target_os = "linux")]
fn read_proc_io(pid: u32) -> Result<IoCounters, ProbeError> {
    let gone_or_unavailable = |e: procfs::ProcError| match e {
        procfs::ProcError::NotFound(_) => ProbeError::ProcessGone { pid },
        other => ProbeError::unavailable(pid, "io counters", other),
    };

    let process = procfs::process::Process::new(pid as i32).map_err(gone_or_unavailable)?;
    let io = process.io().map_err(gone_or_unavailable)?;
    Ok(IoCounters {
        read_bytes: io.read_bytes,
        write_bytes: io.write_bytes,
    })
}

/// Number of logical cores on this host, at least 1
pub fn logical_core_count() -> usize {
    let system =
        System::new_with_specifics(RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()));
    system.cpus().len().max(1)
}

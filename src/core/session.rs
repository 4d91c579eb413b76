//! One monitoring run from start to finish
//!
//! A [`Session`] owns everything scoped to a run: the validated config, the
//! open log file, and (in spawn mode) the child process. The spawned process
//! is released on every exit path, including panics, through
//! [`SpawnedProcess`]'s `Drop`.

use crate::config::{MonitorConfig, Target};
use crate::core::sampler::{Sampler, SamplingConfig, Termination};
use crate::error::{MonitorError, Result};
use crate::output::{render_chart, ChartOptions, ChartOutcome, LogWriter};
use crate::probe::{logical_core_count, ProcessProbe, SystemProbe};
use crate::series::{Series, Summary};
use std::fs::File;
use std::io::BufWriter;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// A shell command started for monitoring; killed when released or dropped
pub struct SpawnedProcess {
    child: Child,
    command: String,
    released: bool,
}

impl SpawnedProcess {
    pub fn spawn(command: &str) -> Result<Self> {
        let mut shell = shell_command(command);
        shell.stdin(Stdio::null());

        // Own process group so the whole tree can be signalled at once and
        // a terminal Ctrl-C only reaches the monitor
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            shell.process_group(0);
        }

        let child = shell.spawn().map_err(|source| MonitorError::Spawn {
            command: command.to_string(),
            source,
        })?;
        log::debug!("Started '{}' as pid {}", command, child.id());

        Ok(Self {
            child,
            command: command.to_string(),
            released: false,
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Kill the process (and its process group on Unix) and reap it
    pub fn terminate(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        #[cfg(unix)]
        {
            // The child is unreaped until wait() below, so its pid (and
            // therefore the group id) cannot have been reused yet
            let pgid = self.child.id() as libc::pid_t;
            if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
                log::debug!(
                    "killpg({}) failed: {}",
                    pgid,
                    std::io::Error::last_os_error()
                );
            }
        }

        if let Err(e) = self.child.kill() {
            log::debug!("kill of pid {} failed: {}", self.child.id(), e);
        }
        match self.child.wait() {
            Ok(status) => log::debug!("'{}' ended with {}", self.command, status),
            Err(e) => log::warn!("Failed to reap pid {}: {}", self.child.id(), e),
        }
    }
}

impl Drop for SpawnedProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut shell = Command::new("cmd");
        shell.arg("/C").arg(command);
        shell
    }

    #[cfg(not(windows))]
    {
        let mut shell = Command::new("sh");
        shell.arg("-c").arg(command);
        shell
    }
}

/// What a finished run produced
#[derive(Debug)]
pub struct Report {
    pub pid: u32,
    /// The process was started by this run (and has been killed)
    pub spawned: bool,
    pub termination: Termination,
    pub elapsed: Duration,
    pub samples_taken: usize,
    pub summary: Summary,
    /// Empty unless a chart was requested
    pub series: Series,
    pub chart: Option<ChartOutcome>,
}

/// A prepared run: outputs opened and target resolved, sampling not started
pub struct Session {
    config: MonitorConfig,
    pid: u32,
    spawned: Option<SpawnedProcess>,
    log: Option<LogWriter<BufWriter<File>>>,
}

impl Session {
    /// Open the log, then attach to or spawn the target
    ///
    /// The log is opened first so an unwritable path fails before any
    /// process is started.
    pub fn start(config: MonitorConfig) -> Result<Self> {
        let log = config
            .log_path
            .as_deref()
            .map(LogWriter::create)
            .transpose()?;

        let (pid, spawned) = match &config.target {
            Target::Pid(pid) => {
                if !SystemProbe::process_exists(*pid) {
                    return Err(MonitorError::ProcessNotFound(*pid));
                }
                (*pid, None)
            }
            Target::Command(command) => {
                let spawned = SpawnedProcess::spawn(command)?;
                (spawned.pid(), Some(spawned))
            }
        };

        Ok(Self {
            config,
            pid,
            spawned,
            log,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_spawned(&self) -> bool {
        self.spawned.is_some()
    }

    pub fn run(self, interrupt: Option<Arc<AtomicBool>>) -> Result<Report> {
        self.run_with_probe(SystemProbe::new(), interrupt)
    }

    /// Sample until done, then close the log, release the spawned process
    /// and render the chart
    pub fn run_with_probe<P: ProcessProbe>(
        mut self,
        probe: P,
        interrupt: Option<Arc<AtomicBool>>,
    ) -> Result<Report> {
        let mut sampler = Sampler::new(probe, SamplingConfig::from(&self.config));
        if let Some(signal) = interrupt {
            sampler = sampler.with_interrupt_signal(signal);
        }

        let outcome = sampler.run(self.pid, self.log.as_mut());

        let spawned = self.spawned.is_some();
        if let Some(mut process) = self.spawned.take() {
            process.terminate();
        }

        if let Some(writer) = self.log.take() {
            if let Err(e) = writer.finish() {
                log::warn!("Failed to flush log file: {}", e);
            }
        }

        let chart = match &self.config.chart_path {
            Some(path) => {
                let options = ChartOptions {
                    include_io: self.config.include_io,
                    max_cpu_cores: self.config.max_cpu_scale.then(logical_core_count),
                };
                Some(render_chart(path, &outcome.series, &options)?)
            }
            None => None,
        };

        Ok(Report {
            pid: self.pid,
            spawned,
            termination: outcome.termination,
            elapsed: outcome.elapsed,
            samples_taken: outcome.samples_taken,
            summary: outcome.summary,
            series: outcome.series,
            chart,
        })
    }
}

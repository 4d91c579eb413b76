//! The sampling loop
//!
//! One [`Sampler`] drives sequential sampling passes over a root process
//! (and optionally its descendants) until one of the termination conditions
//! in [`Termination`] is met. Every per-sample failure is absorbed here.

use crate::config::MonitorConfig;
use crate::error::ProbeError;
use crate::output::LogWriter;
use crate::probe::{ProcessProbe, ProcessStatus};
use crate::series::{bytes_to_mb, Sample, Series, Summary};
use crate::tree;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep; bounds how late an interrupt is noticed
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Loop-level settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplingConfig {
    pub max_duration: Option<Duration>,
    pub interval: Option<Duration>,
    pub include_children: bool,
    /// Keep every sample in memory for later rendering
    pub record_series: bool,
}

impl SamplingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_children(mut self, include: bool) -> Self {
        self.include_children = include;
        self
    }

    pub fn recording_series(mut self, record: bool) -> Self {
        self.record_series = record;
        self
    }
}

impl From<&MonitorConfig> for SamplingConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            max_duration: config.max_duration,
            interval: config.interval,
            include_children: config.include_children,
            record_series: config.records_series(),
        }
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// Root reported zombie or dead
    ProcessFinished,
    /// Root vanished from the process table
    ProcessGone,
    DurationExceeded,
    /// A root metric query failed
    Unobservable(ProbeError),
    Interrupted,
}

/// Everything a finished loop produced
#[derive(Debug)]
pub struct SamplingOutcome {
    pub termination: Termination,
    /// Elapsed time at the final check
    pub elapsed: Duration,
    pub samples_taken: usize,
    /// Empty unless `record_series` was set
    pub series: Series,
    pub summary: Summary,
}

/// Contribution of one descendant to a sample
enum Contribution {
    Measured { cpu: f64, resident: u64, virt: u64 },
    Skipped(ProbeError),
}

pub struct Sampler<P: ProcessProbe> {
    probe: P,
    config: SamplingConfig,
    interrupt_signal: Option<Arc<AtomicBool>>,
}

impl<P: ProcessProbe> Sampler<P> {
    pub fn new(probe: P, config: SamplingConfig) -> Self {
        Self {
            probe,
            config,
            interrupt_signal: None,
        }
    }

    /// Stop when `signal` turns false (e.g. from a Ctrl-C handler)
    pub fn with_interrupt_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.interrupt_signal = Some(signal);
        self
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Sample `root` until a termination condition holds
    ///
    /// Each sample is written to `log_writer` (if any) before the interval sleep.
    /// A log write failure disables the log for the rest of the run.
    pub fn run<W: Write>(
        &mut self,
        root: u32,
        mut log_writer: Option<&mut LogWriter<W>>,
    ) -> SamplingOutcome {
        let start = Instant::now();
        let mut series = Series::new();
        let mut summary = Summary::new();
        let mut samples_taken = 0;

        let (termination, elapsed) = loop {
            let elapsed = start.elapsed();
            self.probe.refresh(root, self.config.include_children);

            match self.probe.status(root) {
                status if status.is_finished() => break (Termination::ProcessFinished, elapsed),
                ProcessStatus::NotFound => break (Termination::ProcessGone, elapsed),
                _ => {}
            }

            if let Some(max_duration) = self.config.max_duration {
                if elapsed > max_duration {
                    break (Termination::DurationExceeded, elapsed);
                }
            }

            let sample = match self.sample(root, elapsed) {
                Ok(sample) => sample,
                Err(e) => break (Termination::Unobservable(e), elapsed),
            };

            if self.interrupted() {
                break (Termination::Interrupted, elapsed);
            }

            samples_taken += 1;
            summary.observe(&sample);

            let write_failure = match log_writer.as_deref_mut() {
                Some(writer) => writer.write_sample(&sample).err(),
                None => None,
            };
            if let Some(e) = write_failure {
                log::warn!("Failed to write log row, disabling log output: {}", e);
                log_writer = None;
            }

            if let Some(interval) = self.config.interval {
                self.pause(interval);
            }

            if self.config.record_series {
                series.push(sample);
            }
        };

        log::info!(
            "Sampling of {} stopped after {:.3}s with {} samples: {:?}",
            root,
            elapsed.as_secs_f64(),
            samples_taken,
            termination
        );

        SamplingOutcome {
            termination,
            elapsed,
            samples_taken,
            series,
            summary,
        }
    }

    /// One aggregated measurement of the root (and descendants, if enabled)
    fn sample(&self, root: u32, elapsed: Duration) -> Result<Sample, ProbeError> {
        let mut cpu = f64::from(self.probe.cpu_percent(root)?);
        let memory = self.probe.memory(root)?;
        let io = self.probe.io_counters(root)?;

        let mut resident = memory.resident_bytes;
        let mut virt = memory.virtual_bytes;
        let mut process_count = 1;

        if self.config.include_children {
            for pid in tree::descendants(&self.probe, root) {
                match self.measure(pid) {
                    Contribution::Measured {
                        cpu: child_cpu,
                        resident: child_resident,
                        virt: child_virt,
                    } => {
                        cpu += child_cpu;
                        resident += child_resident;
                        virt += child_virt;
                        process_count += 1;
                    }
                    Contribution::Skipped(e) => {
                        log::debug!("Skipping descendant {}: {}", pid, e);
                    }
                }
            }
        }

        Ok(Sample {
            elapsed_secs: elapsed.as_secs_f64(),
            cpu_percent: cpu,
            resident_mb: bytes_to_mb(resident),
            virtual_mb: bytes_to_mb(virt),
            io_read_mb: bytes_to_mb(io.read_bytes),
            io_write_mb: bytes_to_mb(io.write_bytes),
            process_count,
        })
    }

    fn measure(&self, pid: u32) -> Contribution {
        let cpu = match self.probe.cpu_percent(pid) {
            Ok(cpu) => cpu,
            Err(e) => return Contribution::Skipped(e),
        };
        match self.probe.memory(pid) {
            Ok(memory) => Contribution::Measured {
                cpu: f64::from(cpu),
                resident: memory.resident_bytes,
                virt: memory.virtual_bytes,
            },
            Err(e) => Contribution::Skipped(e),
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupt_signal
            .as_ref()
            .is_some_and(|running| !running.load(Ordering::SeqCst))
    }

    /// Sleep for `interval`, returning early once interrupted
    ///
    /// An interval beyond the clock's range waits until interrupted.
    fn pause(&self, interval: Duration) {
        let deadline = Instant::now().checked_add(interval);
        loop {
            if self.interrupted() {
                return;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }
                    (deadline - now).min(SLEEP_SLICE)
                }
                None => SLEEP_SLICE,
            };
            std::thread::sleep(slice);
        }
    }
}

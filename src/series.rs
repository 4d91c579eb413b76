//! Samples, the in-memory series, and run summaries

use serde::Serialize;

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// One aggregated measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Seconds since monitoring started
    pub elapsed_secs: f64,
    /// Sum of per-process CPU percentages (100 = one full core)
    pub cpu_percent: f64,
    pub resident_mb: f64,
    pub virtual_mb: f64,
    /// Root process only
    pub io_read_mb: f64,
    /// Root process only
    pub io_write_mb: f64,
    /// Root plus every descendant that could be measured
    pub process_count: usize,
}

/// Ordered samples of one run; append-only
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Largest value of `metric`, or `None` for an empty series
    pub fn max_of(&self, metric: impl Fn(&Sample) -> f64) -> Option<f64> {
        self.samples.iter().map(metric).reduce(f64::max)
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Running statistics over every sample of a run
///
/// Updated per sample so it is available even when the series itself is
/// not kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub sample_count: usize,
    pub elapsed_secs: f64,
    pub peak_cpu_percent: f64,
    pub avg_cpu_percent: f64,
    pub peak_resident_mb: f64,
    pub avg_resident_mb: f64,
    pub peak_virtual_mb: f64,
    pub io_read_mb: f64,
    pub io_write_mb: f64,
    pub peak_process_count: usize,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Self {
        let mut summary = Self::new();
        for sample in samples {
            summary.observe(sample);
        }
        summary
    }

    pub fn observe(&mut self, sample: &Sample) {
        let n = self.sample_count as f64;
        self.avg_cpu_percent = (self.avg_cpu_percent * n + sample.cpu_percent) / (n + 1.0);
        self.avg_resident_mb = (self.avg_resident_mb * n + sample.resident_mb) / (n + 1.0);
        self.sample_count += 1;

        self.elapsed_secs = sample.elapsed_secs;
        self.peak_cpu_percent = self.peak_cpu_percent.max(sample.cpu_percent);
        self.peak_resident_mb = self.peak_resident_mb.max(sample.resident_mb);
        self.peak_virtual_mb = self.peak_virtual_mb.max(sample.virtual_mb);
        // I/O counters are cumulative, the latest value is the total
        self.io_read_mb = sample.io_read_mb;
        self.io_write_mb = sample.io_write_mb;
        self.peak_process_count = self.peak_process_count.max(sample.process_count);
    }
}

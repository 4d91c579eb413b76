//! Fixed-width text log, one row per sample

use crate::error::{MonitorError, Result};
use crate::series::Sample;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const COLUMN_WIDTH: usize = 12;

/// Streams samples as text rows, flushing after every row so the file is
/// complete up to the last sample however the run ends
pub struct LogWriter<W: Write> {
    inner: W,
    rows: usize,
}

impl LogWriter<BufWriter<File>> {
    /// Create (truncate) the log file and write the header
    pub fn create(path: &Path) -> Result<Self> {
        let unwritable = |source| MonitorError::LogUnwritable {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(unwritable)?;
        LogWriter::new(BufWriter::new(file)).map_err(unwritable)
    }
}

impl<W: Write> LogWriter<W> {
    pub fn new(mut inner: W) -> io::Result<Self> {
        writeln!(inner, "{}", header())?;
        inner.flush()?;
        Ok(Self { inner, rows: 0 })
    }

    pub fn write_sample(&mut self, sample: &Sample) -> io::Result<()> {
        writeln!(self.inner, "{}", format_row(sample))?;
        self.inner.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Number of sample rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

pub fn header() -> String {
    format!(
        "# {:^w$} {:^w$} {:^w$} {:^w$}",
        "Elapsed time",
        "CPU (%)",
        "Real (MB)",
        "Virtual (MB)",
        w = COLUMN_WIDTH
    )
}

pub fn format_row(sample: &Sample) -> String {
    format!(
        "{:w$.3} {:w$.3} {:w$.3} {:w$.3}",
        sample.elapsed_secs,
        sample.cpu_percent,
        sample.resident_mb,
        sample.virtual_mb,
        w = COLUMN_WIDTH
    )
}

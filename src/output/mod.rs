//! Consumers of samples: the text log and the chart

pub mod chart;
pub mod log_writer;

pub use chart::{render_chart, ChartLayout, ChartOptions, ChartOutcome};
pub use log_writer::LogWriter;

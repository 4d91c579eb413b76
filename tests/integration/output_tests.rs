//! Tests for the log file and chart outputs using hand-built series

use procrec::output::{render_chart, ChartLayout, ChartOptions, ChartOutcome, LogWriter};
use procrec::{MonitorError, Sample, Series};

fn sample(elapsed: f64, cpu: f64, rss: f64) -> Sample {
    Sample {
        elapsed_secs: elapsed,
        cpu_percent: cpu,
        resident_mb: rss,
        virtual_mb: rss * 4.0,
        io_read_mb: 0.25 * elapsed,
        io_write_mb: 0.0,
        process_count: 1,
    }
}

/// Test that the log file parses back into the values written
#[test]
fn test_log_file_round_trip_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");

    let samples = vec![sample(0.0, 0.0, 3.5), sample(0.1, 97.25, 3.75)];
    let mut writer = LogWriter::create(&path).unwrap();
    for s in &samples {
        writer.write_sample(s).unwrap();
    }

    // Rows are flushed as they are written, before the writer is closed
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);
    drop(writer);

    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("# "));
    assert!(header.contains("Elapsed time"));
    assert!(header.contains("Virtual (MB)"));

    for (line, expected) in lines.zip(&samples) {
        let fields: Vec<f64> = line
            .split_whitespace()
            .map(|f| f.parse().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec![
                expected.elapsed_secs,
                expected.cpu_percent,
                expected.resident_mb,
                expected.virtual_mb
            ]
        );
    }
}

#[test]
fn test_log_writer_reports_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened as a file
    let err = LogWriter::create(dir.path()).err().unwrap();
    assert!(matches!(err, MonitorError::LogUnwritable { .. }));
}

/// Test that an empty series never reaches the drawing code
#[test]
fn test_empty_series_chart_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let options = ChartOptions {
        include_io: true,
        max_cpu_cores: Some(4),
    };

    for name in ["empty.png", "empty.svg"] {
        let path = dir.path().join(name);
        let outcome = render_chart(&path, &Series::new(), &options).unwrap();
        assert_eq!(outcome, ChartOutcome::SkippedEmpty);
        assert!(!path.exists());
    }
}

#[test]
fn test_layout_headroom() {
    let series: Series = vec![sample(0.0, 10.0, 100.0), sample(4.0, 150.0, 50.0)]
        .into_iter()
        .collect();
    let options = ChartOptions {
        include_io: false,
        max_cpu_cores: None,
    };

    let layout = ChartLayout::for_series(&series, &options).unwrap();
    assert_eq!(layout.time, 0.0..4.0);
    assert!((layout.cpu.end - 180.0).abs() < 1e-9);
    assert!((layout.secondary.end - 120.0).abs() < 1e-9);
}

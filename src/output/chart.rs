//! Static chart of a finished run
//!
//! CPU goes on the primary y axis; resident memory (and optionally I/O read
//! and write) on the secondary one. Axis ranges are computed by
//! [`ChartLayout`] so the numeric edge cases can be tested without drawing.

use crate::error::{MonitorError, Result};
use crate::series::{Sample, Series};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1024, 640);
const HEADROOM: f64 = 1.2;

/// Options that only affect drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub include_io: bool,
    /// `Some(cores)` pins the CPU axis at `100 * cores`
    pub max_cpu_cores: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartOutcome {
    Rendered,
    /// Nothing was collected, so no file was written
    SkippedEmpty,
}

/// Axis ranges for a series
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub time: Range<f64>,
    pub cpu: Range<f64>,
    pub secondary: Range<f64>,
}

impl ChartLayout {
    /// `None` for an empty series, which has no maximum to scale against
    pub fn for_series(series: &Series, options: &ChartOptions) -> Option<Self> {
        // Samples are appended in time order
        let last_time = series.last()?.elapsed_secs;

        let cpu_top = match options.max_cpu_cores {
            Some(cores) => 100.0 * cores.max(1) as f64,
            None => scaled_top(series.max_of(|s| s.cpu_percent)?),
        };

        let mut secondary_max = series.max_of(|s| s.resident_mb)?;
        if options.include_io {
            secondary_max = secondary_max
                .max(series.max_of(|s| s.io_read_mb)?)
                .max(series.max_of(|s| s.io_write_mb)?);
        }

        Some(Self {
            time: 0.0..nonzero(last_time),
            cpu: 0.0..cpu_top,
            secondary: 0.0..scaled_top(secondary_max),
        })
    }
}

/// `HEADROOM * max`; an all-zero metric still gets a drawable `[0, 1]` axis
fn scaled_top(max: f64) -> f64 {
    nonzero(max * HEADROOM)
}

fn nonzero(top: f64) -> f64 {
    if top > 0.0 && top.is_finite() {
        top
    } else {
        1.0
    }
}

/// Render `series` to `path`; the image format follows the file extension
pub fn render_chart(path: &Path, series: &Series, options: &ChartOptions) -> Result<ChartOutcome> {
    let layout = match ChartLayout::for_series(series, options) {
        Some(layout) => layout,
        None => {
            log::warn!("No samples collected, not writing {}", path.display());
            return Ok(ChartOutcome::SkippedEmpty);
        }
    };

    let is_svg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    let drawn = if is_svg {
        let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
        draw(&root, series, &layout, options).map_err(|e| e.to_string())
    } else {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        draw(&root, series, &layout, options).map_err(|e| e.to_string())
    };
    drawn.map_err(MonitorError::Chart)?;

    log::debug!("Chart with {} samples written to {}", series.len(), path.display());
    Ok(ChartOutcome::Rendered)
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &Series,
    layout: &ChartLayout,
    options: &ChartOptions,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(layout.time.clone(), layout.cpu.clone())?
        .set_secondary_coord(layout.time.clone(), layout.secondary.clone());

    chart
        .configure_mesh()
        .x_desc("time (s)")
        .y_desc("CPU (%)")
        .draw()?;

    let secondary_desc = if options.include_io {
        "(MB)"
    } else {
        "Real Memory (MB)"
    };
    chart
        .configure_secondary_axes()
        .y_desc(secondary_desc)
        .draw()?;

    chart
        .draw_series(LineSeries::new(points(series, |s| s.cpu_percent), &RED))?
        .label("CPU (%)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .draw_secondary_series(LineSeries::new(points(series, |s| s.resident_mb), &BLUE))?
        .label("RAM (MB)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    if options.include_io {
        chart
            .draw_secondary_series(LineSeries::new(points(series, |s| s.io_read_mb), &GREEN))?
            .label("I/O Read (MB)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));

        chart
            .draw_secondary_series(LineSeries::new(
                points(series, |s| s.io_write_mb),
                &MAGENTA,
            ))?
            .label("I/O Write (MB)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MAGENTA));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

fn points(series: &Series, metric: impl Fn(&Sample) -> f64) -> Vec<(f64, f64)> {
    series.iter().map(|s| (s.elapsed_secs, metric(s))).collect()
}

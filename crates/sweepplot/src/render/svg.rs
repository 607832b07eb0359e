use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use sweepplot_core::{Chart, ChartSink};

use super::RenderError;

/// Default image size in pixels
pub const DEFAULT_SIZE: (u32, u32) = (1024, 768);

/// Writes a chart to a single SVG file
pub struct SvgSink {
    path: PathBuf,
    size: (u32, u32),
}

impl SvgSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: DEFAULT_SIZE,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChartSink for SvgSink {
    type Error = RenderError;

    fn render(&mut self, chart: &Chart) -> Result<(), RenderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
        draw_chart(&root, chart).map_err(|e| RenderError::Draw(e.to_string()))?;
        tracing::info!(path = %self.path.display(), title = %chart.title, "Wrote chart");
        Ok(())
    }
}

/// Axis ranges with a margin around the data. Categorical charts span
/// half a slot either side of the first and last tick.
fn ranges(chart: &Chart) -> (Range<f64>, Range<f64>) {
    fn padded(lo: f64, hi: f64) -> Range<f64> {
        let span = hi - lo;
        if span.abs() < 1e-12 {
            let pad = if lo.abs() < 1e-12 { 1.0 } else { lo.abs() * 0.1 };
            (lo - pad)..(hi + pad)
        } else {
            (lo - span * 0.05)..(hi + span * 0.05)
        }
    }

    let ((x0, x1), (y0, y1)) = chart.bounds().unwrap_or(((0.0, 1.0), (0.0, 1.0)));
    let x = if chart.x_ticks.is_empty() {
        padded(x0, x1)
    } else {
        -0.5..(chart.x_ticks.len() as f64 - 0.5)
    };
    (x, padded(y0, y1))
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (x_range, y_range) = ranges(chart);
    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    let ticks = &chart.x_ticks;
    let tick_label = |x: &f64| -> String {
        let slot = x.round();
        if (x - slot).abs() > 1e-6 || slot < 0.0 {
            return String::new();
        }
        ticks.get(slot as usize).cloned().unwrap_or_default()
    };

    let mut mesh = ctx.configure_mesh();
    mesh.x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str());
    if !ticks.is_empty() {
        mesh.x_labels(ticks.len() + 1).x_label_formatter(&tick_label);
    }
    mesh.draw()?;

    for (i, series) in chart.series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();

        // Gaps split a series into separately drawn runs
        let mut labeled = false;
        for segment in series.segments() {
            let line = ctx.draw_series(LineSeries::new(
                segment.iter().map(|p| (p.x, p.y)),
                color.stroke_width(2),
            ))?;
            if !labeled {
                line.label(series.label.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
                labeled = true;
            }
        }

        ctx.draw_series(series.present().map(|p| {
            ErrorBar::new_vertical(
                p.x,
                p.y - p.y_std_err,
                p.y,
                p.y + p.y_std_err,
                color.filled(),
                6,
            )
        }))?;
        ctx.draw_series(
            series
                .present()
                .map(|p| Circle::new((p.x, p.y), 3, color.filled())),
        )?;
    }

    if !chart.is_empty() {
        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

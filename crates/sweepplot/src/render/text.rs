use std::io::Write;

use sweepplot_core::{Chart, ChartSink, XAxis};

use super::RenderError;
use crate::report::{SIGNIFICANT_DIGITS, format_significant};

/// Writes each chart as a block of aligned rows, one per point
pub struct TextSink<W> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartSink for TextSink<W> {
    type Error = RenderError;

    fn render(&mut self, chart: &Chart) -> Result<(), RenderError> {
        writeln!(self.out, "== {} ==", chart.title)?;
        writeln!(self.out, "x: {}  y: {}", chart.x_label, chart.y_label)?;

        let show_x = !matches!(chart.x_axis, XAxis::Categorical);
        for series in &chart.series {
            writeln!(self.out, "{}", series.label)?;
            for point in &series.points {
                let Some(point) = point else {
                    continue;
                };
                let sig = |v: f64| format_significant(v, SIGNIFICANT_DIGITS);
                let position = if show_x {
                    format!("{} (x={})", point.domain_label, sig(point.x))
                } else {
                    point.domain_label.clone()
                };
                writeln!(
                    self.out,
                    "  {position:<24} {:>10} ± {:<10} n={}",
                    sig(point.y),
                    sig(point.y_std_err),
                    point.count
                )?;
            }
            let gaps = series.points.iter().filter(|p| p.is_none()).count();
            if gaps > 0 {
                writeln!(self.out, "  ({gaps} without data)")?;
            }
        }
        writeln!(self.out)?;
        Ok(())
    }
}

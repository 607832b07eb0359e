use std::io::Write;

use sweepplot_core::{Chart, ChartSink};

use super::RenderError;

/// Writes each chart as one pretty-printed JSON document
pub struct JsonSink<W> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartSink for JsonSink<W> {
    type Error = RenderError;

    fn render(&mut self, chart: &Chart) -> Result<(), RenderError> {
        serde_json::to_writer_pretty(&mut self.out, chart)?;
        writeln!(self.out)?;
        Ok(())
    }
}

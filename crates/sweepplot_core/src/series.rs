//! Multi-series chart assembly.
//!
//! A [`SeriesBuilder`] runs one aggregation pass per `plot` call and turns the
//! resulting cells into positioned chart points. The finished [`Chart`] is
//! plain data, handed to whatever [`ChartSink`] renders it.

use serde::Serialize;

use crate::aggregate::{Cell, group, summarize};
use crate::axis::{DomainSpec, Labels, SplitSpec};
use crate::conditions::Conditions;
use crate::error::SpecError;
use crate::model::{Metric, Record, Value};

/// How a cell is positioned horizontally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "metric")]
pub enum XAxis {
    /// Domain values at integer positions, labeled by tick. Plots over
    /// different domains share one tick list: the first domain's values,
    /// then each later value not already present.
    Categorical,
    /// The numeric reading of the domain value
    Parameter,
    /// The per-cell mean of another metric
    Metric(Metric),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    /// Mean of the y metric over the cell
    pub y: f64,
    pub y_std_dev: f64,
    pub y_std_err: f64,
    pub count: usize,
    pub domain_label: String,
}

/// One legend entry. `None` points are gaps and break the line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<Option<ChartPoint>>,
}

impl ChartSeries {
    /// Points with data, in domain order
    pub fn present(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter().flatten()
    }

    /// Runs of consecutive present points; each run is drawn as one line
    #[must_use]
    pub fn segments(&self) -> Vec<Vec<&ChartPoint>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for point in &self.points {
            match point {
                Some(point) => current.push(point),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Everything a renderer needs to draw one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub x_axis: XAxis,
    pub x_label: String,
    pub y_label: String,
    /// Tick labels for categorical charts, at positions 0, 1, 2, ...
    pub x_ticks: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl Chart {
    /// Bounds of all present points as `((x_min, x_max), (y_min, y_max))`
    #[must_use]
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut points = self.series.iter().flat_map(ChartSeries::present);
        let first = points.next()?;
        let init = ((first.x, first.x), (first.y, first.y));
        Some(points.fold(init, |((x0, x1), (y0, y1)), p| {
            ((x0.min(p.x), x1.max(p.x)), (y0.min(p.y), y1.max(p.y)))
        }))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.present().next().is_none())
    }
}

/// Rendering collaborator for finished charts
pub trait ChartSink {
    type Error;

    fn render(&mut self, chart: &Chart) -> Result<(), Self::Error>;
}

/// Accumulates series for one chart.
///
/// The builder is consumed by [`SeriesBuilder::finish`] or
/// [`SeriesBuilder::render`], so a chart is produced at most once.
#[derive(Debug)]
pub struct SeriesBuilder<'a> {
    records: &'a [Record],
    labels: &'a Labels,
    x_axis: XAxis,
    y_metric: Metric,
    title: Option<String>,
    first_domain: Option<DomainSpec>,
    /// Categorical tick values and labels, in axis order
    ticks: Vec<(Value, String)>,
    series: Vec<ChartSeries>,
}

impl<'a> SeriesBuilder<'a> {
    #[must_use]
    pub fn new(records: &'a [Record], labels: &'a Labels, x_axis: XAxis, y_metric: Metric) -> Self {
        Self {
            records,
            labels,
            x_axis,
            y_metric,
            title: None,
            first_domain: None,
            ticks: Vec::new(),
            series: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Aggregate over `domain` and append one series per split value (or a
    /// single series without a split).
    pub fn plot(
        &mut self,
        domain: &DomainSpec,
        conditions: &Conditions,
        split: Option<&SplitSpec>,
        label: Option<&str>,
    ) -> &mut Self {
        if self.first_domain.is_none() {
            self.first_domain = Some(domain.clone());
        }
        for (value, label) in domain.values().iter().zip(domain.labels()) {
            if !self.ticks.iter().any(|(tick, _)| tick == value) {
                self.ticks.push((value.clone(), label.clone()));
            }
        }

        let split_labels: Vec<Option<&str>> = match split {
            Some(split) => split.labels().iter().map(|l| Some(l.as_str())).collect(),
            None => vec![None],
        };

        let rows = group(self.records, domain, split, conditions);
        for (row, split_label) in rows.iter().zip(split_labels) {
            let points = row
                .iter()
                .enumerate()
                .map(|(position, cell)| self.point(domain, position, cell))
                .collect();
            let label = self.legend(label, split_label);
            self.series.push(ChartSeries { label, points });
        }
        self
    }

    /// A single extra line over the first plotted domain, not broken out by
    /// any split.
    pub fn extra_line(&mut self, label: &str, conditions: &Conditions) -> Result<&mut Self, SpecError> {
        let domain = self.first_domain.clone().ok_or(SpecError::NoDomain)?;
        Ok(self.plot(&domain, conditions, None, Some(label)))
    }

    /// An alternate split family over the first plotted domain
    pub fn extra_split(
        &mut self,
        label: &str,
        split: &SplitSpec,
        conditions: &Conditions,
    ) -> Result<&mut Self, SpecError> {
        let domain = self.first_domain.clone().ok_or(SpecError::NoDomain)?;
        Ok(self.plot(&domain, conditions, Some(split), Some(label)))
    }

    #[must_use]
    pub fn finish(self) -> Chart {
        let y_label = self.labels.label(self.y_metric.name());
        let (x_label, x_ticks) = match (self.x_axis, &self.first_domain) {
            (XAxis::Metric(metric), _) => (self.labels.label(metric.name()), Vec::new()),
            (XAxis::Categorical, Some(domain)) => (
                domain.title().to_string(),
                self.ticks.iter().map(|(_, label)| label.clone()).collect(),
            ),
            (XAxis::Parameter, Some(domain)) => (domain.title().to_string(), Vec::new()),
            (_, None) => (String::new(), Vec::new()),
        };
        let title = self.title.unwrap_or_else(|| {
            if x_label.is_empty() {
                y_label.clone()
            } else {
                format!("{y_label} by {x_label}")
            }
        });
        Chart {
            title,
            x_axis: self.x_axis,
            x_label,
            y_label,
            x_ticks,
            series: self.series,
        }
    }

    /// Finish the chart and hand it to `sink`
    pub fn render<S: ChartSink>(self, sink: &mut S) -> Result<(), S::Error> {
        let chart = self.finish();
        sink.render(&chart)
    }

    fn point(&self, domain: &DomainSpec, position: usize, cell: &Cell<'_>) -> Option<ChartPoint> {
        let summary = summarize(&cell.records, self.y_metric)?;
        let x = match self.x_axis {
            XAxis::Categorical => self
                .ticks
                .iter()
                .position(|(tick, _)| tick == cell.domain_value)? as f64,
            XAxis::Parameter => cell.domain_value.as_f64()?,
            XAxis::Metric(metric) => summarize(&cell.records, metric)?.mean,
        };
        Some(ChartPoint {
            x,
            y: summary.mean,
            y_std_dev: summary.std_dev,
            y_std_err: summary.std_err(),
            count: summary.count,
            domain_label: domain.labels()[position].clone(),
        })
    }

    fn legend(&self, label: Option<&str>, split_label: Option<&str>) -> String {
        match (label, split_label) {
            (Some(label), Some(split)) => format!("{label}, {split}"),
            (Some(label), None) => label.to_string(),
            (None, Some(split)) => split.to_string(),
            (None, None) => self.labels.average().to_string(),
        }
    }
}

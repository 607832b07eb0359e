//! Grouping and summary statistics.
//!
//! Records are grouped into cells, one per (domain value × split value), by
//! filtering the whole record set once per cell. The sweep space is small and
//! loading dominates, so groups are fully materialized.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::axis::{DomainSpec, SplitSpec};
use crate::conditions::{Condition, Conditions};
use crate::model::{Metric, Record, Value};

/// Mean and spread of one metric over a non-empty group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); 0.0 for a single value
    pub std_dev: f64,
}

impl Summary {
    /// `None` for an empty slice
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if count > 1 {
            let squared: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squared / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Some(Self {
            count,
            mean,
            std_dev,
        })
    }

    /// Standard error of the mean
    #[must_use]
    pub fn std_err(&self) -> f64 {
        self.std_dev / (self.count as f64).sqrt()
    }
}

/// Summary of `metric` over the records that carry it
#[must_use]
pub fn summarize(records: &[&Record], metric: Metric) -> Option<Summary> {
    let values: Vec<f64> = records.iter().filter_map(|r| r.metric(metric)).collect();
    Summary::from_values(&values)
}

/// One cell of an aggregated series. `summary` is `None` when no record
/// matched, which is distinct from a zero mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPoint {
    pub domain_value: Value,
    pub split_value: Option<Value>,
    pub summary: Option<Summary>,
}

impl AggregatedPoint {
    #[must_use]
    pub fn count(&self) -> usize {
        self.summary.map_or(0, |s| s.count)
    }

    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        self.summary.map(|s| s.mean)
    }

    #[must_use]
    pub fn is_gap(&self) -> bool {
        self.summary.is_none()
    }
}

/// Points for one split value, in domain order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub split_value: Option<Value>,
    pub points: Vec<AggregatedPoint>,
}

impl Series {
    #[must_use]
    pub fn means(&self) -> Vec<Option<f64>> {
        self.points.iter().map(AggregatedPoint::mean).collect()
    }
}

/// Records of one (domain value, split value) group
#[derive(Debug, Clone)]
pub struct Cell<'a> {
    pub domain_value: &'a Value,
    pub split_value: Option<&'a Value>,
    pub records: Vec<&'a Record>,
}

/// Group records into cells: one row per split value (a single row without a
/// split), each row in domain order.
#[must_use]
pub fn group<'a>(
    records: &'a [Record],
    domain: &'a DomainSpec,
    split: Option<&'a SplitSpec>,
    conditions: &Conditions,
) -> Vec<Vec<Cell<'a>>> {
    let split_values: Vec<Option<&'a Value>> = match split {
        Some(split) => split.values().iter().map(Some).collect(),
        None => vec![None],
    };

    let keys: Vec<CellKey<'a>> = split_values
        .iter()
        .flat_map(|split_value| domain.values().iter().map(move |d| (*split_value, d)))
        .collect();

    #[cfg(feature = "parallel")]
    let mut cells: Vec<Cell<'a>> = keys
        .par_iter()
        .map(|key| build_cell(records, domain, split, conditions, key))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let mut cells = build_cells_sequential(records, domain, split, conditions, &keys);

    let row_len = domain.len();
    let mut rows = Vec::with_capacity(split_values.len());
    for _ in 0..split_values.len() {
        let rest = cells.split_off(row_len.min(cells.len()));
        rows.push(cells);
        cells = rest;
    }
    rows
}

type CellKey<'a> = (Option<&'a Value>, &'a Value);

fn build_cell<'a>(
    records: &'a [Record],
    domain: &DomainSpec,
    split: Option<&SplitSpec>,
    conditions: &Conditions,
    (split_value, domain_value): &CellKey<'a>,
) -> Cell<'a> {
    let mut effective = conditions.clone();
    effective.push(Condition::equals(domain.name(), (*domain_value).clone()));
    if let (Some(split), Some(value)) = (split, split_value) {
        effective.push(Condition::equals(split.name(), (*value).clone()));
    }
    Cell {
        domain_value: *domain_value,
        split_value: *split_value,
        records: effective.filter(records),
    }
}

#[cfg(any(test, not(feature = "parallel")))]
fn build_cells_sequential<'a>(
    records: &'a [Record],
    domain: &DomainSpec,
    split: Option<&SplitSpec>,
    conditions: &Conditions,
    keys: &[CellKey<'a>],
) -> Vec<Cell<'a>> {
    keys.iter()
        .map(|key| build_cell(records, domain, split, conditions, key))
        .collect()
}

/// Aggregate `metric` over domain × split cells.
///
/// Returns one series per split value in split order, or a single series
/// with no split value when `split` is `None`.
#[must_use]
pub fn aggregate(
    records: &[Record],
    metric: Metric,
    domain: &DomainSpec,
    split: Option<&SplitSpec>,
    conditions: &Conditions,
) -> Vec<Series> {
    let split_values: Vec<Option<Value>> = match split {
        Some(split) => split.values().iter().cloned().map(Some).collect(),
        None => vec![None],
    };

    let series: Vec<Series> = group(records, domain, split, conditions)
        .into_iter()
        .zip(split_values)
        .map(|(row, split_value)| {
            let points = row
                .into_iter()
                .map(|cell| AggregatedPoint {
                    domain_value: cell.domain_value.clone(),
                    split_value: cell.split_value.cloned(),
                    summary: summarize(&cell.records, metric),
                })
                .collect();
            Series {
                split_value,
                points,
            }
        })
        .collect();

    let gaps = series
        .iter()
        .flat_map(|s| &s.points)
        .filter(|p| p.is_gap())
        .count();
    if gaps > 0 {
        tracing::debug!(
            metric = %metric,
            domain = domain.name(),
            conditions = %conditions,
            gaps,
            "aggregation has cells without data"
        );
    }
    series
}

/// Statistics for several metrics under one fixed condition set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub conditions: Conditions,
    /// Number of records that satisfied the conditions
    pub matched: usize,
    pub metrics: Vec<(Metric, Option<Summary>)>,
}

impl Evaluation {
    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<Summary> {
        self.metrics
            .iter()
            .find(|(m, _)| *m == metric)
            .and_then(|(_, summary)| *summary)
    }
}

/// Summaries of `metrics` over all records matching `conditions`, without
/// any grouping. Used for single rows of comparison tables.
#[must_use]
pub fn evaluate(records: &[Record], metrics: &[Metric], conditions: &Conditions) -> Evaluation {
    let matched = conditions.filter(records);
    Evaluation {
        conditions: conditions.clone(),
        matched: matched.len(),
        metrics: metrics
            .iter()
            .map(|&metric| (metric, summarize(&matched, metric)))
            .collect(),
    }
}

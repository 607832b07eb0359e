//! Experiment records and the metrics they carry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Params;

/// Scalar outcome measured for each run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    /// Sum of the four cost components
    Cost,
    CostEfficiency,
    CostSafety,
    CostAccel,
    CostSteer,
    Efficiency,
    /// Proportion of unsafe steps
    Safety,
    /// Uncomfortable decelerations
    UncomfortableDecels,
    /// Curvature change
    CurvatureChange,
    MeanTime,
    P95Time,
    P997Time,
    MaxTime,
    StdDevTime,
}

impl Metric {
    pub const ALL: [Metric; 14] = [
        Metric::Cost,
        Metric::CostEfficiency,
        Metric::CostSafety,
        Metric::CostAccel,
        Metric::CostSteer,
        Metric::Efficiency,
        Metric::Safety,
        Metric::UncomfortableDecels,
        Metric::CurvatureChange,
        Metric::MeanTime,
        Metric::P95Time,
        Metric::P997Time,
        Metric::MaxTime,
        Metric::StdDevTime,
    ];

    /// Name used in the cache tooling, filters and label tables
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Metric::Cost => "cost",
            Metric::CostEfficiency => "cost.efficiency",
            Metric::CostSafety => "cost.safety",
            Metric::CostAccel => "cost.accel",
            Metric::CostSteer => "cost.steer",
            Metric::Efficiency => "efficiency",
            Metric::Safety => "safety",
            Metric::UncomfortableDecels => "ud",
            Metric::CurvatureChange => "cc",
            Metric::MeanTime => "mean_ts",
            Metric::P95Time => "95_ts",
            Metric::P997Time => "997_ts",
            Metric::MaxTime => "max_ts",
            Metric::StdDevTime => "stddev_ts",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name() == s)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

impl TryFrom<String> for Metric {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Metric> for String {
    fn from(metric: Metric) -> Self {
        metric.name().to_string()
    }
}

/// The four weighted cost terms reported per run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub efficiency: f64,
    pub safety: f64,
    pub accel: f64,
    pub steer: f64,
}

impl CostBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.efficiency + self.safety + self.accel + self.steer
    }
}

/// Planner computation time statistics; only the mean is guaranteed present
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingStats {
    pub mean: f64,
    pub p95: Option<f64>,
    pub p997: Option<f64>,
    pub max: Option<f64>,
    pub std_dev: Option<f64>,
}

/// All metrics of one run. The total cost is derived once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    cost: CostBreakdown,
    total_cost: f64,
    efficiency: f64,
    safety: f64,
    uncomfortable_decels: f64,
    curvature_change: f64,
    timing: TimingStats,
}

impl Metrics {
    /// Number of metric fields that must be present on a cache line
    pub const REQUIRED_FIELDS: usize = 9;
    /// Number of metric fields a complete cache line carries
    pub const ALL_FIELDS: usize = 13;

    #[must_use]
    pub fn new(
        cost: CostBreakdown,
        efficiency: f64,
        safety: f64,
        uncomfortable_decels: f64,
        curvature_change: f64,
        timing: TimingStats,
    ) -> Self {
        Self {
            cost,
            total_cost: cost.total(),
            efficiency,
            safety,
            uncomfortable_decels,
            curvature_change,
            timing,
        }
    }

    /// Build from the numeric fields of a cache line, in file order:
    /// four costs, efficiency, safety, ud, cc, then the timing statistics.
    ///
    /// Returns `None` when fewer than [`Self::REQUIRED_FIELDS`] are given.
    #[must_use]
    pub fn from_fields(fields: &[f64]) -> Option<Self> {
        if fields.len() < Self::REQUIRED_FIELDS {
            return None;
        }
        let optional = |i: usize| fields.get(i).copied();
        Some(Self::new(
            CostBreakdown {
                efficiency: fields[0],
                safety: fields[1],
                accel: fields[2],
                steer: fields[3],
            },
            fields[4],
            fields[5],
            fields[6],
            fields[7],
            TimingStats {
                mean: fields[8],
                p95: optional(9),
                p997: optional(10),
                max: optional(11),
                std_dev: optional(12),
            },
        ))
    }

    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cost => Some(self.total_cost),
            Metric::CostEfficiency => Some(self.cost.efficiency),
            Metric::CostSafety => Some(self.cost.safety),
            Metric::CostAccel => Some(self.cost.accel),
            Metric::CostSteer => Some(self.cost.steer),
            Metric::Efficiency => Some(self.efficiency),
            Metric::Safety => Some(self.safety),
            Metric::UncomfortableDecels => Some(self.uncomfortable_decels),
            Metric::CurvatureChange => Some(self.curvature_change),
            Metric::MeanTime => Some(self.timing.mean),
            Metric::P95Time => self.timing.p95,
            Metric::P997Time => self.timing.p997,
            Metric::MaxTime => self.timing.max,
            Metric::StdDevTime => self.timing.std_dev,
        }
    }

    #[must_use]
    pub fn cost(&self) -> &CostBreakdown {
        &self.cost
    }

    #[must_use]
    pub fn timing(&self) -> &TimingStats {
        &self.timing
    }
}

/// One experiment outcome. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    params: Params,
    metrics: Metrics,
}

impl Record {
    #[must_use]
    pub fn new(params: Params, metrics: Metrics) -> Self {
        Self { params, metrics }
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.params.iter() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{key}={value}")?;
        }
        for metric in Metric::ALL {
            if let Some(value) = self.metric(metric) {
                write!(f, " {metric}={value}")?;
            }
        }
        Ok(())
    }
}

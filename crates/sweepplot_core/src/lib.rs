//! Post-processing engine for parameter-sweep simulation results
//!
//! This crate turns a flat results cache, one line per simulation run, into
//! grouped summary statistics and chart-ready series. It supports:
//! - Decoding the compact `key=value,...` parameter token of each run
//! - Filtering runs with exact-match and inclusive range conditions
//! - Grouping by an ordered x-axis domain and an optional series split
//! - Mean / sample standard deviation per group, with explicit empty groups
//! - Assembling multi-series charts with overlay lines for a rendering sink
//!
//! # Example
//!
//! ```ignore
//! use sweepplot_core::{Conditions, DomainSpec, Labels, Metric, SeriesBuilder, SplitSpec, XAxis};
//!
//! let report = sweepplot_core::load_cache("results.cache".as_ref())?;
//! let labels = Labels::new().with("true", "CFB").with("false", "Normal");
//! let domain = DomainSpec::new("samples_n", [2, 4, 8, 16, 32], &labels)?;
//! let split = SplitSpec::new("use_cfb", ["false", "true"], &labels)?;
//! let filters = Conditions::from_pairs([("method", "eudm"), ("max.rng_seed", "2047")])?;
//!
//! let mut builder = SeriesBuilder::new(&report.records, &labels, XAxis::Categorical, Metric::Cost);
//! builder.plot(&domain, &filters, Some(&split), None);
//! let chart = builder.finish();
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod aggregate;
pub mod axis;
pub mod conditions;
pub mod error;
pub mod loader;
pub mod query;
pub mod series;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use aggregate::{AggregatedPoint, Evaluation, Series, Summary, aggregate, evaluate};
pub use axis::{DomainSpec, Labels, SplitSpec};
pub use conditions::{Condition, Conditions};
pub use error::{LineError, LoadError, ParamError, SpecError};
pub use loader::{LoadReport, load_cache, read_cache};
pub use model::{Metric, Metrics, Params, Record, Value};
pub use query::{ParameterInventory, parameter_values, worst};
pub use series::{Chart, ChartPoint, ChartSeries, ChartSink, SeriesBuilder, XAxis};

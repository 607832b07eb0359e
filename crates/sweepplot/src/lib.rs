//! Command-line front end for `sweepplot_core`
//!
//! Loads a results cache, runs named analysis recipes from a YAML file (or
//! the built-in set) and writes charts as SVG, text or JSON, plus diagnostic
//! summaries and table rows on stdout.

#![warn(clippy::all)]

pub mod commands;
pub mod logging;
pub mod recipes;
pub mod render;
pub mod report;

pub use commands::{Cli, Command, execute, run};
pub use logging::init_logging;

//! Core data types: parameter values, parameter sets and experiment records.

mod params;
mod record;
mod value;

pub use params::*;
pub use record::*;
pub use value::*;

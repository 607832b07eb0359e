//! Integration tests for the sweep post-processing engine
//!
//! Tests are organized by topic:
//! - `scenarios` - Cache loading through to aggregated series and summary rows
//! - `properties` - Randomized checks of filtering and the parameter codec

mod properties;

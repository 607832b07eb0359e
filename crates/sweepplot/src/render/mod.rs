//! Chart sinks: SVG files, plain-text tables and JSON.

mod json;
mod svg;
mod text;

use std::fmt;

pub use json::JsonSink;
pub use svg::SvgSink;
pub use text::TextSink;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One SVG file per chart
    #[default]
    Svg,
    /// Tables on stdout
    Text,
    /// Chart data as JSON on stdout
    Json,
}

#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    Draw(String),
    Json(serde_json::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "failed to write chart: {e}"),
            RenderError::Draw(e) => write!(f, "failed to draw chart: {e}"),
            RenderError::Json(e) => write!(f, "failed to serialize chart: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(e) => Some(e),
            RenderError::Json(e) => Some(e),
            RenderError::Draw(_) => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Json(err)
    }
}

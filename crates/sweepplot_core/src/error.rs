use std::fmt;
use std::path::PathBuf;

/// Errors from decoding or encoding a parameter-assignment token
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// A `=value` segment with nothing before the `=`
    EmptyKey { segment: String },
    /// A bare list item with no preceding `key=` segment to attach to
    MissingKey { segment: String },
    /// A key or value containing a delimiter or whitespace
    Unencodable { key: String, reason: &'static str },
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::EmptyKey { segment } => write!(f, "empty parameter key in '{segment}'"),
            ParamError::MissingKey { segment } => {
                write!(f, "value '{segment}' has no parameter key")
            }
            ParamError::Unencodable { key, reason } => {
                write!(f, "parameter '{key}' cannot be encoded: {reason}")
            }
        }
    }
}

impl std::error::Error for ParamError {}

/// Errors building conditions, domains and splits
#[derive(Debug, Clone, PartialEq)]
pub enum SpecError {
    /// The same value appears twice in a domain or split
    DuplicateValue { name: String, value: String },
    /// A range bound that has no numeric reading
    NonNumericBound { key: String, bound: String },
    /// A condition string without `=`
    MalformedCondition(String),
    /// A parameter or condition with an empty name
    EmptyName,
    /// An overlay was requested before any domain was plotted
    NoDomain,
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::DuplicateValue { name, value } => {
                write!(f, "value '{value}' listed more than once for '{name}'")
            }
            SpecError::NonNumericBound { key, bound } => {
                write!(f, "bound '{bound}' for '{key}' is not a number")
            }
            SpecError::MalformedCondition(text) => {
                write!(f, "condition '{text}' is not of the form key=value")
            }
            SpecError::EmptyName => write!(f, "parameter name is empty"),
            SpecError::NoDomain => write!(f, "no domain has been plotted yet"),
        }
    }
}

impl std::error::Error for SpecError {}

/// Reasons a single cache line is skipped
#[derive(Debug, Clone, PartialEq)]
pub enum LineError {
    TooFewFields { found: usize },
    BadNumber { field: usize, text: String },
    Params(ParamError),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::TooFewFields { found } => write!(f, "only {found} fields"),
            LineError::BadNumber { field, text } => {
                write!(f, "field {field} is not a number: '{text}'")
            }
            LineError::Params(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LineError::Params(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParamError> for LineError {
    fn from(err: ParamError) -> Self {
        LineError::Params(err)
    }
}

/// Fatal errors while loading a results cache
#[derive(Debug)]
pub enum LoadError {
    Io {
        path: Option<PathBuf>,
        source: std::io::Error,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io {
                path: Some(path),
                source,
            } => write!(f, "failed to read {}: {source}", path.display()),
            LoadError::Io { path: None, source } => write!(f, "failed to read cache: {source}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(source: std::io::Error) -> Self {
        LoadError::Io { path: None, source }
    }
}

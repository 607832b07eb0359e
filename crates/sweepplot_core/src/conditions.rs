//! Record filters.
//!
//! A [`Conditions`] set is an AND of tagged [`Condition`]s. The textual pair
//! form used in recipe files (`("max.rng_seed", 2047)`) is resolved to a tag
//! once, when the condition is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::model::{Params, Record, Value};

/// Key prefix selecting an inclusive upper bound
pub const AT_MOST_PREFIX: &str = "max.";
/// Key prefix selecting an inclusive lower bound
pub const AT_LEAST_PREFIX: &str = "min.";

/// A single constraint on a record's parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(String, Value)", into = "(String, Value)")]
pub enum Condition {
    /// Canonical equality
    Equals { key: String, value: Value },
    /// Inclusive numeric upper bound
    AtMost { key: String, bound: f64 },
    /// Inclusive numeric lower bound
    AtLeast { key: String, bound: f64 },
}

impl Condition {
    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn at_most(key: impl Into<String>, bound: f64) -> Self {
        Condition::AtMost {
            key: key.into(),
            bound,
        }
    }

    pub fn at_least(key: impl Into<String>, bound: f64) -> Self {
        Condition::AtLeast {
            key: key.into(),
            bound,
        }
    }

    /// Build from the `(key, value)` pair dialect.
    ///
    /// `max.<key>` and `min.<key>` become range bounds and need a numeric
    /// value; any other key is an equality test.
    pub fn from_pair(key: &str, value: Value) -> Result<Self, SpecError> {
        let bounded = |inner: &str, make: fn(String, f64) -> Condition| {
            if inner.is_empty() {
                return Err(SpecError::EmptyName);
            }
            let bound = value.as_f64().ok_or_else(|| SpecError::NonNumericBound {
                key: inner.to_string(),
                bound: value.to_string(),
            })?;
            Ok(make(inner.to_string(), bound))
        };

        if let Some(inner) = key.strip_prefix(AT_MOST_PREFIX) {
            bounded(inner, |key, bound| Condition::AtMost { key, bound })
        } else if let Some(inner) = key.strip_prefix(AT_LEAST_PREFIX) {
            bounded(inner, |key, bound| Condition::AtLeast { key, bound })
        } else if key.is_empty() {
            Err(SpecError::EmptyName)
        } else {
            Ok(Condition::equals(key, value))
        }
    }

    /// The parameter this condition inspects
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Condition::Equals { key, .. }
            | Condition::AtMost { key, .. }
            | Condition::AtLeast { key, .. } => key,
        }
    }

    /// Missing parameters and values without a numeric reading never match.
    #[must_use]
    pub fn matches(&self, params: &Params) -> bool {
        match self {
            Condition::Equals { key, value } => params.get(key).is_some_and(|v| v == value),
            Condition::AtMost { key, bound } => params
                .get(key)
                .and_then(Value::as_f64)
                .is_some_and(|v| v <= *bound),
            Condition::AtLeast { key, bound } => params
                .get(key)
                .and_then(Value::as_f64)
                .is_some_and(|v| v >= *bound),
        }
    }

    fn to_pair(&self) -> (String, Value) {
        match self {
            Condition::Equals { key, value } => (key.clone(), value.clone()),
            Condition::AtMost { key, bound } => (format!("{AT_MOST_PREFIX}{key}"), Value::Num(*bound)),
            Condition::AtLeast { key, bound } => {
                (format!("{AT_LEAST_PREFIX}{key}"), Value::Num(*bound))
            }
        }
    }
}

impl TryFrom<(String, Value)> for Condition {
    type Error = SpecError;

    fn try_from((key, value): (String, Value)) -> Result<Self, Self::Error> {
        Condition::from_pair(&key, value)
    }
}

impl From<Condition> for (String, Value) {
    fn from(condition: Condition) -> Self {
        condition.to_pair()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (key, value) = self.to_pair();
        write!(f, "{key}={value}")
    }
}

/// Parses `key=value`, e.g. from a command line `--where` argument
impl FromStr for Condition {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| SpecError::MalformedCondition(s.to_string()))?;
        Condition::from_pair(key.trim(), Value::parse_scalar(raw.trim()))
    }
}

/// AND-combined conditions. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs in the prefix dialect
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, SpecError>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .map(|(key, value)| Condition::from_pair(key.as_ref(), value.into()))
            .collect()
    }

    /// Append a condition (builder style)
    #[must_use]
    pub fn with(mut self, condition: Condition) -> Self {
        self.0.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.0.push(condition);
    }

    /// A new set holding `self` followed by `other`
    #[must_use]
    pub fn and(&self, other: &Conditions) -> Conditions {
        let mut combined = self.0.clone();
        combined.extend(other.0.iter().cloned());
        Conditions(combined)
    }

    /// True when every condition holds; stops at the first failure
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_params(record.params())
    }

    #[must_use]
    pub fn matches_params(&self, params: &Params) -> bool {
        self.0.iter().all(|condition| condition.matches(params))
    }

    /// All matching records, in their original order
    #[must_use]
    pub fn filter<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|record| self.matches(record)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Condition> for Conditions {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Conditions(iter.into_iter().collect())
    }
}

impl From<Vec<Condition>> for Conditions {
    fn from(conditions: Vec<Condition>) -> Self {
        Conditions(conditions)
    }
}

impl fmt::Display for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(all)");
        }
        for (i, condition) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{condition}")?;
        }
        Ok(())
    }
}

/// Free-function form of [`Conditions::matches`]
#[must_use]
pub fn matches(record: &Record, conditions: &Conditions) -> bool {
    conditions.matches(record)
}

/// Free-function form of [`Conditions::filter`]
#[must_use]
pub fn filter<'a>(records: &'a [Record], conditions: &Conditions) -> Vec<&'a Record> {
    conditions.filter(records)
}

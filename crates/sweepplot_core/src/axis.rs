//! Chart domains, series splits and the label table used to display them.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::SpecError;
use crate::model::Value;

/// Display label used for a series with neither a label nor a split
pub const DEFAULT_AVERAGE_LABEL: &str = "Average";

/// Translation table from raw tokens (parameter names, values, metric names)
/// to display strings. Unknown tokens display as themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    entries: FxHashMap<String, String>,
    average: String,
}

fn default_average() -> String {
    DEFAULT_AVERAGE_LABEL.to_string()
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
            average: default_average(),
        }
    }
}

impl Labels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a translation (builder style)
    #[must_use]
    pub fn with(mut self, token: impl Into<String>, label: impl Into<String>) -> Self {
        self.insert(token, label);
        self
    }

    pub fn insert(&mut self, token: impl Into<String>, label: impl Into<String>) {
        self.entries.insert(token.into(), label.into());
    }

    /// Override the label shown for an unsplit, unlabeled series
    pub fn set_average(&mut self, label: impl Into<String>) {
        self.average = label.into();
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    /// Display string for a token, falling back to the token itself
    #[must_use]
    pub fn label(&self, token: &str) -> String {
        self.get(token).unwrap_or(token).to_string()
    }

    #[must_use]
    pub fn value_label(&self, value: &Value) -> String {
        self.label(&value.canonical())
    }

    #[must_use]
    pub fn average(&self) -> &str {
        &self.average
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut labels = Labels::new();
        for (token, label) in iter {
            labels.insert(token, label);
        }
        labels
    }
}

/// Ordered, duplicate-free values of one parameter with their display labels
#[derive(Debug, Clone, PartialEq, Serialize)]
struct LabeledValues {
    name: String,
    title: String,
    values: Vec<Value>,
    labels: Vec<String>,
}

impl LabeledValues {
    fn new(name: String, values: Vec<Value>, labels: &Labels) -> Result<Self, SpecError> {
        if name.is_empty() {
            return Err(SpecError::EmptyName);
        }
        for (i, value) in values.iter().enumerate() {
            if values[..i].contains(value) {
                return Err(SpecError::DuplicateValue {
                    name,
                    value: value.to_string(),
                });
            }
        }
        Ok(Self {
            title: labels.label(&name),
            labels: values.iter().map(|v| labels.value_label(v)).collect(),
            name,
            values,
        })
    }
}

/// The x-axis domain of a chart (the primary grouping key).
///
/// Value order is the axis order and is never re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DomainSpec(LabeledValues);

impl DomainSpec {
    pub fn new<V: Into<Value>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
        labels: &Labels,
    ) -> Result<Self, SpecError> {
        let values = values.into_iter().map(Into::into).collect();
        LabeledValues::new(name.into(), values, labels).map(DomainSpec)
    }

    /// Parameter key
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Display label of the parameter itself
    #[must_use]
    pub fn title(&self) -> &str {
        &self.0.title
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.0.values
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.0.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values.is_empty()
    }
}

/// A secondary grouping key; each value becomes its own labeled series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SplitSpec(LabeledValues);

impl SplitSpec {
    pub fn new<V: Into<Value>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
        labels: &Labels,
    ) -> Result<Self, SpecError> {
        let values = values.into_iter().map(Into::into).collect();
        LabeledValues::new(name.into(), values, labels).map(SplitSpec)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.0.title
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.0.values
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.0.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Labels {
        Labels::new()
            .with("method", "Method")
            .with("mpdm", "MPDM")
            .with("eudm", "EUDM")
            .with("true", "CFB")
            .with("false", "Normal")
    }

    #[test]
    fn test_label_fallback() {
        let labels = labels();
        assert_eq!(labels.label("mpdm"), "MPDM");
        assert_eq!(labels.label("fixed"), "fixed");
        assert_eq!(labels.value_label(&Value::from(0.5)), "0.5");
        assert_eq!(labels.average(), DEFAULT_AVERAGE_LABEL);
    }

    #[test]
    fn test_domain_keeps_given_order() {
        let domain = DomainSpec::new("samples_n", [32, 2, 8], &labels()).unwrap();
        let values: Vec<String> = domain.values().iter().map(Value::to_string).collect();
        assert_eq!(values, vec!["32", "2", "8"]);
        assert_eq!(domain.title(), "samples_n");
    }

    #[test]
    fn test_domain_labels() {
        let domain = DomainSpec::new("method", ["fixed", "mpdm", "eudm"], &labels()).unwrap();
        assert_eq!(domain.title(), "Method");
        assert_eq!(domain.labels(), ["fixed", "MPDM", "EUDM"]);
    }

    #[test]
    fn test_duplicate_values_rejected() {
        let err = DomainSpec::new("replan_dt", [Value::from(1), Value::from("1.0")], &labels())
            .unwrap_err();
        assert_eq!(
            err,
            SpecError::DuplicateValue {
                name: "replan_dt".to_string(),
                value: "1".to_string()
            }
        );
        assert!(SplitSpec::new("use_cfb", ["false", "false"], &labels()).is_err());
    }

    #[test]
    fn test_split_labels() {
        let split = SplitSpec::new("use_cfb", [false, true], &labels()).unwrap();
        assert_eq!(split.labels(), ["Normal", "CFB"]);
        assert_eq!(split.len(), 2);
    }
}

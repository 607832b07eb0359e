//! Parameter assignments and their compact cache encoding.
//!
//! A run's parameters are stored as one token of `key=value` segments joined
//! with commas, for example
//!
//! ```text
//! ,method=mcts,use_cfb=false,mcts.samples_n=64,extra_ego_accdec_policies=-1,-2,1,2,rng_seed=12,
//! ```
//!
//! Method-specific parameters carry a dotted namespace. A segment without `=`
//! continues the previous value as a list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Value;
use crate::error::ParamError;

/// Separator between segments in an encoded token
pub const SEGMENT_SEPARATOR: char = ',';
/// Separator between a key and its value
pub const KEY_VALUE_SEPARATOR: char = '=';
/// Separator between a namespace and the bare parameter name
pub const NAMESPACE_SEPARATOR: char = '.';

/// The full parameter assignment of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<String, Value>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a cache token
    pub fn parse(token: &str) -> Result<Self, ParamError> {
        let mut params = Params::new();
        let mut pending: Option<(String, Vec<Value>)> = None;

        for segment in token.split(SEGMENT_SEPARATOR) {
            if segment.is_empty() {
                continue;
            }
            match segment.split_once(KEY_VALUE_SEPARATOR) {
                Some((key, raw)) => {
                    if key.is_empty() {
                        return Err(ParamError::EmptyKey {
                            segment: segment.to_string(),
                        });
                    }
                    if let Some((key, items)) = pending.take() {
                        params.insert(key, collapse(items));
                    }
                    pending = Some((key.to_string(), vec![Value::parse_scalar(raw)]));
                }
                None => match pending.as_mut() {
                    Some((_, items)) => items.push(Value::parse_scalar(segment)),
                    None => {
                        return Err(ParamError::MissingKey {
                            segment: segment.to_string(),
                        });
                    }
                },
            }
        }

        if let Some((key, items)) = pending {
            params.insert(key, collapse(items));
        }
        Ok(params)
    }

    /// Encode into the cache token format
    pub fn encode(&self) -> Result<String, ParamError> {
        let mut segments = Vec::with_capacity(self.values.len());
        for (key, value) in &self.values {
            if key.is_empty() {
                return Err(ParamError::Unencodable {
                    key: key.clone(),
                    reason: "empty key",
                });
            }
            check_token(key, key, "key contains ',', '=' or whitespace")?;
            segments.push(format!(
                "{key}{KEY_VALUE_SEPARATOR}{}",
                encode_value(key, value)?
            ));
        }
        Ok(segments.join(","))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Look up a parameter.
    ///
    /// An exact key wins. A bare key (no namespace) also finds a single
    /// namespaced key with that suffix, so `samples_n` matches
    /// `mcts.samples_n`. Ambiguous suffixes find nothing.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }
        if key.contains(NAMESPACE_SEPARATOR) {
            return None;
        }

        let mut found = None;
        for (stored, value) in &self.values {
            let suffix_matches = stored
                .rsplit_once(NAMESPACE_SEPARATOR)
                .is_some_and(|(_, bare)| bare == key);
            if suffix_matches {
                if found.is_some() {
                    return None;
                }
                found = Some(value);
            }
        }
        found
    }

    /// Look up a parameter by its exact stored key
    #[must_use]
    pub fn get_exact(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

fn collapse(mut items: Vec<Value>) -> Value {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Value::List(items)
    }
}

fn encode_value(key: &str, value: &Value) -> Result<String, ParamError> {
    match value {
        Value::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if item.is_list() {
                    return Err(ParamError::Unencodable {
                        key: key.to_string(),
                        reason: "nested lists",
                    });
                }
                let text = item.canonical();
                if text.is_empty() {
                    return Err(ParamError::Unencodable {
                        key: key.to_string(),
                        reason: "empty list item",
                    });
                }
                check_token(key, &text, "list item contains ',', '=' or whitespace")?;
                parts.push(text.into_owned());
            }
            Ok(parts.join(","))
        }
        scalar => {
            let text = scalar.canonical();
            check_token(key, &text, "value contains ',', '=' or whitespace")?;
            Ok(text.into_owned())
        }
    }
}

fn check_token(key: &str, text: &str, reason: &'static str) -> Result<(), ParamError> {
    let reserved = text.chars().any(|c| {
        c == SEGMENT_SEPARATOR || c == KEY_VALUE_SEPARATOR || c.is_whitespace()
    });
    if reserved {
        return Err(ParamError::Unencodable {
            key: key.to_string(),
            reason,
        });
    }
    Ok(())
}

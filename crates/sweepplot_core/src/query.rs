//! Ad hoc diagnostic queries over a record set.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::conditions::Conditions;
use crate::model::{Metric, Record, Value};

/// Which values each parameter takes among the records matching a filter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterInventory {
    pub matched: usize,
    /// Distinct values per parameter key, in first-seen order
    pub values: BTreeMap<String, Vec<Value>>,
}

impl ParameterInventory {
    /// Parameters that take more than one value (the swept ones)
    pub fn swept(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.values
            .iter()
            .filter(|(_, values)| values.len() > 1)
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

/// Inventory of the parameter values used by matching records
#[must_use]
pub fn parameter_values(records: &[Record], conditions: &Conditions) -> ParameterInventory {
    let mut inventory = ParameterInventory::default();
    for record in records.iter().filter(|r| conditions.matches(r)) {
        inventory.matched += 1;
        for (key, value) in record.params().iter() {
            let seen = inventory.values.entry(key.to_string()).or_default();
            if !seen.contains(value) {
                seen.push(value.clone());
            }
        }
    }
    inventory
}

/// The matching record with the largest value of `metric`.
///
/// Ties go to the earliest record. Records without the metric are ignored.
#[must_use]
pub fn worst<'a>(records: &'a [Record], metric: Metric, conditions: &Conditions) -> Option<&'a Record> {
    let mut worst: Option<(&Record, f64)> = None;
    for record in records.iter().filter(|r| conditions.matches(r)) {
        let Some(value) = record.metric(metric) else {
            continue;
        };
        if worst.is_none_or(|(_, current)| value > current) {
            worst = Some((record, value));
        }
    }
    worst.map(|(record, _)| record)
}

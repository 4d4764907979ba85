//! Field-level comparison of configuration values

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One differing field: the resolved value on each side, `None` when the
/// key is absent on that side
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FieldDiff {
    pub left: Option<Value>,
    pub right: Option<Value>,
}

/// Compute a flat, field-level delta between two configuration values
///
/// Walks the union of top-level keys and emits an entry for every key whose
/// resolved values differ. Nested objects are compared by deep equality, not
/// recursively diffed. Non-object inputs contribute no keys. The result is
/// ordered by key, independent of input key order.
#[must_use]
pub fn diff_values(left: &Value, right: &Value) -> BTreeMap<String, FieldDiff> {
    let empty = serde_json::Map::new();
    let left_map = left.as_object().unwrap_or(&empty);
    let right_map = right.as_object().unwrap_or(&empty);

    let keys: BTreeSet<&String> = left_map.keys().chain(right_map.keys()).collect();

    let mut differences = BTreeMap::new();
    for key in keys {
        let left_value = left_map.get(key);
        let right_value = right_map.get(key);
        if left_value != right_value {
            differences.insert(
                key.clone(),
                FieldDiff {
                    left: left_value.cloned(),
                    right: right_value.cloned(),
                },
            );
        }
    }
    differences
}

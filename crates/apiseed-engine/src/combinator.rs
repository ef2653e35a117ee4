//! Example combinator & cache
//!
//! Per-property candidate lists are folded into complete example maps by
//! cross-product. Every fold is capped, so intermediate sets never exceed the
//! combinatorial limit.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::{Map, Value};

use apiseed_core::Schema;

/// Fold one property's candidates into the existing example maps.
///
/// The first property seeds one map per candidate; later properties multiply
/// the existing maps by their candidates. No candidates leaves the maps as
/// they are (the property is omitted).
#[must_use]
pub fn combine_property(
    existing: Vec<Value>,
    key: &str,
    candidates: &[Value],
    cap: usize,
) -> Vec<Value> {
    if candidates.is_empty() {
        return existing;
    }
    if existing.is_empty() {
        return candidates
            .iter()
            .take(cap)
            .map(|candidate| {
                let mut map = Map::new();
                map.insert(key.to_string(), candidate.clone());
                Value::Object(map)
            })
            .collect();
    }

    let mut combined = Vec::with_capacity(existing.len().saturating_mul(candidates.len()).min(cap));
    'outer: for example in &existing {
        for candidate in candidates {
            if combined.len() >= cap {
                tracing::debug!(cap, property = key, "example set truncated");
                break 'outer;
            }
            let mut example = example.clone();
            if let Value::Object(map) = &mut example {
                map.insert(key.to_string(), candidate.clone());
            }
            combined.push(example);
        }
    }
    combined
}

/// Cross-product of two example sets; on key conflicts `right` wins.
#[must_use]
pub fn combine_lists(left: Vec<Value>, right: Vec<Value>, cap: usize) -> Vec<Value> {
    if left.is_empty() {
        return truncate(right, cap);
    }
    if right.is_empty() {
        return truncate(left, cap);
    }

    let mut combined = Vec::new();
    'outer: for l in &left {
        for r in &right {
            if combined.len() >= cap {
                tracing::debug!(cap, "example set truncated");
                break 'outer;
            }
            combined.push(merge_values(l, r));
        }
    }
    combined
}

/// Shallow object merge, `later` winning; a non-object `later` replaces.
#[must_use]
pub fn merge_values(earlier: &Value, later: &Value) -> Value {
    match (earlier, later) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (_, later) => later.clone(),
    }
}

/// Keep the first `cap` examples.
#[must_use]
pub fn truncate(mut examples: Vec<Value>, cap: usize) -> Vec<Value> {
    if examples.len() > cap {
        tracing::debug!(cap, dropped = examples.len() - cap, "example set truncated");
        examples.truncate(cap);
    }
    examples
}

// ── Cache ──

/// Example sets keyed by (name, schema, trail) within one generation call.
#[derive(Debug, Default)]
pub struct ExampleCache {
    entries: HashMap<u64, Vec<Value>>,
}

impl ExampleCache {
    /// Cache key for a schema node reached under `name` at `trail`.
    ///
    /// The node is identified by address, so keys are only meaningful while
    /// every keyed schema stays allocated (see
    /// [`GenerationContext`](crate::context::GenerationContext)).
    #[must_use]
    pub fn key(name: &str, schema: &Schema, trail: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        trail.hash(&mut hasher);
        std::ptr::from_ref(schema).hash(&mut hasher);
        hasher.finish()
    }

    #[must_use]
    pub fn get(&self, key: u64) -> Option<&Vec<Value>> {
        self.entries.get(&key)
    }

    pub fn insert(&mut self, key: u64, examples: Vec<Value>) {
        self.entries.insert(key, examples);
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

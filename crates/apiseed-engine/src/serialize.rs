//! Payload serialization
//!
//! Object entries whose value is `null` are omitted. The standard serializer
//! refuses payloads nested deeper than [`MAX_NESTING`]; the depth-limited one
//! drops whatever lies past its bound instead.

use serde_json::{Map, Value};

/// Nesting beyond which the standard serializer gives up (serde_json's own
/// parse recursion limit).
pub const MAX_NESTING: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("payload nested {depth} levels deep (limit {limit})")]
    TooDeep { depth: usize, limit: usize },
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compact JSON without null-valued object entries.
///
/// # Errors
///
/// Returns [`SerializeError::TooDeep`] past [`MAX_NESTING`] levels.
pub fn to_json(value: &Value) -> Result<String, SerializeError> {
    let depth = nesting_depth(value);
    if depth > MAX_NESTING {
        return Err(SerializeError::TooDeep {
            depth,
            limit: MAX_NESTING,
        });
    }
    Ok(serde_json::to_string(&prune(value, usize::MAX))?)
}

/// Compact JSON keeping at most `max_depth` levels of nesting.
///
/// Containers past the bound are dropped from their parent.
#[must_use]
pub fn to_json_depth_limited(value: &Value, max_depth: usize) -> String {
    let pruned = prune(value, max_depth.max(1));
    serde_json::to_string(&pruned).unwrap_or_else(|_| "{}".to_string())
}

/// Container nesting depth; scalars are 0.
#[must_use]
pub fn nesting_depth(value: &Value) -> usize {
    let mut max = 0;
    let mut stack = vec![(value, 0usize)];
    while let Some((v, depth)) = stack.pop() {
        match v {
            Value::Object(map) => {
                max = max.max(depth + 1);
                stack.extend(map.values().map(|child| (child, depth + 1)));
            }
            Value::Array(items) => {
                max = max.max(depth + 1);
                stack.extend(items.iter().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }
    max
}

/// Copy of `value` without null object entries and without containers
/// deeper than `budget`.
fn prune(value: &Value, budget: usize) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                if v.is_null() || (is_container(v) && budget <= 1) {
                    continue;
                }
                out.insert(k.clone(), prune(v, budget - 1));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|v| !(is_container(v) && budget <= 1))
                .map(|v| prune(v, budget.saturating_sub(1)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested(levels: usize) -> Value {
        let mut value = json!({"leaf": 1});
        for _ in 1..levels {
            value = json!({"next": value, "n": null});
        }
        value
    }

    #[test]
    fn omits_nulls_and_stays_compact() {
        let value = json!({"name": "Rex", "tag": null, "tags": [null, "a"], "owner": {"id": null}});
        insta::assert_snapshot!(to_json(&value).unwrap(), @r#"{"name":"Rex","owner":{},"tags":[null,"a"]}"#);
    }

    #[test]
    fn depth_is_counted_per_container() {
        assert_eq!(nesting_depth(&json!(1)), 0);
        assert_eq!(nesting_depth(&json!({"a": [1, {"b": 2}]})), 3);
        assert_eq!(nesting_depth(&nested(5)), 5);
    }

    #[test]
    fn too_deep_is_refused() {
        let err = to_json(&nested(MAX_NESTING + 1)).unwrap_err();
        assert!(matches!(err, SerializeError::TooDeep { depth, .. } if depth == MAX_NESTING + 1));
        assert!(to_json(&nested(MAX_NESTING)).is_ok());
    }

    #[test]
    fn depth_limited_truncates() {
        let text = to_json_depth_limited(&nested(4), 2);
        insta::assert_snapshot!(text, @r#"{"next":{}}"#);
    }

    #[test]
    fn depth_limited_keeps_shallow_payloads() {
        let value = json!({"a": 1, "b": [1, 2]});
        assert_eq!(to_json_depth_limited(&value, 24), to_json(&value).unwrap());
    }
}

//! Cycle guard: pure checks over a generation trail
//!
//! A trail is a `#`-joined list of segments (property names or schema
//! names). Array descents push `<name>.items`, which counts as `<name>`.

use std::collections::HashMap;

/// Separator between trail segments.
pub const TRAIL_SEPARATOR: char = '#';

const ITEMS_SUFFIX: &str = ".items";

/// Normalized trail tokens: lowercased, `.items` stripped, blanks dropped.
fn tokens(trail: &str) -> impl Iterator<Item = String> + '_ {
    trail
        .split(TRAIL_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase().replace(ITEMS_SUFFIX, ""))
}

/// Number of segments in the trail.
#[must_use]
pub fn trail_depth(trail: &str) -> usize {
    tokens(trail).count()
}

/// True when any segment occurs more than `depth` times.
///
/// Trails shorter than `depth` segments are never cyclic.
#[must_use]
pub fn is_cyclic_reference(trail: &str, depth: usize) -> bool {
    let tokens: Vec<String> = tokens(trail).collect();
    if tokens.len() < depth {
        return false;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in &tokens {
        *counts.entry(token.as_str()).or_default() += 1;
    }
    counts.values().any(|&count| count > depth)
}

/// True when the trail is deeper than the global ceiling (0 = unbounded).
#[must_use]
pub fn exceeds_ceiling(trail: &str, max_depth: usize) -> bool {
    max_depth != 0 && trail_depth(trail) > max_depth
}

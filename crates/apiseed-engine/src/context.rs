//! Per-call generation state
//!
//! One [`GenerationContext`] lives for exactly one `generate` call and is
//! threaded through every recursive step, so a generator never carries
//! half-finished traversal state between calls.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use apiseed_core::Schema;

use crate::combinator::ExampleCache;
use crate::cycle::TRAIL_SEPARATOR;

#[derive(Debug, Default)]
pub struct GenerationContext {
    trail: Vec<String>,
    ref_trail: Vec<String>,
    cache: ExampleCache,
    open_maps: HashMap<String, usize>,
    data_types: BTreeMap<String, Schema>,
    arena: Vec<Arc<Schema>>,
}

impl GenerationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Property path, `#`-joined.
    #[must_use]
    pub fn trail(&self) -> String {
        join(&self.trail)
    }

    /// Schema references currently being expanded, outermost first.
    #[must_use]
    pub fn ref_trail(&self) -> String {
        join(&self.ref_trail)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.trail.len()
    }

    pub(crate) fn push(&mut self, segment: impl Into<String>) {
        self.trail.push(segment.into());
    }

    pub(crate) fn pop(&mut self) {
        self.trail.pop();
    }

    pub(crate) fn push_ref(&mut self, name: impl Into<String>) {
        self.ref_trail.push(name.into());
    }

    pub(crate) fn pop_ref(&mut self) {
        self.ref_trail.pop();
    }

    pub(crate) fn cache(&self) -> &ExampleCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut ExampleCache {
        &mut self.cache
    }

    /// Open a map identified by `map` on the current descent.
    ///
    /// Returns `false`, leaving the counter untouched, when `depth` maps with
    /// the same identity are already open. Every successful call must be
    /// paired with [`Self::leave_map`].
    pub(crate) fn enter_map(&mut self, map: &str, depth: usize) -> bool {
        let open = self.open_maps.entry(map.to_string()).or_default();
        if *open >= depth {
            return false;
        }
        *open += 1;
        true
    }

    pub(crate) fn leave_map(&mut self, map: &str) {
        if let Some(open) = self.open_maps.get_mut(map) {
            *open = open.saturating_sub(1);
            if *open == 0 {
                self.open_maps.remove(map);
            }
        }
    }

    /// Keep `schema` alive until the call ends.
    ///
    /// The example cache keys on node addresses, so every schema expanded
    /// during a call (resolved components and derived views alike) must stay
    /// allocated for the whole call.
    pub(crate) fn retain(&mut self, schema: Arc<Schema>) -> Arc<Schema> {
        self.arena.push(Arc::clone(&schema));
        schema
    }

    /// Remember the schema of the field at the current trail.
    pub(crate) fn record_data_type(&mut self, schema: &Schema) {
        let trail = self.trail();
        if !trail.is_empty() {
            self.data_types.insert(trail, schema.clone());
        }
    }

    /// Field schemas visited so far, keyed by trail.
    #[must_use]
    pub fn data_types(&self) -> &BTreeMap<String, Schema> {
        &self.data_types
    }

    #[must_use]
    pub fn into_data_types(self) -> BTreeMap<String, Schema> {
        self.data_types
    }
}

fn join(segments: &[String]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(TRAIL_SEPARATOR);
        }
        out.push_str(segment);
    }
    out
}

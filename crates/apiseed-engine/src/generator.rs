//! Generator entry point: schema name → example payloads
//!
//! Resolution order for every node:
//! 1. depth ceiling and cyclic-trail checks (empty result, never an error)
//! 2. per-call cache keyed by (name, schema, trail)
//! 3. leaves go straight to the primitive synthesizer
//! 4. explicit schema example
//! 5. `$ref` (cycle-checked against the reference trail)
//! 6. discriminator normalization, then properties / `allOf` / `anyOf`/`oneOf`
//! 7. arrays, open maps, empty objects

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use apiseed_core::registry::display_ref;
use apiseed_core::{CompositionMode, GeneratorConfig, Schema, SchemaKind, SchemaRegistry, simple_ref};

use crate::combinator::{self, ExampleCache};
use crate::composition;
use crate::context::GenerationContext;
use crate::cycle;
use crate::format::{DefaultFormats, FormatSynthesizer};
use crate::pattern::{self, PATTERN_PLACEHOLDER};
use crate::primitive;
use crate::serialize;

/// Payload returned when a schema yields no examples at all.
pub const EMPTY_PAYLOAD: &str = "{}";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("schema not found: {0}")]
    SchemaNotFound(String),
}

/// Turns schema names into example payloads.
///
/// A generator is not reentrant: it owns its RNG and the field-type record of
/// the last call. Parallel workers each own one, sharing a registry through
/// [`apiseed_core::SharedRegistry`].
pub struct Generator<R, F = DefaultFormats> {
    registry: R,
    formats: F,
    config: GeneratorConfig,
    rng: SmallRng,
    request_data_types: BTreeMap<String, Schema>,
}

impl<R: SchemaRegistry> Generator<R> {
    /// Generator with the built-in formats; seeded from `config.seed` when set.
    #[must_use]
    pub fn from_config(registry: R, config: GeneratorConfig) -> Self {
        let formats = config
            .seed
            .map_or_else(DefaultFormats::default, DefaultFormats::seeded);
        Self::new(registry, formats, config)
    }
}

impl<R: SchemaRegistry, F: FormatSynthesizer> Generator<R, F> {
    #[must_use]
    pub fn new(registry: R, formats: F, config: GeneratorConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
        Self {
            registry,
            formats,
            config,
            rng,
            request_data_types: BTreeMap::new(),
        }
    }

    /// Reseed the value RNG.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn into_registry(self) -> R {
        self.registry
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Schema of every field visited by the last call, keyed by trail.
    pub fn request_data_types(&self) -> &BTreeMap<String, Schema> {
        &self.request_data_types
    }

    /// Diagnostics recorded in the registry so far.
    pub fn diagnostics(&self) -> Vec<String> {
        self.registry.errors()
    }

    /// Serialized example payloads for `name`.
    ///
    /// Never returns an empty list: a schema without examples yields `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::SchemaNotFound`] if `name` does not resolve.
    pub fn generate(&mut self, name: &str) -> Result<Vec<String>, GenerateError> {
        let values = self.generate_values(name)?;
        if values.is_empty() {
            return Ok(vec![EMPTY_PAYLOAD.to_string()]);
        }
        Ok(values.iter().map(|v| self.serialize(name, v)).collect())
    }

    /// Example set for `name`, before serialization.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::SchemaNotFound`] if `name` does not resolve.
    pub fn generate_values(&mut self, name: &str) -> Result<Vec<Value>, GenerateError> {
        let schema = self
            .registry
            .resolve(name)
            .ok_or_else(|| GenerateError::SchemaNotFound(name.to_string()))?;
        let root = display_ref(name).to_string();

        let mut ctx = GenerationContext::new();
        let schema = ctx.retain(schema);
        ctx.push_ref(root.as_str());
        let values = self.schema_examples(&mut ctx, &root, &schema);
        ctx.pop_ref();

        self.request_data_types = ctx.into_data_types();
        tracing::debug!(schema = %root, examples = values.len(), "generated");
        Ok(combinator::truncate(values, self.config.max_examples))
    }

    /// Serialize one payload, falling back to the depth-limited serializer.
    pub fn serialize(&mut self, name: &str, value: &Value) -> String {
        match serialize::to_json(value) {
            Ok(text) => text,
            Err(e) => {
                self.diagnose(format!(
                    "Generated sample for '{name}' is too large to serialize ({e}). \
                     Re-run with a smaller self_reference_depth, e.g. self_reference_depth = 2"
                ));
                serialize::to_json_depth_limited(value, self.config.serializer_depth())
            }
        }
    }

    /// Explicit example of a schema (`example`, else the first `examples`
    /// entry), with `$ref` examples resolved. `None` when `use_examples` is off.
    pub fn extract_example_from_schema(&self, schema: &Schema, use_examples: bool) -> Option<Value> {
        if !use_examples {
            return None;
        }
        let raw = schema
            .example
            .clone()
            .or_else(|| schema.examples.as_ref().and_then(first_example))?;

        let reference = raw.get("$ref").and_then(Value::as_str);
        match reference.and_then(|r| self.registry.resolve_object_from_path_reference(r)) {
            Some(resolved) => Some(resolved),
            None => Some(raw),
        }
    }

    fn diagnose(&mut self, message: String) {
        tracing::warn!("{message}");
        self.registry.record_error(message);
    }

    // ── Recursion ──

    fn schema_examples(&mut self, ctx: &mut GenerationContext, name: &str, schema: &Schema) -> Vec<Value> {
        let trail = ctx.trail();
        if cycle::exceeds_ceiling(&trail, self.config.max_depth) {
            tracing::debug!(%trail, "depth ceiling reached");
            return Vec::new();
        }
        if is_structural(schema)
            && cycle::is_cyclic_reference(&trail, self.config.self_reference_depth)
            && self.registry.resolve(name).is_none()
        {
            tracing::debug!(%trail, "cyclic trail cut");
            return Vec::new();
        }

        let key = ExampleCache::key(name, schema, &trail);
        if let Some(hit) = ctx.cache().get(key) {
            tracing::debug!(%trail, schema = name, "example cache hit");
            return hit.clone();
        }

        let examples = combinator::truncate(self.expand(ctx, name, schema), self.config.max_examples);
        ctx.cache_mut().insert(key, examples.clone());
        examples
    }

    fn expand(&mut self, ctx: &mut GenerationContext, name: &str, schema: &Schema) -> Vec<Value> {
        if !is_structural(schema) {
            return vec![self.leaf_value(ctx, name, schema)];
        }

        if let Some(example) = self.extract_example_from_schema(schema, self.config.use_schema_examples) {
            return vec![format_example(schema, example)];
        }

        if let Some(reference) = schema.reference.as_deref() {
            return self.reference_examples(ctx, reference);
        }

        if let Some(discriminator) = &schema.discriminator {
            self.registry.record_discriminator(discriminator.clone());
        }
        if let Some(normalized) = composition::normalize_discriminator(name, schema) {
            self.register_once(&composition::discriminator_base_name(name), normalized.base);
            let view = ctx.retain(Arc::new(normalized.one_of_view));
            return self.composed_examples(ctx, name, &view);
        }

        if schema.is_composed() || !schema.properties.is_empty() {
            let examples = self.composed_examples(ctx, name, schema);
            if !examples.is_empty() || schema.is_composed() {
                return examples;
            }
        }

        if schema.is_array() {
            return self.array_examples(ctx, name, schema);
        }
        if schema.is_map() {
            return self.map_examples(ctx, name, schema);
        }
        vec![Value::Object(Map::new())]
    }

    fn reference_examples(&mut self, ctx: &mut GenerationContext, reference: &str) -> Vec<Value> {
        let target = display_ref(reference).to_string();
        match self.registry.resolve(reference) {
            Some(resolved) => {
                let resolved = ctx.retain(resolved);
                self.descend_reference(ctx, &target, &target, &resolved)
            }
            None => {
                tracing::warn!(reference, "unresolvable reference");
                Vec::new()
            }
        }
    }

    /// Expand `schema` under `name` with `target` pushed on the reference trail.
    fn descend_reference(
        &mut self,
        ctx: &mut GenerationContext,
        target: &str,
        name: &str,
        schema: &Schema,
    ) -> Vec<Value> {
        ctx.push_ref(target);
        let examples = if cycle::is_cyclic_reference(&ctx.ref_trail(), self.config.self_reference_depth) {
            tracing::debug!(ref_trail = %ctx.ref_trail(), "cyclic reference cut");
            Vec::new()
        } else {
            self.schema_examples(ctx, name, schema)
        };
        ctx.pop_ref();
        examples
    }

    fn composed_examples(&mut self, ctx: &mut GenerationContext, name: &str, schema: &Schema) -> Vec<Value> {
        let cap = self.config.max_examples;
        let mut examples = Vec::new();
        if !schema.properties.is_empty() {
            examples = self.object_examples(ctx, name, schema);
        }
        if !schema.all_of.is_empty() {
            let all_of = self.all_of_examples(ctx, name, schema);
            examples = combinator::combine_lists(examples, all_of, cap);
        }
        if !schema.alternatives().is_empty() {
            let alternatives = self.alternative_examples(ctx, name, schema);
            examples = combinator::combine_lists(examples, alternatives, cap);
        }
        examples
    }

    fn object_examples(&mut self, ctx: &mut GenerationContext, name: &str, schema: &Schema) -> Vec<Value> {
        let cap = self.config.max_examples;
        let mut examples = Vec::new();
        for (property, property_schema) in &schema.properties {
            let candidates = self.property_examples(ctx, name, schema, property, property_schema);
            examples = combinator::combine_property(examples, property, &candidates, cap);
        }
        examples
    }

    fn property_examples(
        &mut self,
        ctx: &mut GenerationContext,
        owner_name: &str,
        owner: &Schema,
        property: &str,
        schema: &Schema,
    ) -> Vec<Value> {
        ctx.push(property);
        ctx.record_data_type(schema);
        let candidates = match self.discriminator_value(owner_name, owner, property, schema) {
            Some(value) => vec![Value::String(value)],
            None => self.schema_examples(ctx, property, schema),
        };
        ctx.pop();
        candidates
    }

    /// Value for a discriminator property, or `None` for ordinary properties.
    fn discriminator_value(
        &self,
        owner_name: &str,
        owner: &Schema,
        property: &str,
        schema: &Schema,
    ) -> Option<String> {
        let is_owner_discriminator = owner
            .discriminator
            .as_ref()
            .is_some_and(|d| d.property_name == property);
        let recorded = self.registry.discriminators();
        if !is_owner_discriminator && !recorded.iter().any(|d| d.property_name == property) {
            return None;
        }

        let enum_values = match schema.reference.as_deref() {
            Some(reference) if schema.enum_values.is_empty() => self
                .registry
                .resolve(reference)
                .map(|s| s.enum_values.clone())
                .unwrap_or_default(),
            _ => schema.enum_values.clone(),
        };
        let value = composition::match_to_enum_or_empty(owner_name, property, &enum_values, &recorded);
        (is_owner_discriminator || !value.is_empty()).then_some(value)
    }

    fn all_of_examples(&mut self, ctx: &mut GenerationContext, name: &str, schema: &Schema) -> Vec<Value> {
        let cap = self.config.max_examples;
        let views: Vec<Arc<Schema>> = schema
            .all_of
            .iter()
            .map(|branch| {
                let view = self.all_of_view(name, branch);
                ctx.retain(view)
            })
            .collect();
        self.register_once(
            &composition::all_of_merged_name(name),
            composition::merged_all_of_view(views.iter().map(AsRef::as_ref)),
        );

        let mut examples = Vec::new();
        for (branch, view) in schema.all_of.iter().zip(&views) {
            let branch_examples = match branch.reference.as_deref() {
                Some(reference) => self.descend_reference(ctx, display_ref(reference), name, view),
                None => self.schema_examples(ctx, name, branch),
            };
            examples = combinator::combine_lists(examples, branch_examples, cap);
        }
        examples
    }

    /// What an `allOf` branch of `owner` resolves to.
    ///
    /// A reference to a discriminated parent that maps to `owner` resolves to
    /// the parent's base view, which keeps the child from re-entering the
    /// parent's `oneOf`.
    fn all_of_view(&mut self, owner: &str, branch: &Schema) -> Arc<Schema> {
        let Some(reference) = branch.reference.as_deref() else {
            return Arc::new(branch.clone());
        };
        let Some(target) = self.registry.resolve(reference) else {
            return Arc::new(branch.clone());
        };
        if composition::has_explicit_mapping(&target) && composition::maps_to(&target, owner) {
            let base = composition::base_view(&target);
            self.register_once(
                &composition::discriminator_base_name(simple_ref(reference)),
                base.clone(),
            );
            return Arc::new(base);
        }
        target
    }

    fn alternative_examples(
        &mut self,
        ctx: &mut GenerationContext,
        name: &str,
        schema: &Schema,
    ) -> Vec<Value> {
        let branches = composition::non_null_branches(schema.alternatives());
        if let [only] = branches.as_slice() {
            return self.schema_examples(ctx, only.ref_name().unwrap_or(name), only);
        }

        let mut all = Vec::new();
        for branch in branches {
            let branch_name = branch.ref_name().unwrap_or(name).to_string();
            let mut examples = self.schema_examples(ctx, &branch_name, branch);
            if let (Some(discriminator), Some(reference)) =
                (&schema.discriminator, branch.reference.as_deref())
            {
                let key = discriminator
                    .key_for(reference)
                    .unwrap_or_else(|| simple_ref(reference));
                for example in &mut examples {
                    composition::tag_discriminator(example, &discriminator.property_name, key);
                }
            }
            all.extend(examples);
        }

        match self.config.composition {
            CompositionMode::Multiple => combinator::truncate(all, self.config.max_examples),
            CompositionMode::Flatten => composition::flatten_examples(all).into_iter().collect(),
        }
    }

    fn array_examples(&mut self, ctx: &mut GenerationContext, name: &str, schema: &Schema) -> Vec<Value> {
        let Some(items) = schema.items.as_deref() else {
            return vec![Value::Array(Vec::new())];
        };
        let len = primitive::array_length(self.config.array_size, schema.min_items, schema.max_items);
        tracing::debug!(
            array = name,
            len,
            min_items = schema.min_items,
            max_items = schema.max_items,
            "array length clamped"
        );

        ctx.push(format!("{name}.items"));
        ctx.record_data_type(items);
        let item_examples = self.schema_examples(ctx, name, items);
        ctx.pop();

        item_examples
            .into_iter()
            .map(|item| Value::Array(vec![item; len]))
            .collect()
    }

    /// One-entry example for an open map.
    ///
    /// Results are cached in the registry under the value schema's `$ref`,
    /// else under the map's location, so same-named maps in different places
    /// never share an entry. Nested expansions of the same map are counted
    /// while open; a cut expansion yields `{}` and is never cached.
    fn map_examples(&mut self, ctx: &mut GenerationContext, name: &str, schema: &Schema) -> Vec<Value> {
        let Some(value_schema) = schema.additional_properties_schema() else {
            return Vec::new();
        };
        let location = format!("{}|{}", ctx.ref_trail(), ctx.trail());
        let cache_key = value_schema
            .reference
            .clone()
            .unwrap_or_else(|| location.clone());
        if let Some(cached) = self.registry.cached_additional_properties(&cache_key) {
            return vec![cached];
        }

        let map_id = schema
            .name
            .clone()
            .or_else(|| value_schema.reference.clone())
            .unwrap_or(location);
        if !ctx.enter_map(&map_id, self.config.self_reference_depth) {
            tracing::debug!(map = %map_id, trail = %ctx.trail(), "self-referencing map cut");
            return Vec::new();
        }

        let key = value_schema
            .ref_name()
            .or(value_schema.name.as_deref())
            .unwrap_or("key")
            .to_string();
        ctx.push("value");
        let values = self.schema_examples(ctx, &key, value_schema);
        ctx.pop();
        ctx.leave_map(&map_id);

        let Some(first) = values.into_iter().next() else {
            tracing::debug!(map = name, "map values cut, not cached");
            return vec![Value::Object(Map::new())];
        };
        let mut map = Map::new();
        map.insert(key, first);
        let example = Value::Object(map);
        self.registry.cache_additional_properties(&cache_key, example.clone());
        vec![example]
    }

    // ── Leaves ──

    fn leaf_value(&mut self, ctx: &GenerationContext, name: &str, schema: &Schema) -> Value {
        if let Some(example) = self.extract_example_from_schema(schema, self.config.use_property_examples) {
            return format_example(schema, example);
        }
        if let Some(value) = schema.enum_values.iter().find(|v| !v.is_null()) {
            return value.clone();
        }
        if self.config.use_defaults {
            if let Some(default) = &schema.default {
                return default.clone();
            }
        }
        if schema.is_string() && schema.format.is_some() {
            match self.formats.generate(schema, &ctx.trail()) {
                Ok(Some(value)) => return Value::String(value),
                Ok(None) => {}
                Err(e) => {
                    self.diagnose(format!(
                        "A valid string could not be generated for the property '{name}': {e}"
                    ));
                    return Value::String(PATTERN_PLACEHOLDER.to_string());
                }
            }
        }

        match schema.kind() {
            Some(SchemaKind::String) => Value::String(self.string_value(name, schema)),
            Some(SchemaKind::Integer) => primitive::integer_value(&mut self.rng, schema),
            Some(SchemaKind::Number) => primitive::number_value(&mut self.rng, schema),
            Some(SchemaKind::Boolean) => Value::Bool(self.rng.gen_bool(0.5)),
            Some(SchemaKind::Null) => Value::Null,
            _ => Value::String(primitive::name_sized_string(&mut self.rng, name)),
        }
    }

    fn string_value(&mut self, name: &str, schema: &Schema) -> String {
        if schema.is_decimal() {
            return primitive::decimal_string(&mut self.rng, schema);
        }
        let generated = match (primitive::length_bounds(schema), schema.pattern.as_deref()) {
            (Some((min, max)), Some(p)) => {
                pattern::generate_matching_with_length(p, min, max, &mut self.rng)
            }
            (None, Some(p)) => pattern::generate_matching(p, &mut self.rng),
            (Some((min, max)), None) => return primitive::bounded_string(&mut self.rng, min, max),
            (None, None) => return primitive::name_sized_string(&mut self.rng, name),
        };
        generated.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "pattern generation failed");
            self.diagnose(format!(
                "A valid string could not be generated for the property '{name}' using the pattern '{}'. \
                 Please consider either changing the pattern or simplifying it.",
                schema.pattern.as_deref().unwrap_or_default()
            ));
            PATTERN_PLACEHOLDER.to_string()
        })
    }

    fn register_once(&mut self, name: &str, schema: Schema) {
        if self.registry.resolve(name).is_none() {
            tracing::debug!(schema = name, "registering derived schema");
            self.registry.register_schema(name, schema);
        }
    }
}

/// Nodes that expand into structure rather than a single scalar.
fn is_structural(schema: &Schema) -> bool {
    schema.reference.is_some()
        || schema.is_composed()
        || !schema.properties.is_empty()
        || schema.discriminator.is_some()
        || schema.is_array()
        || schema.is_map()
        || schema.is_object()
}

/// First entry of an `examples` list (or map of example objects).
fn first_example(examples: &Value) -> Option<Value> {
    match examples {
        Value::Array(items) => items.iter().find(|v| !v.is_null()).cloned(),
        Value::Object(map) => map
            .values()
            .next()
            .map(|entry| entry.get("value").cloned().unwrap_or_else(|| entry.clone())),
        _ => None,
    }
}

/// Normalize an explicit example to the schema's format.
///
/// Newlines are stripped from strings; dates become `yyyy-MM-dd`,
/// date-times ISO-8601 with offset, and base64 binary examples are decoded
/// when they decode to UTF-8.
fn format_example(schema: &Schema, example: Value) -> Value {
    let Value::String(text) = example else {
        return example;
    };
    let text = text.replace('\n', "");

    let formatted = if schema.is_date() {
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(&text).ok().map(|dt| dt.date_naive()))
            .map(|d| d.format("%Y-%m-%d").to_string())
    } else if schema.is_date_time() {
        DateTime::parse_from_rfc3339(&text)
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S")
                    .ok()
                    .map(|naive| naive.and_utc().fixed_offset())
            })
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    } else if schema.is_binary() {
        STANDARD
            .decode(text.as_bytes())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
    } else {
        None
    };
    Value::String(formatted.unwrap_or(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiseed_core::ComponentRegistry;
    use serde_json::json;

    fn registry(schemas: Value) -> ComponentRegistry {
        ComponentRegistry::from_document(json!({"components": {"schemas": schemas}})).unwrap()
    }

    fn generator(schemas: Value) -> Generator<ComponentRegistry> {
        let config = GeneratorConfig {
            seed: Some(42),
            ..GeneratorConfig::default()
        };
        Generator::from_config(registry(schemas), config)
    }

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unknown_schema_is_an_error() {
        let mut g = generator(json!({}));
        let err = g.generate("Missing").unwrap_err();
        assert!(matches!(err, GenerateError::SchemaNotFound(ref n) if n == "Missing"));
    }

    #[test]
    fn empty_schema_yields_empty_object_payload() {
        let mut g = generator(json!({"Empty": {"type": "object"}}));
        assert_eq!(g.generate("Empty").unwrap(), vec!["{}".to_string()]);
    }

    #[test]
    fn schema_example_short_circuits() {
        let mut g = generator(json!({
            "Pet": {
                "type": "object",
                "example": {"name": "Rex"},
                "properties": {"name": {"type": "string"}, "age": {"type": "integer"}}
            }
        }));
        assert_eq!(g.generate("Pet").unwrap(), vec![r#"{"name":"Rex"}"#.to_string()]);
    }

    #[test]
    fn schema_examples_can_be_disabled() {
        let mut g = generator(json!({
            "Pet": {
                "type": "object",
                "example": {"name": "Rex"},
                "properties": {"age": {"type": "integer", "minimum": 1, "maximum": 1}}
            }
        }));
        g.config.use_schema_examples = false;
        assert_eq!(g.generate_values("Pet").unwrap(), vec![json!({"age": 1})]);
    }

    #[test]
    fn leaf_resolution_order() {
        let mut g = generator(json!({
            "Thing": {
                "type": "object",
                "properties": {
                    "example": {"type": "string", "example": "given", "enum": ["a"]},
                    "enumerated": {"type": "string", "enum": [null, "b", "c"], "default": "c"},
                    "defaulted": {"type": "integer", "default": 7},
                    "formatted": {"type": "string", "format": "email"},
                    "plain": {"type": "boolean"}
                }
            }
        }));
        let value = &g.generate_values("Thing").unwrap()[0];
        assert_eq!(value["example"], "given");
        assert_eq!(value["enumerated"], "b");
        assert_eq!(value["defaulted"], 7);
        assert!(value["formatted"].as_str().unwrap().contains('@'));
        assert!(value["plain"].is_boolean());
    }

    #[test]
    fn defaults_can_be_disabled() {
        let mut g = generator(json!({
            "Thing": {"properties": {"n": {"type": "integer", "default": 7, "minimum": 100, "maximum": 100}}}
        }));
        g.config.use_defaults = false;
        assert_eq!(g.generate_values("Thing").unwrap()[0]["n"], 100);
    }

    #[test]
    fn example_ref_is_resolved() {
        let document = json!({
            "components": {
                "examples": {"Rex": {"value": {"name": "Rex"}}},
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "example": {"$ref": "#/components/examples/Rex"},
                        "properties": {"name": {"type": "string"}}
                    }
                }
            }
        });
        let registry = ComponentRegistry::from_document(document).unwrap();
        let mut g = Generator::from_config(registry, GeneratorConfig::default());
        assert_eq!(g.generate_values("Pet").unwrap(), vec![json!({"name": "Rex"})]);
    }

    #[test]
    fn examples_list_uses_first_entry() {
        let g = generator(json!({}));
        let s = schema(json!({"type": "string", "examples": [null, "first", "second"]}));
        assert_eq!(g.extract_example_from_schema(&s, true), Some(json!("first")));
        assert_eq!(g.extract_example_from_schema(&s, false), None);
    }

    #[test]
    fn example_formatting() {
        let date = schema(json!({"type": "string", "format": "date"}));
        assert_eq!(format_example(&date, json!("2024-03-05T10:00:00Z")), json!("2024-03-05"));
        let date_time = schema(json!({"type": "string", "format": "date-time"}));
        assert_eq!(
            format_example(&date_time, json!("2024-03-05T10:00:00")),
            json!("2024-03-05T10:00:00Z")
        );
        let binary = schema(json!({"type": "string", "format": "byte"}));
        assert_eq!(format_example(&binary, json!("aGVsbG8=")), json!("hello"));
        assert_eq!(format_example(&binary, json!("not base64!")), json!("not base64!"));
        let plain = Schema::of_type("string");
        assert_eq!(format_example(&plain, json!("a\nb")), json!("ab"));
        assert_eq!(format_example(&plain, json!(3)), json!(3));
    }

    #[test]
    fn bad_pattern_records_diagnostic() {
        let mut g = generator(json!({
            "Code": {"properties": {"code": {"type": "string", "pattern": "([a-z]"}}}
        }));
        let value = &g.generate_values("Code").unwrap()[0];
        assert_eq!(value["code"], PATTERN_PLACEHOLDER);
        let diagnostics = g.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("'code'"));
        assert!(diagnostics[0].contains("([a-z]"));
    }

    #[test]
    fn map_uses_key_and_cache() {
        let mut g = generator(json!({
            "Labels": {
                "type": "object",
                "properties": {
                    "labels": {"type": "object", "additionalProperties": {"type": "integer", "minimum": 3, "maximum": 3}}
                }
            }
        }));
        assert_eq!(g.generate_values("Labels").unwrap(), vec![json!({"labels": {"key": 3}})]);
        assert_eq!(
            g.registry().cached_additional_properties("Labels|labels"),
            Some(json!({"key": 3}))
        );
    }

    #[test]
    fn named_map_values_use_schema_name_as_key() {
        let mut g = generator(json!({
            "Tag": {"type": "object", "properties": {"id": {"type": "integer", "minimum": 1, "maximum": 1}}},
            "Index": {"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Tag"}}
        }));
        assert_eq!(g.generate_values("Index").unwrap(), vec![json!({"Tag": {"id": 1}})]);
        assert_eq!(
            g.registry().cached_additional_properties("#/components/schemas/Tag"),
            Some(json!({"Tag": {"id": 1}}))
        );
    }

    #[test]
    fn nested_map_expansions_stop_at_the_bound() {
        let mut g = generator(json!({
            "Bag": {"type": "object", "additionalProperties": {"type": "object", "additionalProperties": {"type": "integer"}}}
        }));
        let mut ctx = GenerationContext::new();
        let bag = ctx.retain(g.registry().resolve("Bag").unwrap());
        for _ in 0..g.config().self_reference_depth {
            assert!(ctx.enter_map("Bag", g.config().self_reference_depth));
        }
        assert_eq!(g.map_examples(&mut ctx, "Bag", &bag), Vec::<Value>::new());
        assert!(g.registry().cached_additional_properties("|").is_none());
    }

    #[test]
    fn items_without_schema_produce_empty_array() {
        let mut g = generator(json!({"List": {"properties": {"xs": {"type": "array"}}}}));
        assert_eq!(g.generate_values("List").unwrap(), vec![json!({"xs": []})]);
    }

    #[test]
    fn request_data_types_track_fields() {
        let mut g = generator(json!({
            "Pet": {
                "properties": {
                    "name": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                }
            }
        }));
        g.generate("Pet").unwrap();
        let types: Vec<&str> = g.request_data_types().keys().map(String::as_str).collect();
        assert_eq!(types, vec!["name", "tags", "tags#tags.items"]);
    }

    #[test]
    fn same_seed_same_payloads() {
        let schemas = json!({
            "Pet": {"properties": {"name": {"type": "string"}, "age": {"type": "integer"}}}
        });
        let first = generator(schemas.clone()).generate("Pet").unwrap();
        let second = generator(schemas).generate("Pet").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn oversized_payload_falls_back_to_depth_limited() {
        let mut g = generator(json!({"Pet": {"type": "object"}}));
        let mut value = json!(1);
        for _ in 0..200 {
            value = json!({"next": value});
        }
        let text = g.serialize("Pet", &value);
        let depth = g.config().serializer_depth();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(serialize::nesting_depth(&parsed), depth);
        assert!(g.diagnostics()[0].contains("smaller self_reference_depth"));
    }
}

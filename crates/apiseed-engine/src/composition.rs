//! Composition helpers: discriminator views, branch filtering, flattening
//!
//! The recursive part of composition lives in the generator; these functions
//! derive new schemas and reshape example sets without touching the registry.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};

use apiseed_core::{Discriminator, Schema, simple_ref};

/// Registry name of the discriminator base view of `name`.
#[must_use]
pub fn discriminator_base_name(name: &str) -> String {
    format!("DiscriminatorBase{name}")
}

/// Registry name of the merged `allOf` view of `name`.
#[must_use]
pub fn all_of_merged_name(name: &str) -> String {
    format!("{name}AllOfMerged")
}

/// A discriminated parent rewritten as a `oneOf`, plus its base view.
#[derive(Debug, Clone)]
pub struct NormalizedDiscriminator {
    /// `oneOf` over the mapped schemas, discriminator kept.
    pub one_of_view: Schema,
    /// The parent without mapping; what mapped children see through `allOf`.
    pub base: Schema,
}

/// Whether `schema` qualifies for discriminator normalization.
#[must_use]
pub fn has_explicit_mapping(schema: &Schema) -> bool {
    !schema.is_composed()
        && schema
            .discriminator
            .as_ref()
            .is_some_and(|d| !d.mapping.is_empty())
}

/// Rewrite a parent with an explicit mapping into a `oneOf` of its children.
///
/// Mapping targets equal to `name` are skipped. Returns `None` when the
/// schema does not qualify or maps only to itself. The input is not modified.
#[must_use]
pub fn normalize_discriminator(name: &str, schema: &Schema) -> Option<NormalizedDiscriminator> {
    if !has_explicit_mapping(schema) {
        return None;
    }
    let discriminator = schema.discriminator.as_ref()?;

    let mut seen = HashSet::new();
    let branches: Vec<Schema> = discriminator
        .mapping
        .values()
        .filter(|target| !simple_ref(target).eq_ignore_ascii_case(simple_ref(name)))
        .filter(|target| seen.insert(simple_ref(target).to_string()))
        .map(|target| Schema::reference_to(target.clone()))
        .collect();
    if branches.is_empty() {
        return None;
    }

    let base = base_view(schema);
    let mut one_of_view = base.clone();
    one_of_view.discriminator = Some(discriminator.clone());
    one_of_view.one_of = branches;

    Some(NormalizedDiscriminator { one_of_view, base })
}

/// The parent with its mapping removed and the discriminator property
/// restricted to the mapping keys.
#[must_use]
pub fn base_view(schema: &Schema) -> Schema {
    let mut base = schema.clone();
    let Some(discriminator) = base.discriminator.as_mut() else {
        return base;
    };
    let keys: Vec<Value> = discriminator
        .mapping
        .keys()
        .map(|k| Value::String(k.clone()))
        .collect();
    discriminator.mapping.clear();

    let property = discriminator.property_name.clone();
    if let Some(prop) = base.properties.get_mut(&property) {
        if prop.enum_values.is_empty() && !keys.is_empty() {
            prop.enum_values = keys;
        }
    }
    base
}

/// Whether `owner` is one of the schemas `parent` maps its discriminator to.
#[must_use]
pub fn maps_to(parent: &Schema, owner: &str) -> bool {
    parent.discriminator.as_ref().is_some_and(|d| {
        d.mapping
            .values()
            .any(|target| simple_ref(target).eq_ignore_ascii_case(simple_ref(owner)))
    })
}

/// Merged view of resolved `allOf` branches: union of properties (later
/// branches win) and of `required`.
#[must_use]
pub fn merged_all_of_view<'a>(branches: impl IntoIterator<Item = &'a Schema>) -> Schema {
    let mut merged = Schema::of_type("object");
    for branch in branches {
        for (name, prop) in &branch.properties {
            merged.properties.insert(name.clone(), prop.clone());
        }
        for required in &branch.required {
            if !merged.required.contains(required) {
                merged.required.push(required.clone());
            }
        }
        if merged.discriminator.is_none() {
            merged.discriminator.clone_from(&branch.discriminator);
        }
    }
    merged
}

/// Branches worth generating: null-only branches are dropped.
#[must_use]
pub fn non_null_branches(branches: &[Schema]) -> Vec<&Schema> {
    branches.iter().filter(|b| !b.is_null_schema()).collect()
}

/// Value for a discriminator property generated under `name`.
///
/// Picks the first enum value contained (case-insensitive) in `name`, then a
/// matching mapping key among the recorded discriminators for `property`,
/// else the empty string.
#[must_use]
pub fn match_to_enum_or_empty(
    name: &str,
    property: &str,
    enum_values: &[Value],
    discriminators: &BTreeSet<Discriminator>,
) -> String {
    let haystack = name.to_lowercase();
    let contained = |candidate: &str| {
        !candidate.is_empty() && haystack.contains(&candidate.to_lowercase())
    };

    if let Some(hit) = enum_values
        .iter()
        .filter_map(Value::as_str)
        .find(|v| contained(v))
    {
        return hit.to_string();
    }

    discriminators
        .iter()
        .filter(|d| d.property_name == property)
        .flat_map(|d| d.mapping.iter())
        .find(|(key, target)| {
            contained(key) || simple_ref(target).eq_ignore_ascii_case(simple_ref(name))
        })
        .map(|(key, _)| key.clone())
        .unwrap_or_default()
}

/// Set the discriminator property on an object example.
pub fn tag_discriminator(example: &mut Value, property: &str, key: &str) {
    if let Value::Object(map) = example {
        map.insert(property.to_string(), Value::String(key.to_string()));
    }
}

/// Collapse alternative examples into one value.
///
/// Object examples are merged; a key carrying different values across
/// branches becomes a list of those values. Without any object, the first
/// example is kept.
#[must_use]
pub fn flatten_examples(examples: Vec<Value>) -> Option<Value> {
    let mut merged = Map::new();
    let mut collected: HashSet<String> = HashSet::new();
    let mut first_scalar = None;
    let mut saw_object = false;

    for example in examples {
        let Value::Object(map) = example else {
            first_scalar.get_or_insert(example);
            continue;
        };
        saw_object = true;
        for (key, value) in map {
            match merged.get_mut(&key) {
                None => {
                    merged.insert(key, value);
                }
                Some(existing) if collected.contains(&key) => {
                    if let Value::Array(values) = existing {
                        if !values.contains(&value) {
                            values.push(value);
                        }
                    }
                }
                Some(existing) if *existing != value => {
                    let previous = existing.take();
                    *existing = Value::Array(vec![previous, value]);
                    collected.insert(key);
                }
                Some(_) => {}
            }
        }
    }

    if saw_object {
        Some(Value::Object(merged))
    } else {
        first_scalar
    }
}

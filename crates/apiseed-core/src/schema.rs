//! Typed OpenAPI schema nodes
//!
//! Deserialized straight from `components.schemas` or from any inline schema
//! in the document. Only the keywords the synthesis engine reads are modelled;
//! everything else is ignored by serde.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of component schema references.
pub const COMPONENTS_SCHEMAS_PREFIX: &str = "#/components/schemas/";

/// JSON type a schema node describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaKind {
    /// Parse a JSON Schema `type` keyword value. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "null" => Some(Self::Null),
            _ => None,
        }
    }
}

/// The `type` keyword: a single name (OpenAPI 3.0) or a list (OpenAPI 3.1).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeDecl {
    Single(String),
    Multiple(Vec<String>),
}

/// Discriminator object: property name plus optional value → schema mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mapping: BTreeMap<String, String>,
}

impl Discriminator {
    /// Mapping key whose target is `reference` (compared by simple name, case-insensitive).
    #[must_use]
    pub fn key_for(&self, reference: &str) -> Option<&str> {
        let wanted = simple_ref(reference);
        self.mapping
            .iter()
            .find(|(_, target)| simple_ref(target).eq_ignore_ascii_case(wanted))
            .map(|(key, _)| key.as_str())
    }
}

/// `additionalProperties`: either a flag or a value schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// A schema node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub type_decl: Option<TypeDecl>,
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<Value>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    /// OpenAPI 3.1 `examples` (a list); the first entry is used.
    pub examples: Option<Value>,
    pub discriminator: Option<Discriminator>,
    #[serde(default)]
    pub all_of: Vec<Schema>,
    #[serde(default)]
    pub any_of: Vec<Schema>,
    #[serde(default)]
    pub one_of: Vec<Schema>,
    #[serde(default)]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default)]
    pub required: Vec<String>,
    pub items: Option<Box<Schema>>,
    pub additional_properties: Option<AdditionalProperties>,
    pub title: Option<String>,
    /// Registry name for component schemas, set on load.
    #[serde(skip)]
    pub name: Option<String>,
}

impl Schema {
    /// A bare `$ref` node.
    #[must_use]
    pub fn reference_to(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// A node of the given primitive type.
    #[must_use]
    pub fn of_type(name: &str) -> Self {
        Self {
            type_decl: Some(TypeDecl::Single(name.to_string())),
            ..Self::default()
        }
    }

    /// Declared kind. For a type list the first non-null entry wins.
    #[must_use]
    pub fn kind(&self) -> Option<SchemaKind> {
        match self.type_decl.as_ref()? {
            TypeDecl::Single(name) => SchemaKind::from_name(name),
            TypeDecl::Multiple(names) => {
                let kinds: Vec<SchemaKind> =
                    names.iter().filter_map(|n| SchemaKind::from_name(n)).collect();
                kinds
                    .iter()
                    .copied()
                    .find(|k| *k != SchemaKind::Null)
                    .or_else(|| kinds.first().copied())
            }
        }
    }

    #[must_use]
    pub fn has_type(&self) -> bool {
        self.type_decl.is_some()
    }

    #[must_use]
    pub fn ref_name(&self) -> Option<&str> {
        self.reference.as_deref().map(simple_ref)
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind() == Some(SchemaKind::String)
    }

    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.kind() == Some(SchemaKind::Boolean)
    }

    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.kind() == Some(SchemaKind::Integer)
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        self.kind() == Some(SchemaKind::Number)
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.kind() == Some(SchemaKind::Array) || self.items.is_some()
    }

    /// Explicit `type: object`, or untyped with declared properties.
    #[must_use]
    pub fn is_object(&self) -> bool {
        match self.kind() {
            Some(kind) => kind == SchemaKind::Object,
            None => !self.properties.is_empty(),
        }
    }

    #[must_use]
    pub fn is_composed(&self) -> bool {
        !self.all_of.is_empty() || !self.any_of.is_empty() || !self.one_of.is_empty()
    }

    /// Value schema of an open map, if any.
    #[must_use]
    pub fn additional_properties_schema(&self) -> Option<&Schema> {
        match self.additional_properties.as_ref()? {
            AdditionalProperties::Schema(schema) => Some(schema),
            AdditionalProperties::Allowed(_) => None,
        }
    }

    /// Open map with no declared properties.
    #[must_use]
    pub fn is_map(&self) -> bool {
        self.properties.is_empty() && self.additional_properties_schema().is_some()
    }

    /// Nothing to generate from: no usable type, no `$ref`, no composition, no structure.
    #[must_use]
    pub fn is_null_schema(&self) -> bool {
        matches!(self.kind(), None | Some(SchemaKind::Null))
            && self.reference.is_none()
            && !self.is_composed()
            && self.properties.is_empty()
            && self.items.is_none()
            && self.additional_properties_schema().is_none()
    }

    /// Whether the node carries anything at all worth resolving.
    #[must_use]
    pub fn is_not_empty(&self) -> bool {
        self.reference.as_deref().is_some_and(|r| !r.trim().is_empty())
            || self.has_type()
            || !self.properties.is_empty()
            || self.is_composed()
            || self.items.is_some()
            || !self.required.is_empty()
    }

    /// `anyOf` branches if present, otherwise `oneOf`.
    #[must_use]
    pub fn alternatives(&self) -> &[Schema] {
        if self.any_of.is_empty() {
            &self.one_of
        } else {
            &self.any_of
        }
    }

    fn has_format(&self, format: &str) -> bool {
        self.format.as_deref() == Some(format)
    }

    #[must_use]
    pub fn is_date(&self) -> bool {
        self.is_string() && self.has_format("date")
    }

    #[must_use]
    pub fn is_date_time(&self) -> bool {
        self.is_string() && self.has_format("date-time")
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.is_string() && (self.has_format("binary") || self.has_format("byte"))
    }

    /// String carrying a decimal number (`format: number`).
    #[must_use]
    pub fn is_decimal(&self) -> bool {
        self.has_format("number")
    }

    #[must_use]
    pub fn is_short_integer(&self) -> bool {
        self.has_format("int32")
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        self.has_format("float")
    }
}

/// Last segment of a reference: `#/components/schemas/Pet` → `Pet`.
#[must_use]
pub fn simple_ref(reference: &str) -> &str {
    reference
        .rsplit_once('/')
        .map_or(reference, |(_, last)| last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn deserialize_object_schema() {
        let schema = parse(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "minLength": 3, "maxLength": 3},
                "tag": {"type": "string", "enum": ["cat", "dog"]},
                "owner": {"$ref": "#/components/schemas/Owner"}
            }
        }));
        assert!(schema.is_object());
        assert_eq!(schema.required, vec!["name"]);
        assert_eq!(schema.properties["name"].min_length, Some(3));
        assert_eq!(schema.properties["tag"].enum_values, vec![json!("cat"), json!("dog")]);
        assert_eq!(schema.properties["owner"].ref_name(), Some("Owner"));
    }

    #[test]
    fn type_list_prefers_non_null() {
        let schema = parse(json!({"type": ["null", "integer"]}));
        assert_eq!(schema.kind(), Some(SchemaKind::Integer));
        let only_null = parse(json!({"type": ["null"]}));
        assert_eq!(only_null.kind(), Some(SchemaKind::Null));
    }

    #[test]
    fn unknown_keywords_and_types_are_tolerated() {
        let schema = parse(json!({"type": "file", "x-internal": true, "readOnly": true}));
        assert!(schema.has_type());
        assert_eq!(schema.kind(), None);
    }

    #[test]
    fn additional_properties_flag_or_schema() {
        let open = parse(json!({"type": "object", "additionalProperties": true}));
        assert!(!open.is_map());
        let map = parse(json!({"type": "object", "additionalProperties": {"type": "integer"}}));
        assert!(map.is_map());
        assert!(map.additional_properties_schema().unwrap().is_integer());
    }

    #[test]
    fn discriminator_key_for_reference() {
        let schema = parse(json!({
            "discriminator": {
                "propertyName": "type",
                "mapping": {
                    "circle": "#/components/schemas/Circle",
                    "square": "#/components/schemas/Square"
                }
            }
        }));
        let d = schema.discriminator.unwrap();
        assert_eq!(d.key_for("#/components/schemas/Square"), Some("square"));
        assert_eq!(d.key_for("circle"), Some("circle"));
        assert_eq!(d.key_for("Triangle"), None);
    }

    #[test]
    fn null_schema_detection() {
        assert!(parse(json!({})).is_null_schema());
        assert!(parse(json!({"type": "null"})).is_null_schema());
        assert!(!parse(json!({"type": "string"})).is_null_schema());
        assert!(!parse(json!({"$ref": "#/components/schemas/A"})).is_null_schema());
        assert!(!parse(json!({"properties": {"a": {"type": "string"}}})).is_null_schema());
    }

    #[test]
    fn format_predicates() {
        assert!(parse(json!({"type": "string", "format": "date"})).is_date());
        assert!(parse(json!({"type": "string", "format": "date-time"})).is_date_time());
        assert!(parse(json!({"type": "string", "format": "byte"})).is_binary());
        assert!(parse(json!({"type": "string", "format": "number"})).is_decimal());
        assert!(parse(json!({"type": "integer", "format": "int32"})).is_short_integer());
        assert!(!parse(json!({"type": "integer", "format": "int64"})).is_short_integer());
    }

    #[test]
    fn simple_ref_strips_path() {
        assert_eq!(simple_ref("#/components/schemas/Pet"), "Pet");
        assert_eq!(simple_ref("Pet"), "Pet");
    }
}

//! Schema registry: `$ref` resolution, derived schemas and diagnostics
//!
//! The engine consumes the registry through [`SchemaRegistry`]. Reads take
//! `&self`; the four methods that record state during generation take
//! `&mut self`, so sharing one registry across threads needs
//! [`SharedRegistry`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::schema::{COMPONENTS_SCHEMAS_PREFIX, Discriminator, Schema, simple_ref};

const COMPONENTS_EXAMPLES_PREFIX: &str = "#/components/examples/";
/// Pointer-to-pointer `$ref` hops followed before a chain counts as a loop.
const MAX_POINTER_HOPS: usize = 32;
const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Registry operations used by the generator.
pub trait SchemaRegistry {
    /// Look up a schema by simple name, component ref or JSON-pointer ref.
    fn resolve(&self, name: &str) -> Option<Arc<Schema>>;

    /// Follow a JSON-pointer ref to a raw document value.
    fn resolve_object_from_path_reference(&self, reference: &str) -> Option<Value>;

    fn register_schema(&mut self, name: &str, schema: Schema);

    fn record_discriminator(&mut self, discriminator: Discriminator);

    fn discriminators(&self) -> BTreeSet<Discriminator>;

    /// Previously generated open-map example for a value-schema key.
    ///
    /// Keys identify the map's value schema (its `$ref`, or its location in
    /// the document), never a bare property name.
    fn cached_additional_properties(&self, key: &str) -> Option<Value>;

    fn cache_additional_properties(&mut self, key: &str, value: Value);

    fn record_error(&mut self, message: String);

    fn errors(&self) -> Vec<String>;
}

impl<R: SchemaRegistry + ?Sized> SchemaRegistry for &mut R {
    fn resolve(&self, name: &str) -> Option<Arc<Schema>> {
        (**self).resolve(name)
    }

    fn resolve_object_from_path_reference(&self, reference: &str) -> Option<Value> {
        (**self).resolve_object_from_path_reference(reference)
    }

    fn register_schema(&mut self, name: &str, schema: Schema) {
        (**self).register_schema(name, schema);
    }

    fn record_discriminator(&mut self, discriminator: Discriminator) {
        (**self).record_discriminator(discriminator);
    }

    fn discriminators(&self) -> BTreeSet<Discriminator> {
        (**self).discriminators()
    }

    fn cached_additional_properties(&self, key: &str) -> Option<Value> {
        (**self).cached_additional_properties(key)
    }

    fn cache_additional_properties(&mut self, key: &str, value: Value) {
        (**self).cache_additional_properties(key, value);
    }

    fn record_error(&mut self, message: String) {
        (**self).record_error(message);
    }

    fn errors(&self) -> Vec<String> {
        (**self).errors()
    }
}

// ── In-memory registry ──

/// Registry backed by a parsed OpenAPI document.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    document: Value,
    schemas: BTreeMap<String, Arc<Schema>>,
    discriminators: BTreeSet<Discriminator>,
    additional_properties: HashMap<String, Value>,
    errors: Vec<String>,
}

impl ComponentRegistry {
    /// Build from a parsed document, loading every `components.schemas` entry.
    ///
    /// Entries that do not deserialize are skipped and recorded as diagnostics.
    ///
    /// # Errors
    ///
    /// Returns error if `components.schemas` is present but not a mapping.
    pub fn from_document(document: Value) -> Result<Self, RegistryError> {
        let mut registry = Self {
            document,
            ..Self::default()
        };

        let entries = match registry.document.pointer("/components/schemas") {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(RegistryError::InvalidSchema(
                    "components.schemas".to_string(),
                    "expected a mapping".to_string(),
                ));
            }
        };

        for (name, value) in entries {
            match parse_schema(&name, value) {
                Ok(schema) => {
                    registry.schemas.insert(name, Arc::new(schema));
                }
                Err(e) => {
                    tracing::warn!(schema = %name, "skipping unreadable schema");
                    registry.errors.push(e.to_string());
                }
            }
        }
        tracing::debug!(count = registry.schemas.len(), "loaded component schemas");
        Ok(registry)
    }

    /// Read and parse an OpenAPI document (JSON or YAML) from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Io(format!("{}: {e}", path.display())))?;
        Self::from_document(parse_document(path, &content)?)
    }

    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Names of all registered schemas, sorted.
    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Wrap in a lock for use across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedRegistry {
        SharedRegistry::new(self)
    }

    fn resolve_within(&self, name: &str, hops: usize) -> Option<Arc<Schema>> {
        if let Some(simple) = name.strip_prefix(COMPONENTS_SCHEMAS_PREFIX) {
            if !simple.contains('/') {
                return self.schemas.get(simple).cloned();
            }
        }
        if name.starts_with("#/") {
            return self.resolve_pointer(name, hops);
        }
        self.schemas.get(name).cloned()
    }

    fn resolve_pointer(&self, reference: &str, hops: usize) -> Option<Arc<Schema>> {
        if hops >= MAX_POINTER_HOPS {
            tracing::warn!(reference, "pointer reference chain too long, giving up");
            return None;
        }
        let value = self.document.pointer(reference.strip_prefix('#')?)?;
        let value = parameter_schema(value).unwrap_or(value);
        if let Some(inner) = value.get("$ref").and_then(Value::as_str) {
            if inner != reference {
                return self.resolve_within(inner, hops + 1);
            }
        }
        serde_json::from_value::<Schema>(value.clone())
            .ok()
            .map(Arc::new)
    }
}

impl SchemaRegistry for ComponentRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<Schema>> {
        self.resolve_within(name, 0)
    }

    fn resolve_object_from_path_reference(&self, reference: &str) -> Option<Value> {
        let value = self.document.pointer(reference.strip_prefix('#')?)?;
        if reference.starts_with(COMPONENTS_EXAMPLES_PREFIX) {
            if let Some(inner) = value.get("value") {
                return Some(inner.clone());
            }
        }
        Some(value.clone())
    }

    fn register_schema(&mut self, name: &str, mut schema: Schema) {
        schema.name = Some(name.to_string());
        self.schemas.insert(name.to_string(), Arc::new(schema));
    }

    fn record_discriminator(&mut self, discriminator: Discriminator) {
        self.discriminators.insert(discriminator);
    }

    fn discriminators(&self) -> BTreeSet<Discriminator> {
        self.discriminators.clone()
    }

    fn cached_additional_properties(&self, key: &str) -> Option<Value> {
        self.additional_properties.get(key).cloned()
    }

    fn cache_additional_properties(&mut self, key: &str, value: Value) {
        self.additional_properties.insert(key.to_string(), value);
    }

    fn record_error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn errors(&self) -> Vec<String> {
        self.errors.clone()
    }
}

// ── Shared registry ──

/// A [`ComponentRegistry`] behind a read/write lock.
///
/// Cloning is cheap; every clone sees the same registry. Each worker owns
/// its own generator and a clone of this handle.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<ComponentRegistry>>,
}

impl SharedRegistry {
    #[must_use]
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&ComponentRegistry) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut ComponentRegistry) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl SchemaRegistry for SharedRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<Schema>> {
        self.read(|r| r.resolve(name))
    }

    fn resolve_object_from_path_reference(&self, reference: &str) -> Option<Value> {
        self.read(|r| r.resolve_object_from_path_reference(reference))
    }

    fn register_schema(&mut self, name: &str, schema: Schema) {
        self.write(|r| r.register_schema(name, schema));
    }

    fn record_discriminator(&mut self, discriminator: Discriminator) {
        self.write(|r| r.record_discriminator(discriminator));
    }

    fn discriminators(&self) -> BTreeSet<Discriminator> {
        self.read(|r| r.discriminators())
    }

    fn cached_additional_properties(&self, key: &str) -> Option<Value> {
        self.read(|r| r.cached_additional_properties(key))
    }

    fn cache_additional_properties(&mut self, key: &str, value: Value) {
        self.write(|r| r.cache_additional_properties(key, value));
    }

    fn record_error(&mut self, message: String) {
        self.write(|r| r.record_error(message));
    }

    fn errors(&self) -> Vec<String> {
        self.read(|r| r.errors())
    }
}

// ── Document helpers ──

/// Deserialize one named component schema.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidSchema`] if the value is not a schema object.
pub fn parse_schema(name: &str, value: Value) -> Result<Schema, RegistryError> {
    let mut schema: Schema = serde_json::from_value(value)
        .map_err(|e| RegistryError::InvalidSchema(name.to_string(), e.to_string()))?;
    schema.name = Some(name.to_string());
    Ok(schema)
}

/// Parse document text, choosing JSON or YAML by extension, then by content.
///
/// # Errors
///
/// Returns [`RegistryError::Parse`] on malformed input.
pub fn parse_document(path: &Path, content: &str) -> Result<Value, RegistryError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let as_json = |c: &str| -> Result<Value, RegistryError> {
        serde_json::from_str(c).map_err(|e| RegistryError::Parse(format!("Invalid JSON: {e}")))
    };
    let as_yaml = |c: &str| -> Result<Value, RegistryError> {
        serde_yml::from_str(c).map_err(|e| RegistryError::Parse(format!("Invalid YAML: {e}")))
    };

    match ext.as_str() {
        "yaml" | "yml" => as_yaml(content),
        "json" => as_json(content),
        _ if content.trim_start().starts_with('{') => as_json(content),
        _ => as_yaml(content),
    }
}

/// Reference to the JSON request body schema of `METHOD path`.
///
/// Returns the body's own `$ref` when it has one, otherwise a JSON pointer to
/// the inline schema. `requestBody` refs into `components/requestBodies` are
/// followed one level.
#[must_use]
pub fn request_body_schema(document: &Value, path: &str, method: &str) -> Option<String> {
    let (pointer, media) = json_media_type(document, path, method)?;
    let schema = media.get("schema")?;
    match schema.get("$ref").and_then(Value::as_str) {
        Some(reference) => Some(reference.to_string()),
        None => Some(format!("{pointer}/schema")),
    }
}

/// Example attached to the JSON request body media type of `METHOD path`.
///
/// Uses `example` first, then the first entry of `examples` (following refs
/// into `components/examples`).
#[must_use]
pub fn request_body_example(document: &Value, path: &str, method: &str) -> Option<Value> {
    let (_, media) = json_media_type(document, path, method)?;
    if let Some(example) = media.get("example") {
        return Some(example.clone());
    }
    let (_, first) = media.get("examples")?.as_object()?.iter().next()?;
    match first.get("$ref").and_then(Value::as_str) {
        Some(reference) => {
            let target = document.pointer(reference.strip_prefix('#')?)?;
            target.get("value").cloned()
        }
        None => first.get("value").cloned(),
    }
}

/// All `(METHOD, path)` pairs with a JSON request body, in document order.
#[must_use]
pub fn operations_with_body(document: &Value) -> Vec<(String, String)> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    let mut ops = Vec::new();
    for (path, item) in paths {
        for method in HTTP_METHODS {
            if item.get(method).is_some() && json_media_type(document, path, method).is_some() {
                ops.push((method.to_ascii_uppercase(), path.clone()));
            }
        }
    }
    ops
}

fn json_media_type<'a>(
    document: &'a Value,
    path: &str,
    method: &str,
) -> Option<(String, &'a Value)> {
    let method = method.to_ascii_lowercase();
    let mut pointer = format!("#/paths/{}/{method}/requestBody", escape_pointer(path));
    let mut body = document.pointer(pointer.strip_prefix('#')?)?;

    if let Some(reference) = body.get("$ref").and_then(Value::as_str) {
        body = document.pointer(reference.strip_prefix('#')?)?;
        pointer = reference.to_string();
    }

    let content = body.get("content")?.as_object()?;
    let (media_type, media) = content
        .get_key_value("application/json")
        .or_else(|| content.iter().find(|(ct, _)| ct.contains("json")))?;
    Some((
        format!("{pointer}/content/{}", escape_pointer(media_type)),
        media,
    ))
}

/// A parameter object (`in` + `schema`) stands for its schema.
fn parameter_schema(value: &Value) -> Option<&Value> {
    value.get("in")?;
    value.get("schema")
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Simple name of a component ref, or the ref itself for other pointers.
#[must_use]
pub fn display_ref(reference: &str) -> &str {
    if reference.starts_with(COMPONENTS_SCHEMAS_PREFIX) || !reference.starts_with("#/") {
        simple_ref(reference)
    } else {
        reference
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid schema '{0}': {1}")]
    InvalidSchema(String, String),
}

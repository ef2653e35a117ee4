//! Generator configuration

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How `anyOf`/`oneOf` branches with several candidates are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMode {
    /// One example set per branch, unmerged.
    #[default]
    Multiple,
    /// All branches merged into a single map; colliding keys become a list.
    Flatten,
}

/// Settings consumed by the generator at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratorConfig {
    /// How many times a schema may reference itself along one path
    pub self_reference_depth: usize,

    /// Global trail ceiling (0 = unbounded)
    pub max_depth: usize,

    /// Array size hint, clamped into `[minItems, maxItems]`
    pub array_size: usize,

    /// Combinatorial cap on every example set
    pub max_examples: usize,

    /// Use `example` attached to named schemas
    pub use_schema_examples: bool,

    /// Use `example` attached to individual properties
    pub use_property_examples: bool,

    /// Use `example` attached to request bodies
    pub use_request_body_examples: bool,

    /// Use schema `default` values
    pub use_defaults: bool,

    /// Rendering of anyOf/oneOf alternatives
    pub composition: CompositionMode,

    /// RNG seed for reproducible output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            self_reference_depth: 4,
            max_depth: 50,
            array_size: 2,
            max_examples: 500,
            use_schema_examples: true,
            use_property_examples: true,
            use_request_body_examples: true,
            use_defaults: true,
            composition: CompositionMode::Multiple,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from the first default location found in `dir`, else defaults.
    pub fn load_default_in(dir: &Path) -> Result<Self, ConfigError> {
        for name in [".apiseed.toml", ".apiseed.json", "apiseed.toml"] {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load from the working directory (`.apiseed.toml` and friends)
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_default_in(Path::new("."))
    }

    /// Depth bound used by the fallback serializer.
    #[must_use]
    pub fn serializer_depth(&self) -> usize {
        (self.self_reference_depth * 6).max(1)
    }

    /// Example config file
    pub fn example() -> &'static str {
        r#"# apiseed configuration

# How many times a schema may reference itself along one path
self_reference_depth = 4

# Safety ceiling on trail depth (0 = unbounded)
max_depth = 50

# Array size hint, clamped into [minItems, maxItems]
array_size = 2

# Upper bound on alternative payloads per schema
max_examples = 500

# Explicit examples and defaults
use_schema_examples = true
use_property_examples = true
use_request_body_examples = true
use_defaults = true

# anyOf/oneOf rendering: "multiple" (one payload per branch) or "flatten"
composition = "multiple"

# Fixed seed for reproducible output
# seed = 42
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// JSON Schema of [`GeneratorConfig`], pretty-printed.
pub fn config_schema() -> String {
    let schema = schemars::schema_for!(GeneratorConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

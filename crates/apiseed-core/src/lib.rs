//! apiseed-core: schema model, configuration and registry for example synthesis
//!
//! This crate holds everything the synthesis engine consumes: the typed
//! schema node deserialized from an OpenAPI document, the generator settings,
//! and the registry that resolves `$ref`s and collects diagnostics.

pub mod config;
pub mod registry;
pub mod schema;

pub use config::{CompositionMode, ConfigError, GeneratorConfig, config_schema};
pub use registry::{
    ComponentRegistry, RegistryError, SchemaRegistry, SharedRegistry, parse_document,
    request_body_example, request_body_schema,
};
pub use schema::{AdditionalProperties, Discriminator, Schema, SchemaKind, TypeDecl, simple_ref};

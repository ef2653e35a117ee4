//! apiseed-engine: example payload synthesis for OpenAPI schemas
//!
//! [`Generator`] walks a schema from a [`apiseed_core::SchemaRegistry`] and
//! returns the combinatorial set of example payloads it describes: one value
//! per enum/alternative branch, cross-multiplied across properties and capped
//! by the configured limit. Recursion is bounded by the cycle guard, never by
//! stack exhaustion.

pub mod combinator;
pub mod composition;
pub mod context;
pub mod cycle;
pub mod format;
pub mod generator;
pub mod pattern;
pub mod primitive;
pub mod serialize;

pub use context::GenerationContext;
pub use format::{DefaultFormats, FormatError, FormatSynthesizer};
pub use generator::{EMPTY_PAYLOAD, GenerateError, Generator};
pub use pattern::{PATTERN_PLACEHOLDER, PatternError};
pub use serialize::SerializeError;

//! Error types for the transformation compiler.

use api_design_core::Kind;
use thiserror::Error;

fn shape(kind: &Kind) -> &'static str {
    match kind {
        Kind::Object => "an object",
        Kind::Array => "an array",
        Kind::Map => "a map",
        _ => "a primitive",
    }
}

/// Reasons a transform cannot be compiled.
///
/// Compilation stops at the first of these; no partial plan is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Only objects, arrays and maps are compiled.
    #[error("cannot transform primitive type {0}")]
    PrimitiveTransform(String),

    /// The two top-level types have different shapes.
    #[error("source is {} but target type is {target_type}", shape(.source_kind))]
    ShapeMismatch { source_kind: Kind, target_type: String },

    #[error(
        "incompatible attribute types: {source_ctx} is of type {source_type} but {target_ctx} is of type {target_type}"
    )]
    IncompatibleTypes {
        source_ctx: String,
        source_type: String,
        target_ctx: String,
        target_type: String,
    },

    #[error(
        "incompatible attribute types: {source_ctx} is an array with elements of type {source_type} but {target_ctx} is an array with elements of type {target_type}"
    )]
    IncompatibleArrayElements {
        source_ctx: String,
        source_type: String,
        target_ctx: String,
        target_type: String,
    },

    #[error(
        "incompatible attribute types: {source_ctx} is a map with keys of type {source_type} but {target_ctx} is a map with keys of type {target_type}"
    )]
    IncompatibleMapKeys {
        source_ctx: String,
        source_type: String,
        target_ctx: String,
        target_type: String,
    },

    #[error(
        "incompatible attribute types: {source_ctx} is a map with elements of type {source_type} but {target_ctx} is a map with elements of type {target_type}"
    )]
    IncompatibleMapElements {
        source_ctx: String,
        source_type: String,
        target_ctx: String,
        target_type: String,
    },

    /// A transform key was declared without a value.
    #[error("invalid transform key: missing value on attribute {field} of {context}")]
    EmptyTransformKey { field: String, context: String },

    /// A required target field has no source counterpart.
    #[error("required field {field} of {context} has no matching source field")]
    UnmatchedRequired { field: String, context: String },

    /// A named type handle does not exist in the design.
    #[error("unknown {0} type")]
    UnknownType(&'static str),

    #[error("{0} has no type")]
    MissingType(String),
}

/// Errors reading or writing transform configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`TransformError`].
pub type Result<T> = std::result::Result<T, TransformError>;

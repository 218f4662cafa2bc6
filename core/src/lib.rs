//! Core model and validation for HTTP API designs.
//!
//! This crate defines the in-memory description of an API and checks it for
//! structural consistency before code generation:
//!
//! - [`Design`]: root of an API description. Owns the attribute, user type
//!   and media type arenas plus resources, shared responses and encodings.
//! - [`Attribute`] and [`DataType`]: typed value nodes (primitives, objects,
//!   arrays, maps and references to named types).
//! - [`Resource`], [`Action`], [`Route`]: the HTTP surface.
//! - [`MediaType`] with its [`View`]s and [`Link`]s.
//!
//! Validation ([`validate_design`], [`validate_design_with`]) reports every
//! problem it finds in one [`ValidationErrors`] value, including wildcard
//! naming conflicts between overlapping routes ([`find_route_conflicts`]).
//! Recursive type graphs are handled by validating each attribute once per
//! run.
//!
//! # Example
//!
//! ```
//! use api_design_core::*;
//!
//! let mut design = Design::new("cellar");
//! let id = design.add_attribute(Attribute::primitive(Primitive::Integer));
//! let name = design.add_attribute(Attribute::primitive(Primitive::String));
//! let bottle = design.add_attribute(
//!     Attribute::object([("id", id), ("name", name)]).with_required(["id", "vintage"]),
//! );
//! design.add_user_type("Bottle", bottle);
//!
//! let errors = validate_design(&design).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(
//!     errors.to_string(),
//!     "type \"Bottle\": required field \"vintage\" does not exist"
//! );
//! ```

mod config;
mod design;
mod encoding;
mod error;
mod path;
mod routes;
mod types;
mod validate;

pub use config::ValidationConfig;
pub use design::*;
pub use encoding::{KNOWN_ENCODERS, MediaTypeError, ParsedMediaType, parse_media_type};
pub use error::{DesignError, Result as DesignResult};
pub use path::{
    WILDCARD_PLACEHOLDER, clean_path, extract_wildcards, is_absolute, join_paths, route_key,
};
pub use routes::{
    DuplicateWildcard, RouteConflict, RouteInfo, Wildcard, WildcardConflict, WildcardSource,
    find_duplicate_wildcards, find_route_conflicts, route_infos,
};
pub use types::*;
pub use validate::{
    ValidationError, ValidationErrorKind, ValidationErrors, Validator, validate_design,
    validate_design_with,
};

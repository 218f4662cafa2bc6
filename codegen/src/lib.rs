//! Type transformation plans for API design code generators.
//!
//! Given two named types of a [`Design`](api_design_core::Design), this crate
//! decides how to populate the target from the source:
//!
//! - [`compute_mapping`]: matches object fields by name or by their declared
//!   transform key.
//! - [`compile_transform`]: recursively compiles a [`TransformPlan`] for
//!   objects, arrays and maps, failing on the first incompatible pair with a
//!   [`TransformError`] naming both paths.
//! - [`transform_name`]: names the generated conversion function.
//!
//! Turning a plan into source text is left to the caller; plans serialize to
//! JSON for that purpose.
//!
//! # Example
//!
//! ```
//! use api_design_codegen::*;
//! use api_design_core::{Attribute, Design, NamedTypeRef, Primitive};
//!
//! let mut design = Design::new("api");
//! let id = design
//!     .add_attribute(Attribute::primitive(Primitive::String).with_transform_key("uid"));
//! let uid = design.add_attribute(Attribute::primitive(Primitive::String));
//! let user = design.add_attribute(Attribute::object([("id", id)]));
//! let row = design.add_attribute(Attribute::object([("uid", uid)]));
//! let user = NamedTypeRef::User(design.add_user_type("User", user));
//! let row = NamedTypeRef::User(design.add_user_type("UserRow", row));
//!
//! let name = transform_name("User", "UserRow", "");
//! let plan = compile_transform(&design, &TransformRequest::new(user, row, &name)).unwrap();
//! assert_eq!(plan.function_name, "UserToUserRow");
//! assert_eq!(plan.body.as_object().unwrap().field_pairs(), vec![("id", "uid")]);
//! ```

mod config;
mod error;
mod mapping;
mod naming;
mod plan;
mod transform;

pub use config::{TransformConfig, UnmatchedRequiredPolicy};
pub use error::{ConfigError, TransformError};
pub use mapping::compute_mapping;
pub use naming::{camel_case, transform_name};
pub use plan::*;
pub use transform::{compile_transform, compile_transform_with};

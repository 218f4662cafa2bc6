//! Design validation.
//!
//! Checks the structural consistency of a whole [`Design`]: names are set,
//! references resolve, required fields exist, routes agree on wildcard
//! names, media types define their views and links correctly and encodings
//! name known MIME types. Every check runs; all problems are collected into
//! one [`ValidationErrors`] value so a user sees them in a single pass.
//!
//! Type references may form cycles. A [`Validator`] keeps the set of
//! attributes it has already checked and skips them on later visits, so
//! every distinct attribute is validated exactly once per run and the
//! traversal terminates.
//!
//! # Examples
//!
//! ```
//! use api_design_core::*;
//!
//! let mut design = Design::new("api");
//! design.resources.push(Resource::new("", "/things"));
//!
//! let errors = validate_design(&design).unwrap_err();
//! assert!(errors
//!     .iter()
//!     .any(|e| matches!(e.kind, ValidationErrorKind::EmptyResourceName)));
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::design::{
    Action, DEFAULT_VIEW, Design, Encoding, Link, MediaType, Resource, Response, UserType,
};
use crate::encoding::{MediaTypeError, parse_media_type};
use crate::path::extract_wildcards;
use crate::routes::{RouteConflict, find_duplicate_wildcards, find_route_conflicts};
use crate::types::{Attribute, AttributeId, DataType, Kind, Object};

fn prefix(ctx: &str) -> String {
    if ctx.is_empty() {
        String::new()
    } else {
        format!("{ctx} - ")
    }
}

/// Specific problem found during validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    /// A contact, license or docs URL is not an absolute URI.
    #[error("invalid {field} URL value {url:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        reason: String,
    },
    /// API base params resolve to something other than an object.
    #[error("base parameters must be an object")]
    BaseParamsNotObject,

    /// A resource has an empty name.
    #[error("resource name cannot be empty")]
    EmptyResourceName,
    /// The canonical action name does not match any action of the resource.
    #[error("unknown canonical action {0:?}")]
    UnknownCanonicalAction(String),
    /// The parent name matches no resource of the design.
    #[error("parent resource named {0:?} not found")]
    ParentNotFound(String),
    /// The parent has no canonical action to build child paths from.
    #[error("parent resource {0:?} has no canonical action")]
    ParentWithoutCanonicalAction(String),
    /// Following parent names leads back to the resource.
    #[error("parent resource cycle detected: {0}")]
    ParentCycle(String),
    /// Resource base params resolve to something other than an object.
    #[error("invalid type for base params, must be an object")]
    BaseParamsInvalidType,
    /// Base path wildcards and base params fields differ in number.
    #[error(
        "base path defines parameters {} but base params has {count} elements",
        .wildcards.join(", ")
    )]
    BaseParamsCountMismatch { wildcards: Vec<String>, count: usize },
    /// A base path wildcard has no matching base params field.
    #[error(
        "variable {wildcard} from base path {base_path} does not match any parameter from base params"
    )]
    UnknownBaseParam { wildcard: String, base_path: String },
    /// Base params are declared but the base path has no wildcards.
    #[error("base path does not use variables defined in base params")]
    UnusedBaseParams,

    /// An action has an empty name.
    #[error("action name cannot be empty")]
    EmptyActionName,
    /// An action declares no route.
    #[error("no route defined for action")]
    NoRoutes,
    /// The action's back-reference does not name the resource holding it.
    #[error("missing parent resource")]
    MissingParentResource,
    /// Two responses of one action share a status code.
    #[error("multiple response definitions with status code {0}")]
    DuplicateStatus(u16),
    /// Action params resolve to something other than an object.
    #[error("\"params\" field of action is not an object")]
    ParamsNotObject,
    /// A params field has an empty name.
    #[error("action has parameter with no name")]
    UnnamedParam,
    /// A parameter field points at no attribute.
    #[error("definition of parameter {0} cannot be nil")]
    MissingParamDefinition(String),
    /// A parameter attribute has no type.
    #[error("type of parameter {0} cannot be nil")]
    MissingParamType(String),
    /// A parameter is an object; only payloads may be.
    #[error("parameter {0} cannot be an object, only action payloads may be of type object")]
    ObjectParam(String),
    /// A route redeclares a wildcard already bound by its resource path.
    #[error(
        "duplicate wildcard {wildcard:?} in resource base path {resource_path:?} and action route {route_path:?}"
    )]
    DuplicateWildcard {
        wildcard: String,
        resource_path: String,
        route_path: String,
    },
    /// Overlapping routes name a shared wildcard differently.
    #[error("{0}")]
    RouteConflict(RouteConflict),
    /// The route's back-reference does not name the action holding it.
    #[error("missing route parent action")]
    MissingRouteParent,

    /// An attribute handle points at nothing.
    #[error("{}attribute definition is missing", prefix(.0))]
    MissingAttribute(String),
    /// An attribute has no type.
    #[error("{}attribute type is nil", prefix(.0))]
    MissingAttributeType(String),
    /// A user type or media type reference does not resolve.
    #[error("{}unknown named type", prefix(.0))]
    UnknownNamedType(String),
    /// A required field name is not a field of the object.
    #[error("{}required field {field:?} does not exist", prefix(.attribute))]
    MissingRequiredField { attribute: String, field: String },
    /// The declared pattern is not a valid regular expression.
    #[error("{}invalid pattern {pattern:?}: {reason}", prefix(.attribute))]
    InvalidPattern {
        attribute: String,
        pattern: String,
        reason: String,
    },
    /// Numeric minimum exceeds maximum.
    #[error("{}minimum {minimum} is greater than maximum {maximum}", prefix(.attribute))]
    InvalidRange {
        attribute: String,
        minimum: f64,
        maximum: f64,
    },
    /// Minimum length exceeds maximum length.
    #[error(
        "{}minimum length {min_length} is greater than maximum length {max_length}",
        prefix(.attribute)
    )]
    InvalidLengthRange {
        attribute: String,
        min_length: usize,
        max_length: usize,
    },
    /// A user type or media type has an empty type name.
    #[error("{}user type must have a name", prefix(.0))]
    EmptyTypeName(String),

    /// A collection media type element points at nothing.
    #[error("array element type is nil")]
    MissingArrayElement,
    /// Elements of a collection media type must themselves be media types.
    #[error("collection media type array element type must be a media type, got {0}")]
    CollectionElementNotMediaType(String),
    /// A field names a view but is not typed by a media type.
    #[error(
        "attribute {0} of media type defines a view for rendering but its type is not a media type"
    )]
    ViewOnNonMediaType(String),
    /// The view an attribute renders with is not defined on its media type.
    #[error("attribute {attribute} of media type uses unknown view {view:?}")]
    UnknownView { attribute: String, view: String },
    /// A non-collection media type lacks the `default` view.
    #[error("media type does not define the default view")]
    MissingDefaultView,
    /// A view renders a field its media type does not have.
    #[error("view {view:?} references unknown attribute {field:?}")]
    UnknownViewField { view: String, field: String },

    /// A link has an empty name.
    #[error("links must have a name")]
    EmptyLinkName,
    /// Links are declared on a media type that does not render an object.
    #[error("link parent media type must be an object")]
    LinkParentNotObject,
    /// The link name is not a field of the media type.
    #[error("link name {0:?} must match one of the parent media type attribute names")]
    UnknownLinkAttribute(String),
    /// The linked attribute is not typed by a media type.
    #[error("attribute {0} must be a media type")]
    LinkTargetNotMediaType(String),
    /// The link view is not defined on the linked media type.
    #[error("view {view:?} does not exist on target media type {media_type:?}")]
    UnknownLinkView { view: String, media_type: String },

    /// Status code is zero.
    #[error("response status not defined")]
    MissingStatus,
    /// No media type of the design has this identifier.
    #[error("unknown media type {0:?}")]
    UnknownMediaType(String),

    /// An encoding lists no MIME types.
    #[error("missing MIME type")]
    MissingMimeType,
    /// A declared MIME type does not parse.
    #[error("invalid MIME type {mime_type:?}: {reason}")]
    InvalidMimeType {
        mime_type: String,
        reason: MediaTypeError,
    },
    /// No built-in encoder handles the MIME type and no package is given.
    #[error(
        "encoder not known for MIME type {mime_type:?}, specify an encoder package. MIME types with known encoders are {}",
        .known.join(", ")
    )]
    UnknownEncoder { mime_type: String, known: Vec<String> },
    /// A factory function is named without the package providing it.
    #[error("must specify encoder package with package path")]
    FunctionWithoutPackage,
}

/// One diagnostic: where it happened and what is wrong.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{context}: {kind}")]
pub struct ValidationError {
    /// Nearest enclosing named definition.
    pub context: String,
    /// What is wrong.
    pub kind: ValidationErrorKind,
}

/// Non-empty collection of diagnostics produced by one validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always `false`; an empty run yields `Ok(())` instead.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Validates a design with the default configuration.
///
/// Returns `Ok(())` when the design is consistent and every diagnostic
/// otherwise.
pub fn validate_design(design: &Design) -> Result<(), ValidationErrors> {
    validate_design_with(design, &ValidationConfig::default())
}

/// Validates a design with the given configuration.
pub fn validate_design_with(
    design: &Design,
    config: &ValidationConfig,
) -> Result<(), ValidationErrors> {
    Validator::new(design, config).run()
}

/// One validation pass over a design.
///
/// The set of already validated attributes belongs to the validator and is
/// cleared at the start of every [`run`](Validator::run), so independent
/// passes never share state.
///
/// # Examples
///
/// ```
/// use api_design_core::*;
///
/// let mut design = Design::new("api");
/// // Node -> children: [Node]
/// let node = design.add_attribute(Attribute::untyped());
/// let node_type = design.add_user_type("Node", node);
/// let child = design.add_attribute(Attribute::user_type(node_type));
/// let children = design.add_attribute(Attribute::array(child));
/// design.attribute_mut(node).unwrap().data_type =
///     Some(DataType::Object([("children".to_string(), children)].into()));
///
/// let config = ValidationConfig::default();
/// let mut validator = Validator::new(&design, &config);
/// assert!(validator.run().is_ok());
/// assert_eq!(validator.visited_count(), 3);
/// ```
pub struct Validator<'a> {
    design: &'a Design,
    config: &'a ValidationConfig,
    validated: HashSet<AttributeId>,
    errors: Vec<ValidationError>,
}

impl<'a> Validator<'a> {
    pub fn new(design: &'a Design, config: &'a ValidationConfig) -> Self {
        Self {
            design,
            config,
            validated: HashSet::new(),
            errors: Vec::new(),
        }
    }

    /// Number of distinct attributes checked by the last run.
    pub fn visited_count(&self) -> usize {
        self.validated.len()
    }

    /// Returns `true` if the last run checked `id`.
    pub fn visited(&self, id: AttributeId) -> bool {
        self.validated.contains(&id)
    }

    /// Validates the whole design.
    pub fn run(&mut self) -> Result<(), ValidationErrors> {
        self.validated.clear();
        self.errors.clear();
        let design = self.design;
        debug!(api = %design.name, resources = design.resources.len(), "Validating design");

        let api = design.context();
        if let Some(base_params) = design.base_params {
            self.validate_attribute(base_params, "base parameters", &api);
            if design.attribute(base_params).is_some() && design.object_of(base_params).is_none() {
                self.add(&api, ValidationErrorKind::BaseParamsNotObject);
            }
        }
        self.validate_url(&api, "contact", design.contact.as_ref().and_then(|c| c.url.as_deref()));
        self.validate_url(&api, "license", design.license.as_ref().and_then(|l| l.url.as_deref()));
        self.validate_url(&api, "docs", design.docs.as_ref().and_then(|d| d.url.as_deref()));

        for resource in &design.resources {
            self.validate_resource(resource);
        }
        for duplicate in find_duplicate_wildcards(design) {
            self.add(
                &duplicate.context,
                ValidationErrorKind::DuplicateWildcard {
                    wildcard: duplicate.wildcard,
                    resource_path: duplicate.resource_path,
                    route_path: duplicate.route_path,
                },
            );
        }
        for conflict in find_route_conflicts(design) {
            let context = conflict.context.clone();
            self.add(&context, ValidationErrorKind::RouteConflict(conflict));
        }

        for (_, media_type) in design.media_types() {
            self.validate_media_type(media_type);
        }
        for (_, user_type) in design.user_types() {
            self.validate_user_type(user_type, "", &user_type.context());
        }
        for response in design.responses.values() {
            self.validate_response(response);
        }
        for encoding in design.consumes.iter().chain(&design.produces) {
            self.validate_encoding(encoding);
        }

        debug!(
            visited = self.validated.len(),
            errors = self.errors.len(),
            "Design validation finished"
        );
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }

    fn add(&mut self, context: &str, kind: ValidationErrorKind) {
        self.errors.push(ValidationError {
            context: context.to_string(),
            kind,
        });
    }

    fn validate_url(&mut self, context: &str, field: &'static str, url: Option<&str>) {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return;
        };
        if let Err(e) = url::Url::parse(url) {
            self.add(
                context,
                ValidationErrorKind::InvalidUrl {
                    field,
                    url: url.to_string(),
                    reason: e.to_string(),
                },
            );
        }
    }

    fn validate_resource(&mut self, resource: &Resource) {
        let design = self.design;
        let ctx = resource.context();
        if resource.name.is_empty() {
            self.add(&ctx, ValidationErrorKind::EmptyResourceName);
        }

        for action in &resource.actions {
            self.validate_action(resource, action);
        }
        if let Some(canonical) = resource.canonical_action_name.as_deref() {
            if resource.find_action(canonical).is_none() {
                self.add(
                    &ctx,
                    ValidationErrorKind::UnknownCanonicalAction(canonical.to_string()),
                );
            }
        }

        if let Some(base_params) = resource.base_params {
            self.validate_base_params(resource, base_params);
        }
        if let Some(parent_name) = resource.parent_name.as_deref() {
            match design.find_resource(parent_name) {
                None => self.add(
                    &ctx,
                    ValidationErrorKind::ParentNotFound(parent_name.to_string()),
                ),
                Some(parent) if parent.canonical_action().is_none() => self.add(
                    &ctx,
                    ValidationErrorKind::ParentWithoutCanonicalAction(parent_name.to_string()),
                ),
                Some(_) => {}
            }
            if let Some(cycle) = parent_cycle(design, resource) {
                self.add(&ctx, ValidationErrorKind::ParentCycle(cycle));
            }
        }

        for response in resource.responses.values() {
            self.validate_response(response);
        }
        if let Some(params) = resource.params {
            self.validate_attribute(params, "resource parameters", &ctx);
        }
    }

    fn validate_base_params(&mut self, resource: &Resource, base_params: AttributeId) {
        let ctx = resource.context();
        self.validate_attribute(base_params, "base parameters", &ctx);
        let Some(params) = self.design.object_of(base_params) else {
            self.add(&ctx, ValidationErrorKind::BaseParamsInvalidType);
            return;
        };
        let wildcards = extract_wildcards(&resource.base_path);
        if wildcards.is_empty() {
            if !params.is_empty() {
                self.add(&ctx, ValidationErrorKind::UnusedBaseParams);
            }
            return;
        }
        if wildcards.len() != params.len() {
            self.add(
                &ctx,
                ValidationErrorKind::BaseParamsCountMismatch {
                    wildcards: wildcards.clone(),
                    count: params.len(),
                },
            );
        }
        for wildcard in wildcards {
            if !params.contains_key(&wildcard) {
                self.add(
                    &ctx,
                    ValidationErrorKind::UnknownBaseParam {
                        wildcard,
                        base_path: resource.base_path.clone(),
                    },
                );
            }
        }
    }

    fn validate_action(&mut self, resource: &Resource, action: &Action) {
        let ctx = resource.action_context(action);
        if action.name.is_empty() {
            self.add(&ctx, ValidationErrorKind::EmptyActionName);
        }
        if action.routes.is_empty() {
            self.add(&ctx, ValidationErrorKind::NoRoutes);
        }
        for route in &action.routes {
            if route.parent.as_deref() != Some(action.name.as_str()) {
                self.add(
                    &resource.route_context(action, route),
                    ValidationErrorKind::MissingRouteParent,
                );
            }
        }
        let docs = action.docs.as_ref().and_then(|d| d.url.as_deref());
        self.validate_url(&ctx, "action docs", docs);

        let mut statuses: BTreeMap<u16, usize> = BTreeMap::new();
        for response in action.responses.values() {
            *statuses.entry(response.status).or_default() += 1;
        }
        for response in action.responses.values() {
            if statuses.get(&response.status).copied().unwrap_or_default() > 1 {
                self.add(
                    &response.context(),
                    ValidationErrorKind::DuplicateStatus(response.status),
                );
            }
            self.validate_response(response);
        }

        if let Some(params) = action.params {
            self.validate_params(params, &ctx);
        }
        if let Some(payload) = action.payload {
            self.validate_attribute(payload, "action payload", &ctx);
        }
        if action.parent.as_deref() != Some(resource.name.as_str()) {
            self.add(&ctx, ValidationErrorKind::MissingParentResource);
        }
    }

    /// Checks action parameters: each must be named, defined, typed and not
    /// an object.
    fn validate_params(&mut self, params: AttributeId, ctx: &str) {
        let design = self.design;
        let Some(container) = design.attribute(params) else {
            self.add(ctx, ValidationErrorKind::MissingAttribute("params".to_string()));
            return;
        };
        let Some(fields) = design.object_of(params) else {
            self.add(ctx, ValidationErrorKind::ParamsNotObject);
            return;
        };
        if self.validated.insert(params) {
            self.check_required(container.required(), fields, "params", ctx);
        }

        for (name, &param) in fields {
            if name.is_empty() {
                self.add(ctx, ValidationErrorKind::UnnamedParam);
            }
            match design.attribute(param) {
                None => {
                    self.add(ctx, ValidationErrorKind::MissingParamDefinition(name.clone()));
                    continue;
                }
                Some(att) if att.data_type.is_none() => {
                    self.add(ctx, ValidationErrorKind::MissingParamType(name.clone()));
                    continue;
                }
                Some(_) => {}
            }
            if design.kind_of(param) == Some(Kind::Object) {
                self.add(ctx, ValidationErrorKind::ObjectParam(name.clone()));
            }
            self.validate_attribute(param, &format!("parameter {name}"), ctx);
        }
    }

    /// Validates an attribute and everything reachable from it.
    ///
    /// `attr_ctx` describes the attribute within `parent` (e.g. "field
    /// name") and prefixes attribute-level messages.
    fn validate_attribute(&mut self, id: AttributeId, attr_ctx: &str, parent: &str) {
        if !self.validated.insert(id) {
            return;
        }
        let design = self.design;
        let Some(attribute) = design.attribute(id) else {
            self.add(parent, ValidationErrorKind::MissingAttribute(attr_ctx.to_string()));
            return;
        };
        let Some(data_type) = attribute.data_type.as_ref() else {
            self.add(parent, ValidationErrorKind::MissingAttributeType(attr_ctx.to_string()));
            return;
        };
        self.check_rules(attribute, attr_ctx, parent);

        match data_type {
            DataType::Primitive(_) => {}
            DataType::Object(fields) => {
                self.check_required(attribute.required(), fields, attr_ctx, parent);
                for (name, &field) in fields {
                    self.validate_attribute(field, &child_ctx(attr_ctx, name), parent);
                }
            }
            DataType::Array(elem) => self.validate_attribute(*elem, attr_ctx, parent),
            DataType::Map { key, elem } => {
                self.validate_attribute(*key, attr_ctx, parent);
                self.validate_attribute(*elem, attr_ctx, parent);
            }
            DataType::UserType(t) => {
                let underlying = design.user_type(*t).map(|user_type| user_type.attribute);
                self.substitute(attribute, id, underlying, attr_ctx, parent);
            }
            DataType::MediaType(t) => {
                let underlying = design.media_type(*t).map(|media_type| media_type.attribute);
                self.substitute(attribute, id, underlying, attr_ctx, parent);
            }
        }
    }

    /// Validates the definition behind a named type reference. Required
    /// fields declared on the reference itself are checked against the
    /// underlying object.
    fn substitute(
        &mut self,
        reference: &Attribute,
        id: AttributeId,
        underlying: Option<AttributeId>,
        attr_ctx: &str,
        parent: &str,
    ) {
        let Some(underlying) = underlying else {
            self.add(parent, ValidationErrorKind::UnknownNamedType(attr_ctx.to_string()));
            return;
        };
        if let Some(fields) = self.design.object_of(id) {
            self.check_required(reference.required(), fields, attr_ctx, parent);
        }
        self.validate_attribute(underlying, attr_ctx, parent);
    }

    fn check_required(
        &mut self,
        required: &[String],
        fields: &Object,
        attr_ctx: &str,
        parent: &str,
    ) {
        for name in required {
            if !fields.contains_key(name) {
                self.add(
                    parent,
                    ValidationErrorKind::MissingRequiredField {
                        attribute: attr_ctx.to_string(),
                        field: name.clone(),
                    },
                );
            }
        }
    }

    fn check_rules(&mut self, attribute: &Attribute, attr_ctx: &str, parent: &str) {
        let Some(rules) = attribute.validation.as_ref() else {
            return;
        };
        if let Some(pattern) = rules.pattern.as_deref() {
            if let Err(e) = Regex::new(pattern) {
                self.add(
                    parent,
                    ValidationErrorKind::InvalidPattern {
                        attribute: attr_ctx.to_string(),
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    },
                );
            }
        }
        if let (Some(minimum), Some(maximum)) = (rules.minimum, rules.maximum) {
            if minimum > maximum {
                self.add(
                    parent,
                    ValidationErrorKind::InvalidRange {
                        attribute: attr_ctx.to_string(),
                        minimum,
                        maximum,
                    },
                );
            }
        }
        if let (Some(min_length), Some(max_length)) = (rules.min_length, rules.max_length) {
            if min_length > max_length {
                self.add(
                    parent,
                    ValidationErrorKind::InvalidLengthRange {
                        attribute: attr_ctx.to_string(),
                        min_length,
                        max_length,
                    },
                );
            }
        }
    }

    fn validate_user_type(&mut self, user_type: &UserType, attr_ctx: &str, parent: &str) {
        if user_type.type_name.is_empty() {
            self.add(parent, ValidationErrorKind::EmptyTypeName(attr_ctx.to_string()));
        }
        self.validate_attribute(user_type.attribute, attr_ctx, parent);
    }

    fn validate_media_type(&mut self, media_type: &MediaType) {
        let design = self.design;
        let ctx = media_type.context();
        if media_type.type_name.is_empty() {
            self.add(&ctx, ValidationErrorKind::EmptyTypeName(String::new()));
        }
        self.validate_attribute(media_type.attribute, "", &ctx);

        let is_collection = design.kind_of(media_type.attribute) == Some(Kind::Array);
        let object = if is_collection {
            self.collection_element_object(media_type, &ctx)
        } else {
            design.object_of(media_type.attribute)
        };

        if let Some(fields) = object {
            for (name, &field) in fields {
                self.validate_attribute(field, &format!("attribute {name}"), &ctx);
                let Some(att) = design.attribute(field) else {
                    continue;
                };
                let Some(view) = att.view.as_deref() else {
                    continue;
                };
                match att.data_type.as_ref() {
                    Some(DataType::MediaType(t)) => {
                        let known = design
                            .media_type(*t)
                            .is_some_and(|target| target.views.contains_key(view));
                        if !known {
                            self.add(
                                &ctx,
                                ValidationErrorKind::UnknownView {
                                    attribute: name.clone(),
                                    view: view.to_string(),
                                },
                            );
                        }
                    }
                    _ => self.add(&ctx, ValidationErrorKind::ViewOnNonMediaType(name.clone())),
                }
            }
        }

        if !is_collection {
            if !media_type.views.contains_key(DEFAULT_VIEW) {
                self.add(&ctx, ValidationErrorKind::MissingDefaultView);
            }
            for view in media_type.views.values() {
                let view_ctx = format!("view {:?} of {ctx}", view.name);
                self.validate_attribute(view.attribute, "", &view_ctx);
                if let (Some(rendered), Some(fields)) = (design.object_of(view.attribute), object) {
                    for field in rendered.keys().filter(|f| !fields.contains_key(*f)) {
                        self.add(
                            &view_ctx,
                            ValidationErrorKind::UnknownViewField {
                                view: view.name.clone(),
                                field: field.clone(),
                            },
                        );
                    }
                }
            }
        }

        for link in &media_type.links {
            self.validate_link(media_type, object, link);
        }
    }

    /// Resolves the object rendered by each element of a collection media
    /// type; the element must itself be a media type.
    fn collection_element_object(
        &mut self,
        media_type: &MediaType,
        ctx: &str,
    ) -> Option<&'a Object> {
        let design = self.design;
        let elem = design.array_elem_of(media_type.attribute)?;
        let Some(elem_att) = design.attribute(elem) else {
            self.add(ctx, ValidationErrorKind::MissingArrayElement);
            return None;
        };
        let before = self.errors.len();
        self.validate_attribute(elem, "array element", ctx);
        if self.errors.len() > before {
            return None;
        }
        match elem_att.data_type.as_ref() {
            Some(DataType::MediaType(t)) => design
                .media_type(*t)
                .and_then(|target| design.object_of(target.attribute)),
            _ => {
                self.add(
                    ctx,
                    ValidationErrorKind::CollectionElementNotMediaType(design.type_name(elem)),
                );
                None
            }
        }
    }

    fn validate_link(&mut self, media_type: &MediaType, object: Option<&Object>, link: &Link) {
        let design = self.design;
        let ctx = format!("link {:?} of {}", link.name, media_type.context());
        if link.name.is_empty() {
            self.add(&ctx, ValidationErrorKind::EmptyLinkName);
        }
        let Some(fields) = object else {
            self.add(&ctx, ValidationErrorKind::LinkParentNotObject);
            return;
        };
        let Some(&field) = fields.get(&link.name) else {
            self.add(&ctx, ValidationErrorKind::UnknownLinkAttribute(link.name.clone()));
            return;
        };
        let target = design
            .attribute(field)
            .and_then(|att| match att.data_type.as_ref() {
                Some(DataType::MediaType(t)) => design.media_type(*t),
                _ => None,
            });
        match target {
            None => self.add(&ctx, ValidationErrorKind::LinkTargetNotMediaType(link.name.clone())),
            Some(target) if !target.views.contains_key(&link.view) => self.add(
                &ctx,
                ValidationErrorKind::UnknownLinkView {
                    view: link.view.clone(),
                    media_type: target.identifier.clone(),
                },
            ),
            Some(_) => {}
        }
    }

    fn validate_response(&mut self, response: &Response) {
        let ctx = response.context();
        if let Some(headers) = response.headers {
            self.validate_attribute(headers, "response headers", &ctx);
        }
        if response.status == 0 {
            self.add(&ctx, ValidationErrorKind::MissingStatus);
        }
        if let Some(identifier) = response.media_type.as_deref() {
            if self.design.find_media_type(identifier).is_none() {
                self.add(&ctx, ValidationErrorKind::UnknownMediaType(identifier.to_string()));
            }
        }
        if let Some(body) = response.body {
            self.validate_attribute(body, "response body", &ctx);
        }
    }

    fn validate_encoding(&mut self, encoding: &Encoding) {
        let ctx = encoding.context();
        if encoding.mime_types.is_empty() {
            self.add(&ctx, ValidationErrorKind::MissingMimeType);
            return;
        }
        let mut essences = Vec::with_capacity(encoding.mime_types.len());
        for mime_type in &encoding.mime_types {
            match parse_media_type(mime_type) {
                Ok(parsed) => essences.push((mime_type, parsed.essence)),
                Err(reason) => self.add(
                    &ctx,
                    ValidationErrorKind::InvalidMimeType {
                        mime_type: mime_type.clone(),
                        reason,
                    },
                ),
            }
        }
        if encoding.package_path.is_none() {
            for (mime_type, essence) in essences {
                if !self.config.is_known_encoder(&essence) {
                    let known = self
                        .config
                        .sorted_known_encoders()
                        .into_iter()
                        .map(String::from)
                        .collect();
                    self.add(
                        &ctx,
                        ValidationErrorKind::UnknownEncoder {
                            mime_type: mime_type.clone(),
                            known,
                        },
                    );
                }
            }
        }
        if encoding.function.is_some() && encoding.package_path.is_none() {
            self.add(&ctx, ValidationErrorKind::FunctionWithoutPackage);
        }
    }
}

fn child_ctx(attr_ctx: &str, name: &str) -> String {
    match attr_ctx.strip_prefix("field ") {
        Some(path) => format!("field {path}.{name}"),
        None if attr_ctx.is_empty() => format!("field {name}"),
        None => format!("{attr_ctx} - field {name}"),
    }
}

/// Returns the parent chain as `a -> b -> a` if following parents from
/// `resource` comes back to it.
fn parent_cycle(design: &Design, resource: &Resource) -> Option<String> {
    let mut chain = vec![resource.name.as_str()];
    let mut current = resource;
    while let Some(parent_name) = current.parent_name.as_deref() {
        if parent_name == resource.name {
            chain.push(parent_name);
            return Some(chain.join(" -> "));
        }
        if chain.contains(&parent_name) {
            // Loop that does not include `resource`; reported on its members.
            return None;
        }
        chain.push(parent_name);
        current = design.find_resource(parent_name)?;
    }
    None
}

//! Attribute model shared by validation and code generation.
//!
//! An [`Attribute`] is one typed value in an API description: a field, a
//! parameter, a payload, a response body or header set. Attributes live in the
//! arena owned by [`Design`](crate::Design) and refer to each other through
//! [`AttributeId`] handles, which is what lets named types reference
//! themselves (directly or through other named types) without ownership
//! cycles.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Stable handle of an [`Attribute`] stored in a design arena.
    pub struct AttributeId;
    /// Stable handle of a [`UserType`](crate::UserType).
    pub struct UserTypeId;
    /// Stable handle of a [`MediaType`](crate::MediaType).
    pub struct MediaTypeId;
}

/// Object fields, keyed by field name.
///
/// Field order carries no meaning; a sorted map keeps traversal and
/// diagnostics deterministic.
pub type Object = BTreeMap<String, AttributeId>;

/// Built-in scalar types.
///
/// # Examples
///
/// ```
/// use api_design_core::Primitive;
///
/// assert_eq!(Primitive::DateTime.name(), "datetime");
/// assert_eq!(Primitive::default(), Primitive::Any);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Integer,
    Number,
    String,
    DateTime,
    #[default]
    Any,
}

impl Primitive {
    /// Returns the design-level name of the primitive.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Integer => "integer",
            Primitive::Number => "number",
            Primitive::String => "string",
            Primitive::DateTime => "datetime",
            Primitive::Any => "any",
        }
    }

    /// Returns the kind this primitive belongs to.
    pub fn kind(self) -> Kind {
        match self {
            Primitive::Boolean => Kind::Boolean,
            Primitive::Integer => Kind::Integer,
            Primitive::Number => Kind::Number,
            Primitive::String => Kind::String,
            Primitive::DateTime => Kind::DateTime,
            Primitive::Any => Kind::Any,
        }
    }
}

/// Type of an attribute.
///
/// Each variant carries only what its shape needs. Named types
/// ([`UserType`](DataType::UserType) and [`MediaType`](DataType::MediaType))
/// are references into the design arenas; resolving them yields another
/// attribute whose type describes the actual shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Primitive(Primitive),
    Object(Object),
    /// Array with a single element attribute.
    Array(AttributeId),
    /// Map with key and element attributes.
    Map { key: AttributeId, elem: AttributeId },
    UserType(UserTypeId),
    MediaType(MediaTypeId),
}

impl DataType {
    /// Returns `true` for the two named-type variants.
    pub fn is_named(&self) -> bool {
        matches!(self, DataType::UserType(_) | DataType::MediaType(_))
    }
}

/// Structural kind of a type once named types are unwrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Boolean,
    Integer,
    Number,
    String,
    DateTime,
    Any,
    Array,
    Object,
    Map,
}

impl Kind {
    /// Returns `true` for array, object and map kinds.
    pub fn is_composite(self) -> bool {
        matches!(self, Kind::Array | Kind::Object | Kind::Map)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::DateTime => "datetime",
            Kind::Any => "any",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Map => "map",
        };
        f.write_str(name)
    }
}

/// Optional constraints attached to an attribute.
///
/// # Examples
///
/// ```
/// use api_design_core::ValidationRules;
///
/// let rules = ValidationRules::default().with_required(["id", "name"]);
/// assert_eq!(rules.required, vec!["id", "name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Enumerated allowed values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<serde_json::Value>,
    /// String format tag (e.g. "email", "uri").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Regular expression the value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Names of child fields that must be present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ValidationRules {
    /// Adds required field names.
    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the pattern constraint.
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Sets the numeric bounds.
    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Sets the length bounds.
    pub fn with_length(mut self, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }
}

/// A typed value node.
///
/// Use the constructors ([`primitive`](Attribute::primitive),
/// [`object`](Attribute::object), ...) and the `with_*` builders, then store
/// the attribute in a [`Design`](crate::Design) to obtain its handle.
///
/// # Examples
///
/// ```
/// use api_design_core::{Attribute, Primitive};
///
/// let id = Attribute::primitive(Primitive::String)
///     .with_description("Unique identifier")
///     .with_transform_key("uid");
/// assert_eq!(id.transform_key.as_deref(), Some("uid"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Type of the attribute; `None` is reported by validation.
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    /// Key used instead of the field name when matching fields of two types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_key: Option<String>,
    /// View used to render this attribute when its type is a media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// Pass-through metadata not interpreted by this crate.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Vec<String>>,
}

impl Attribute {
    /// Creates an attribute of the given type.
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type: Some(data_type),
            ..Default::default()
        }
    }

    /// Creates an attribute with no type.
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Creates a primitive attribute.
    pub fn primitive(primitive: Primitive) -> Self {
        Self::new(DataType::Primitive(primitive))
    }

    /// Creates an object attribute from `(name, handle)` pairs.
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, AttributeId)>,
        S: Into<String>,
    {
        Self::new(DataType::Object(
            fields.into_iter().map(|(n, id)| (n.into(), id)).collect(),
        ))
    }

    /// Creates an array attribute.
    pub fn array(elem: AttributeId) -> Self {
        Self::new(DataType::Array(elem))
    }

    /// Creates a map attribute.
    pub fn map(key: AttributeId, elem: AttributeId) -> Self {
        Self::new(DataType::Map { key, elem })
    }

    /// Creates an attribute referencing a user type.
    pub fn user_type(id: UserTypeId) -> Self {
        Self::new(DataType::UserType(id))
    }

    /// Creates an attribute referencing a media type.
    pub fn media_type(id: MediaTypeId) -> Self {
        Self::new(DataType::MediaType(id))
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the validation rules.
    pub fn with_validation(mut self, rules: ValidationRules) -> Self {
        self.validation = Some(rules);
        self
    }

    /// Marks the given child fields as required.
    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rules = self.validation.take().unwrap_or_default();
        self.validation = Some(rules.with_required(names));
        self
    }

    /// Sets the field matching key used by type transforms.
    pub fn with_transform_key(mut self, key: &str) -> Self {
        self.transform_key = Some(key.to_string());
        self
    }

    /// Sets the rendering view.
    pub fn with_view(mut self, view: &str) -> Self {
        self.view = Some(view.to_string());
        self
    }

    /// Adds a pass-through metadata entry.
    pub fn with_metadata(mut self, key: &str, values: &[&str]) -> Self {
        self.metadata.insert(
            key.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Returns the required field names declared on this attribute.
    pub fn required(&self) -> &[String] {
        self.validation
            .as_ref()
            .map(|v| v.required.as_slice())
            .unwrap_or_default()
    }

    /// Returns `true` if `name` is listed as required.
    pub fn is_required(&self, name: &str) -> bool {
        self.required().iter().any(|r| r == name)
    }
}

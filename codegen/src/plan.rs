//! Conversion plans handed to source emitters.
//!
//! A plan is a tree mirroring the shape of the converted types. Every node
//! carries the source and target access paths it reads from and writes to,
//! rooted at `source` and `target`: object fields append `.name`, array
//! elements `[]`, map keys `{key}` and map values `{value}`.

use api_design_core::NamedTypeRef;
use serde::Serialize;

/// Input of [`compile_transform`](crate::compile_transform).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub source: NamedTypeRef,
    pub target: NamedTypeRef,
    /// Package qualifying the target type in emitted code.
    pub target_package: Option<String>,
    pub function_name: String,
}

impl TransformRequest {
    pub fn new(source: NamedTypeRef, target: NamedTypeRef, function_name: &str) -> Self {
        Self {
            source,
            target,
            target_package: None,
            function_name: function_name.to_string(),
        }
    }

    /// Sets the package of the target type.
    pub fn with_target_package(mut self, package: &str) -> Self {
        self.target_package = Some(package.to_string());
        self
    }
}

/// A compiled transform function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformPlan {
    pub function_name: String,
    pub source_type: String,
    /// Target type name, qualified with the target package when set.
    pub target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_package: Option<String>,
    pub body: Conversion,
}

impl TransformPlan {
    /// Serializes the plan as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One step of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conversion {
    /// Direct copy of a scalar value.
    Assign { source: String, target: String },
    Object(ObjectConversion),
    Array(ArrayConversion),
    Map(MapConversion),
    /// Conversion between two named types already being compiled further up
    /// the tree; emitters call the generated conversion for that pair.
    Recurse {
        source: String,
        target: String,
        source_type: String,
        target_type: String,
    },
}

impl Conversion {
    /// Returns the source path read by this step.
    pub fn source(&self) -> &str {
        match self {
            Conversion::Assign { source, .. } | Conversion::Recurse { source, .. } => source,
            Conversion::Object(o) => &o.source,
            Conversion::Array(a) => &a.source,
            Conversion::Map(m) => &m.source,
        }
    }

    /// Returns the target path written by this step.
    pub fn target(&self) -> &str {
        match self {
            Conversion::Assign { target, .. } | Conversion::Recurse { target, .. } => target,
            Conversion::Object(o) => &o.target,
            Conversion::Array(a) => &a.target,
            Conversion::Map(m) => &m.target,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectConversion> {
        match self {
            Conversion::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayConversion> {
        match self {
            Conversion::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapConversion> {
        match self {
            Conversion::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// Field-by-field copy into a new target structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectConversion {
    pub source: String,
    pub target: String,
    /// Name of the target named type to instantiate; `None` for anonymous
    /// objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    /// Matched fields, in source field name order.
    pub fields: Vec<FieldConversion>,
}

impl ObjectConversion {
    /// Returns the matched `(source field, target field)` names.
    pub fn field_pairs(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .map(|f| (f.source_field.as_str(), f.target_field.as_str()))
            .collect()
    }

    /// Finds the conversion of a source field.
    pub fn field(&self, source_field: &str) -> Option<&FieldConversion> {
        self.fields.iter().find(|f| f.source_field == source_field)
    }
}

/// Conversion of one matched field pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConversion {
    /// Field name in the source object.
    pub source_field: String,
    /// Matched field name in the target object.
    pub target_field: String,
    /// How the field value is converted.
    pub conversion: Conversion,
}

/// Element-wise copy into a new target array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrayConversion {
    pub source: String,
    pub target: String,
    /// Name of the target element named type, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem_type: Option<String>,
    pub elem: Box<Conversion>,
}

/// Entry-wise copy into a new target map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapConversion {
    pub source: String,
    pub target: String,
    pub key: Box<Conversion>,
    pub value: Box<Conversion>,
}

//! Compilation of type-to-type conversion plans.
//!
//! The compiler walks two named types in parallel. Objects are matched field
//! by field through [`compute_mapping`], arrays element by element and maps
//! entry by entry (key and value compiled independently). Named types are
//! unwrapped before kinds are compared, but their names are kept in the plan
//! so emitters can instantiate the right structures.
//!
//! Compilation is fail-fast: the first incompatibility aborts it with an
//! error naming both access paths and the mismatched types.
//!
//! # Examples
//!
//! ```
//! use api_design_codegen::*;
//! use api_design_core::{Attribute, Design, NamedTypeRef, Primitive};
//!
//! let mut design = Design::new("api");
//! let count = design.add_attribute(Attribute::primitive(Primitive::Integer));
//! let text = design.add_attribute(Attribute::primitive(Primitive::String));
//! let source = design.add_attribute(Attribute::object([("count", count)]));
//! let target = design.add_attribute(Attribute::object([("count", text)]));
//! let source = design.add_user_type("Stock", source);
//! let target = design.add_user_type("StockView", target);
//!
//! let request = TransformRequest::new(
//!     NamedTypeRef::User(source),
//!     NamedTypeRef::User(target),
//!     "StockToStockView",
//! );
//! let err = compile_transform(&design, &request).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "incompatible attribute types: source.count is of type integer but target.count is of type string"
//! );
//! ```

use api_design_core::{AttributeId, Design, Kind, NamedTypeRef};
use tracing::debug;

use crate::config::{TransformConfig, UnmatchedRequiredPolicy};
use crate::error::{Result, TransformError};
use crate::mapping::compute_mapping;
use crate::plan::{
    ArrayConversion, Conversion, FieldConversion, MapConversion, ObjectConversion, TransformPlan,
    TransformRequest,
};

/// Compiles a transform with the default configuration.
pub fn compile_transform(design: &Design, request: &TransformRequest) -> Result<TransformPlan> {
    compile_transform_with(design, request, &TransformConfig::default())
}

/// Compiles a transform.
///
/// # Errors
///
/// Returns [`TransformError`] if either type is unknown or untyped, if the
/// source is a primitive, or if the two types are not structurally
/// compatible.
pub fn compile_transform_with(
    design: &Design,
    request: &TransformRequest,
    config: &TransformConfig,
) -> Result<TransformPlan> {
    let (source_name, source) = design
        .named_type(request.source)
        .ok_or(TransformError::UnknownType("source"))?;
    let (target_name, target) = design
        .named_type(request.target)
        .ok_or(TransformError::UnknownType("target"))?;
    debug!(
        function = %request.function_name,
        source = source_name,
        target = target_name,
        "Compiling transform"
    );

    let source_kind = design
        .kind_of(source)
        .ok_or_else(|| TransformError::MissingType("source".to_string()))?;
    if !source_kind.is_composite() {
        return Err(TransformError::PrimitiveTransform(source_name.to_string()));
    }
    let target_kind = design
        .kind_of(target)
        .ok_or_else(|| TransformError::MissingType("target".to_string()))?;
    if source_kind != target_kind {
        return Err(TransformError::ShapeMismatch {
            source_kind,
            target_type: target_kind.to_string(),
        });
    }

    let mut compiler = Compiler {
        design,
        config,
        in_progress: vec![(request.source, request.target)],
    };
    let body = compiler.composite(
        source_kind,
        source,
        target,
        "source",
        "target",
        Some(target_name),
    )?;

    let target_type = match request.target_package.as_deref() {
        Some(package) if !package.is_empty() => format!("{package}.{target_name}"),
        _ => target_name.to_string(),
    };
    Ok(TransformPlan {
        function_name: request.function_name.clone(),
        source_type: source_name.to_string(),
        target_type,
        target_package: request.target_package.clone(),
        body,
    })
}

struct Compiler<'a> {
    design: &'a Design,
    config: &'a TransformConfig,
    /// Named type pairs on the current compilation path.
    in_progress: Vec<(NamedTypeRef, NamedTypeRef)>,
}

impl Compiler<'_> {
    fn kind(&self, id: AttributeId, ctx: &str) -> Result<Kind> {
        self.design
            .kind_of(id)
            .ok_or_else(|| TransformError::MissingType(ctx.to_string()))
    }

    fn type_name(&self, id: AttributeId) -> String {
        self.design.type_name(id)
    }

    /// Compiles two attributes of possibly any kind.
    fn attribute(
        &mut self,
        source: AttributeId,
        target: AttributeId,
        sctx: &str,
        tctx: &str,
    ) -> Result<Conversion> {
        let source_kind = self.kind(source, sctx)?;
        let target_kind = self.kind(target, tctx)?;
        if source_kind != target_kind {
            return Err(TransformError::IncompatibleTypes {
                source_ctx: sctx.to_string(),
                source_type: self.type_name(source),
                target_ctx: tctx.to_string(),
                target_type: self.type_name(target),
            });
        }
        if !source_kind.is_composite() {
            return Ok(Conversion::Assign {
                source: sctx.to_string(),
                target: tctx.to_string(),
            });
        }

        let design = self.design;
        let pair = design.named_ref(source).zip(design.named_ref(target));
        if let Some(pair) = pair {
            if self.in_progress.contains(&pair) {
                return Ok(Conversion::Recurse {
                    source: sctx.to_string(),
                    target: tctx.to_string(),
                    source_type: self.type_name(source),
                    target_type: self.type_name(target),
                });
            }
            self.in_progress.push(pair);
        }
        let target_name = design.named_type_name(target);
        let result = self.composite(source_kind, source, target, sctx, tctx, target_name);
        if pair.is_some() {
            self.in_progress.pop();
        }
        result
    }

    fn composite(
        &mut self,
        kind: Kind,
        source: AttributeId,
        target: AttributeId,
        sctx: &str,
        tctx: &str,
        target_name: Option<&str>,
    ) -> Result<Conversion> {
        match kind {
            Kind::Object => self.object(source, target, sctx, tctx, target_name),
            Kind::Array => self.array(source, target, sctx, tctx),
            Kind::Map => self.map(source, target, sctx, tctx),
            _ => Ok(Conversion::Assign {
                source: sctx.to_string(),
                target: tctx.to_string(),
            }),
        }
    }

    fn object(
        &mut self,
        source: AttributeId,
        target: AttributeId,
        sctx: &str,
        tctx: &str,
        target_name: Option<&str>,
    ) -> Result<Conversion> {
        let design = self.design;
        let (Some(source_fields), Some(target_fields)) =
            (design.object_of(source), design.object_of(target))
        else {
            return Err(TransformError::MissingType(sctx.to_string()));
        };
        let mapping = compute_mapping(design, source_fields, target_fields, sctx, tctx)?;

        // Shallow mismatches win over deeper ones.
        for (s, t) in &mapping {
            let (source_att, target_att) = (source_fields[s], target_fields[t]);
            let (source_ctx, target_ctx) = (format!("{sctx}.{s}"), format!("{tctx}.{t}"));
            if self.kind(source_att, &source_ctx)? != self.kind(target_att, &target_ctx)? {
                return Err(TransformError::IncompatibleTypes {
                    source_ctx,
                    source_type: self.type_name(source_att),
                    target_ctx,
                    target_type: self.type_name(target_att),
                });
            }
        }

        if self.config.unmatched_required == UnmatchedRequiredPolicy::Error {
            for required in design.all_required(target) {
                let matched = mapping.values().any(|t| *t == required);
                if target_fields.contains_key(&required) && !matched {
                    return Err(TransformError::UnmatchedRequired {
                        field: required,
                        context: tctx.to_string(),
                    });
                }
            }
        }

        let mut fields = Vec::with_capacity(mapping.len());
        for (s, t) in mapping {
            let conversion = self.attribute(
                source_fields[&s],
                target_fields[&t],
                &format!("{sctx}.{s}"),
                &format!("{tctx}.{t}"),
            )?;
            fields.push(FieldConversion {
                source_field: s,
                target_field: t,
                conversion,
            });
        }

        Ok(Conversion::Object(ObjectConversion {
            source: sctx.to_string(),
            target: tctx.to_string(),
            target_type: target_name.map(String::from),
            fields,
        }))
    }

    fn array(
        &mut self,
        source: AttributeId,
        target: AttributeId,
        sctx: &str,
        tctx: &str,
    ) -> Result<Conversion> {
        let design = self.design;
        let (Some(source_elem), Some(target_elem)) =
            (design.array_elem_of(source), design.array_elem_of(target))
        else {
            return Err(TransformError::MissingType(format!("{sctx}[]")));
        };
        let (source_ctx, target_ctx) = (format!("{sctx}[]"), format!("{tctx}[]"));
        if self.kind(source_elem, &source_ctx)? != self.kind(target_elem, &target_ctx)? {
            return Err(TransformError::IncompatibleArrayElements {
                source_ctx: sctx.to_string(),
                source_type: self.type_name(source_elem),
                target_ctx: tctx.to_string(),
                target_type: self.type_name(target_elem),
            });
        }

        let elem = self.attribute(source_elem, target_elem, &source_ctx, &target_ctx)?;
        Ok(Conversion::Array(ArrayConversion {
            source: sctx.to_string(),
            target: tctx.to_string(),
            elem_type: design.named_type_name(target_elem).map(String::from),
            elem: Box::new(elem),
        }))
    }

    fn map(
        &mut self,
        source: AttributeId,
        target: AttributeId,
        sctx: &str,
        tctx: &str,
    ) -> Result<Conversion> {
        let design = self.design;
        let (Some((source_key, source_elem)), Some((target_key, target_elem))) =
            (design.map_of(source), design.map_of(target))
        else {
            return Err(TransformError::MissingType(sctx.to_string()));
        };
        let (source_key_ctx, target_key_ctx) = (format!("{sctx}{{key}}"), format!("{tctx}{{key}}"));
        let (source_value_ctx, target_value_ctx) =
            (format!("{sctx}{{value}}"), format!("{tctx}{{value}}"));

        let source_elem_kind = self.kind(source_elem, &source_value_ctx)?;
        if source_elem_kind != self.kind(target_elem, &target_value_ctx)? {
            return Err(TransformError::IncompatibleMapElements {
                source_ctx: sctx.to_string(),
                source_type: self.type_name(source_elem),
                target_ctx: tctx.to_string(),
                target_type: self.type_name(target_elem),
            });
        }
        if self.kind(source_key, &source_key_ctx)? != self.kind(target_key, &target_key_ctx)? {
            return Err(TransformError::IncompatibleMapKeys {
                source_ctx: sctx.to_string(),
                source_type: self.type_name(source_key),
                target_ctx: tctx.to_string(),
                target_type: self.type_name(target_key),
            });
        }

        let key = self.attribute(source_key, target_key, &source_key_ctx, &target_key_ctx)?;
        let value = self.attribute(source_elem, target_elem, &source_value_ctx, &target_value_ctx)?;
        Ok(Conversion::Map(MapConversion {
            source: sctx.to_string(),
            target: tctx.to_string(),
            key: Box::new(key),
            value: Box::new(value),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_design_core::{Attribute, Primitive};

    struct Fixture {
        design: Design,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                design: Design::new("api"),
            }
        }

        fn prim(&mut self, p: Primitive) -> AttributeId {
            self.design.add_attribute(Attribute::primitive(p))
        }

        fn object(&mut self, fields: &[(&str, AttributeId)]) -> AttributeId {
            self.design
                .add_attribute(Attribute::object(fields.iter().map(|(n, id)| (*n, *id))))
        }

        fn named(&mut self, name: &str, attribute: AttributeId) -> NamedTypeRef {
            NamedTypeRef::User(self.design.add_user_type(name, attribute))
        }

        fn compile(&self, source: NamedTypeRef, target: NamedTypeRef) -> Result<TransformPlan> {
            compile_transform(&self.design, &TransformRequest::new(source, target, "Convert"))
        }
    }

    #[test]
    fn test_object_fields_assigned() {
        let mut f = Fixture::new();
        let id = f.prim(Primitive::String);
        let name = f.prim(Primitive::String);
        let extra = f.prim(Primitive::Boolean);
        let src = f.object(&[("id", id), ("name", name), ("extra", extra)]);
        let dst = f.object(&[("id", id), ("name", name)]);
        let (src, dst) = (f.named("Source", src), f.named("Target", dst));

        let plan = f.compile(src, dst).unwrap();
        assert_eq!(plan.source_type, "Source");
        assert_eq!(plan.target_type, "Target");

        let body = plan.body.as_object().unwrap();
        assert_eq!(body.target_type.as_deref(), Some("Target"));
        assert_eq!(body.field_pairs(), vec![("id", "id"), ("name", "name")]);
        assert_eq!(
            body.field("name").unwrap().conversion,
            Conversion::Assign {
                source: "source.name".into(),
                target: "target.name".into()
            }
        );
    }

    #[test]
    fn test_kind_mismatch_names_both_paths() {
        let mut f = Fixture::new();
        let count = f.prim(Primitive::Integer);
        let text = f.prim(Primitive::String);
        let src = f.object(&[("count", count)]);
        let dst = f.object(&[("count", text)]);
        let (src, dst) = (f.named("A", src), f.named("B", dst));

        assert_eq!(
            f.compile(src, dst).unwrap_err(),
            TransformError::IncompatibleTypes {
                source_ctx: "source.count".into(),
                source_type: "integer".into(),
                target_ctx: "target.count".into(),
                target_type: "string".into(),
            }
        );
    }

    #[test]
    fn test_nested_mismatch_reports_full_path() {
        let mut f = Fixture::new();
        let n = f.prim(Primitive::Number);
        let s = f.prim(Primitive::String);
        let inner_src = f.object(&[("value", n)]);
        let inner_dst = f.object(&[("value", s)]);
        let src = f.object(&[("inner", inner_src)]);
        let dst = f.object(&[("inner", inner_dst)]);
        let (src, dst) = (f.named("A", src), f.named("B", dst));

        let err = f.compile(src, dst).unwrap_err();
        assert!(matches!(
            err,
            TransformError::IncompatibleTypes { ref source_ctx, ref target_ctx, .. }
                if source_ctx == "source.inner.value" && target_ctx == "target.inner.value"
        ));
    }

    #[test]
    fn test_array_of_objects_maps_each_element() {
        let mut f = Fixture::new();
        let id = f.prim(Primitive::String);
        let src_elem = f.object(&[("id", id)]);
        let dst_elem = f.object(&[("id", id)]);
        let src = f.design.add_attribute(Attribute::array(src_elem));
        let dst = f.design.add_attribute(Attribute::array(dst_elem));
        let (src, dst) = (f.named("Items", src), f.named("ItemViews", dst));

        let plan = f.compile(src, dst).unwrap();
        let array = plan.body.as_array().unwrap();
        let elem = array.elem.as_object().unwrap();
        assert_eq!(elem.source, "source[]");
        assert_eq!(elem.field_pairs(), vec![("id", "id")]);
        assert_eq!(elem.fields[0].conversion.target(), "target[].id");

        // Same shapes with the roles swapped pair the same fields.
        let swapped = f.compile(dst, src).unwrap();
        let swapped_elem = swapped.body.as_array().unwrap().elem.as_object().unwrap();
        assert_eq!(swapped_elem.field_pairs(), vec![("id", "id")]);
    }

    #[test]
    fn test_array_element_mismatch() {
        let mut f = Fixture::new();
        let int = f.prim(Primitive::Integer);
        let text = f.prim(Primitive::String);
        let src = f.design.add_attribute(Attribute::array(int));
        let dst = f.design.add_attribute(Attribute::array(text));
        let (src, dst) = (f.named("A", src), f.named("B", dst));

        let err = f.compile(src, dst).unwrap_err();
        assert_eq!(
            err.to_string(),
            "incompatible attribute types: source is an array with elements of type integer but target is an array with elements of type string"
        );
    }

    #[test]
    fn test_map_compiles_key_and_value() {
        let mut f = Fixture::new();
        let key = f.prim(Primitive::String);
        let amount = f.prim(Primitive::Number);
        let value_src = f.object(&[("amount", amount)]);
        let value_dst = f.object(&[("amount", amount)]);
        let src = f.design.add_attribute(Attribute::map(key, value_src));
        let dst = f.design.add_attribute(Attribute::map(key, value_dst));
        let (src, dst) = (f.named("Ledger", src), f.named("LedgerView", dst));

        let plan = f.compile(src, dst).unwrap();
        let map = plan.body.as_map().unwrap();
        assert_eq!(
            *map.key,
            Conversion::Assign {
                source: "source{key}".into(),
                target: "target{key}".into()
            }
        );
        let value = map.value.as_object().unwrap();
        assert_eq!(value.fields[0].conversion.source(), "source{value}.amount");
    }

    #[test]
    fn test_map_value_checked_before_key() {
        let mut f = Fixture::new();
        let s = f.prim(Primitive::String);
        let i = f.prim(Primitive::Integer);
        let src = f.design.add_attribute(Attribute::map(s, s));
        let dst = f.design.add_attribute(Attribute::map(i, i));
        let (src, dst) = (f.named("A", src), f.named("B", dst));
        assert!(matches!(
            f.compile(src, dst),
            Err(TransformError::IncompatibleMapElements { .. })
        ));

        let dst2 = f.design.add_attribute(Attribute::map(i, s));
        let dst2 = f.named("C", dst2);
        assert!(matches!(
            f.compile(src, dst2),
            Err(TransformError::IncompatibleMapKeys { .. })
        ));
    }

    #[test]
    fn test_shape_and_primitive_errors() {
        let mut f = Fixture::new();
        let s = f.prim(Primitive::String);
        let obj = f.object(&[("s", s)]);
        let arr = f.design.add_attribute(Attribute::array(s));
        let prim = f.named("Name", s);
        let (obj, arr) = (f.named("Obj", obj), f.named("Arr", arr));

        assert_eq!(
            f.compile(obj, arr).unwrap_err().to_string(),
            "source is an object but target type is array"
        );
        assert_eq!(
            f.compile(prim, obj).unwrap_err(),
            TransformError::PrimitiveTransform("Name".into())
        );
    }

    #[test]
    fn test_named_types_recorded_and_recursion_closed() {
        let mut f = Fixture::new();
        let name = f.prim(Primitive::String);
        // Node { name, next: Node }
        let node_src = f.design.add_attribute(Attribute::untyped());
        let node_dst = f.design.add_attribute(Attribute::untyped());
        let src = f.named("Node", node_src);
        let dst = f.named("NodeView", node_dst);
        let (NamedTypeRef::User(src_id), NamedTypeRef::User(dst_id)) = (src, dst) else {
            unreachable!()
        };
        let next_src = f.design.add_attribute(Attribute::user_type(src_id));
        let next_dst = f.design.add_attribute(Attribute::user_type(dst_id));
        f.design.attribute_mut(node_src).unwrap().data_type =
            Attribute::object([("name", name), ("next", next_src)]).data_type;
        f.design.attribute_mut(node_dst).unwrap().data_type =
            Attribute::object([("name", name), ("next", next_dst)]).data_type;

        let plan = f.compile(src, dst).unwrap();
        let body = plan.body.as_object().unwrap();
        assert_eq!(
            body.field("next").unwrap().conversion,
            Conversion::Recurse {
                source: "source.next".into(),
                target: "target.next".into(),
                source_type: "Node".into(),
                target_type: "NodeView".into(),
            }
        );
    }

    #[test]
    fn test_nested_named_object_keeps_identity() {
        let mut f = Fixture::new();
        let city = f.prim(Primitive::String);
        let addr_src = f.object(&[("city", city)]);
        let addr_dst = f.object(&[("city", city)]);
        let NamedTypeRef::User(addr_dst_id) = f.named("AddressView", addr_dst) else {
            unreachable!()
        };
        let NamedTypeRef::User(addr_src_id) = f.named("Address", addr_src) else {
            unreachable!()
        };
        let src_ref = f.design.add_attribute(Attribute::user_type(addr_src_id));
        let dst_ref = f.design.add_attribute(Attribute::user_type(addr_dst_id));
        let src = f.object(&[("address", src_ref)]);
        let dst = f.object(&[("address", dst_ref)]);
        let (src, dst) = (f.named("Person", src), f.named("PersonView", dst));

        let plan = f.compile(src, dst).unwrap();
        let address = plan.body.as_object().unwrap().field("address").unwrap();
        let nested = address.conversion.as_object().unwrap();
        assert_eq!(nested.target_type.as_deref(), Some("AddressView"));
        assert_eq!(nested.target, "target.address");
    }

    #[test]
    fn test_unmatched_required_policy() {
        let mut f = Fixture::new();
        let s = f.prim(Primitive::String);
        let src = f.object(&[("a", s)]);
        let dst_obj = f
            .design
            .add_attribute(Attribute::object([("a", s), ("b", s)]).with_required(["b"]));
        let (src, dst) = (f.named("A", src), f.named("B", dst_obj));
        let request = TransformRequest::new(src, dst, "AToB");

        assert!(compile_transform(&f.design, &request).is_ok());
        assert_eq!(
            compile_transform_with(&f.design, &request, &TransformConfig::strict()).unwrap_err(),
            TransformError::UnmatchedRequired {
                field: "b".into(),
                context: "target".into()
            }
        );
    }

    #[test]
    fn test_target_package_qualifies_type() {
        let mut f = Fixture::new();
        let s = f.prim(Primitive::String);
        let obj = f.object(&[("s", s)]);
        let named = f.named("Thing", obj);
        let request = TransformRequest::new(named, named, "Copy").with_target_package("models");

        let plan = compile_transform(&f.design, &request).unwrap();
        assert_eq!(plan.target_type, "models.Thing");
        let json = plan.to_json().unwrap();
        assert!(json.contains("\"kind\": \"object\""));
        assert!(json.contains("\"target_package\": \"models\""));
    }
}

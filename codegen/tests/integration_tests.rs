//! End-to-end tests: validate a design, then compile transforms between its
//! types and inspect the serialized plans.

use api_design_codegen::*;
use api_design_core::{Attribute, Design, NamedTypeRef, Primitive, validate_design};
use serde_json::json;

/// `Bottle` (media type) and `BottleRow` (storage type) with a renamed field,
/// a nested array of named objects and a map of tags.
fn bottles() -> (Design, NamedTypeRef, NamedTypeRef) {
    let mut design = Design::new("cellar");
    let string = design.add_attribute(Attribute::primitive(Primitive::String));
    let int = design.add_attribute(Attribute::primitive(Primitive::Integer));

    let note_obj = design.add_attribute(Attribute::object([("text", string)]));
    let note = design.add_user_type("Note", note_obj);
    let note_row_obj = design.add_attribute(Attribute::object([("text", string)]));
    let note_row = design.add_user_type("NoteRow", note_row_obj);

    let note_ref = design.add_attribute(Attribute::user_type(note));
    let notes = design.add_attribute(Attribute::array(note_ref));
    let note_row_ref = design.add_attribute(Attribute::user_type(note_row));
    let note_rows = design.add_attribute(Attribute::array(note_row_ref));
    let tags = design.add_attribute(Attribute::map(string, int));

    let bottle_id = design.add_attribute(
        Attribute::primitive(Primitive::Integer).with_transform_key("bottle_id"),
    );
    let bottle = design.add_attribute(
        Attribute::object([("id", bottle_id), ("name", string), ("notes", notes), ("tags", tags)])
            .with_required(["id"]),
    );
    let bottle = design.add_media_type("application/vnd.bottle+json", "Bottle", bottle);
    let default_view = design.add_attribute(Attribute::object([("id", bottle_id)]));
    design
        .media_type_mut(bottle)
        .unwrap()
        .add_view("default", default_view);

    let row = design.add_attribute(Attribute::object([
        ("bottle_id", int),
        ("name", string),
        ("notes", note_rows),
        ("tags", tags),
        ("created_at", string),
    ]));
    let row = design.add_user_type("BottleRow", row);

    (design, NamedTypeRef::Media(bottle), NamedTypeRef::User(row))
}

#[test]
fn test_compiled_plan_serializes_for_emitters() {
    let (design, bottle, row) = bottles();
    assert!(validate_design(&design).is_ok());

    let name = transform_name("Bottle", "BottleRow", "");
    let request = TransformRequest::new(bottle, row, &name).with_target_package("store");
    let plan = compile_transform(&design, &request).unwrap();

    let value: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
    assert_eq!(value["function_name"], "BottleToBottleRow");
    assert_eq!(value["target_type"], "store.BottleRow");
    assert_eq!(value["body"]["kind"], "object");
    assert_eq!(value["body"]["target_type"], "BottleRow");

    let fields = value["body"]["fields"].as_array().unwrap();
    let pairs: Vec<_> = fields
        .iter()
        .map(|f| (f["source_field"].as_str().unwrap(), f["target_field"].as_str().unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![("id", "bottle_id"), ("name", "name"), ("notes", "notes"), ("tags", "tags")]
    );

    assert_eq!(
        fields[0]["conversion"],
        json!({"kind": "assign", "source": "source.id", "target": "target.bottle_id"})
    );
    assert_eq!(fields[2]["conversion"]["kind"], "array");
    assert_eq!(fields[2]["conversion"]["elem_type"], "NoteRow");
    assert_eq!(fields[2]["conversion"]["elem"]["target_type"], "NoteRow");
    assert_eq!(
        fields[3]["conversion"]["value"],
        json!({"kind": "assign", "source": "source.tags{value}", "target": "target.tags{value}"})
    );
}

#[test]
fn test_reverse_transform_pairs_same_fields() {
    let (design, bottle, row) = bottles();
    let forward = compile_transform(&design, &TransformRequest::new(bottle, row, "F")).unwrap();
    let backward = compile_transform(&design, &TransformRequest::new(row, bottle, "B")).unwrap();

    let mut forward_pairs = forward.body.as_object().unwrap().field_pairs();
    let mut backward_pairs: Vec<_> = backward
        .body
        .as_object()
        .unwrap()
        .field_pairs()
        .into_iter()
        .map(|(s, t)| (t, s))
        .collect();
    forward_pairs.sort_unstable();
    backward_pairs.sort_unstable();
    assert_eq!(forward_pairs, backward_pairs);
}

#[test]
fn test_strict_config_from_yaml_rejects_unmatched_required() {
    let (mut design, bottle, _) = bottles();
    let string = design.add_attribute(Attribute::primitive(Primitive::String));
    let audit = design.add_attribute(
        Attribute::object([("name", string), ("reviewer", string)]).with_required(["reviewer"]),
    );
    let audit = NamedTypeRef::User(design.add_user_type("Audit", audit));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transform.yaml");
    std::fs::write(&path, "unmatched_required: error\n").unwrap();
    let config = TransformConfig::load(&path).unwrap();

    let request = TransformRequest::new(bottle, audit, "BottleToAudit");
    let err = compile_transform_with(&design, &request, &config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "required field reviewer of target has no matching source field"
    );
    assert!(compile_transform(&design, &request).is_ok());
}

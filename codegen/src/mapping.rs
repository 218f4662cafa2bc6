//! Field correspondence between two object types.
//!
//! A field's match key is its [`transform_key`](api_design_core::Attribute::transform_key)
//! when one is declared and its name otherwise. A source field maps to the
//! target field with the same match key. Fields without a counterpart are
//! left out of the mapping.

use std::collections::BTreeMap;

use api_design_core::{Design, Object};
use tracing::debug;

use crate::error::{Result, TransformError};

/// Builds the match-key index of one side. When two fields share a key the
/// first in name order wins.
fn match_keys<'a>(
    design: &'a Design,
    fields: &'a Object,
    context: &str,
) -> Result<BTreeMap<&'a str, &'a str>> {
    let mut keys = BTreeMap::new();
    for (name, &id) in fields {
        let key = match design.attribute(id).and_then(|a| a.transform_key.as_deref()) {
            Some("") => {
                return Err(TransformError::EmptyTransformKey {
                    field: name.clone(),
                    context: context.to_string(),
                });
            }
            Some(key) => key,
            None => name.as_str(),
        };
        keys.entry(key).or_insert(name.as_str());
    }
    Ok(keys)
}

/// Maps source field names to target field names.
///
/// # Errors
///
/// Returns [`TransformError::EmptyTransformKey`] if a field of either side
/// declares an empty transform key.
///
/// # Examples
///
/// ```
/// use api_design_codegen::compute_mapping;
/// use api_design_core::{Attribute, Design, Object, Primitive};
///
/// let mut design = Design::new("api");
/// let id = design
///     .add_attribute(Attribute::primitive(Primitive::String).with_transform_key("uid"));
/// let uid = design.add_attribute(Attribute::primitive(Primitive::String));
/// let source: Object = [("id".to_string(), id)].into();
/// let target: Object = [("uid".to_string(), uid)].into();
///
/// let mapping = compute_mapping(&design, &source, &target, "source", "target").unwrap();
/// assert_eq!(mapping["id"], "uid");
/// ```
pub fn compute_mapping(
    design: &Design,
    source: &Object,
    target: &Object,
    source_ctx: &str,
    target_ctx: &str,
) -> Result<BTreeMap<String, String>> {
    let source_keys = match_keys(design, source, source_ctx)?;
    let target_keys = match_keys(design, target, target_ctx)?;

    let mapping: BTreeMap<String, String> = source_keys
        .iter()
        .filter_map(|(key, source_name)| {
            target_keys
                .get(key)
                .map(|target_name| (source_name.to_string(), target_name.to_string()))
        })
        .collect();

    debug!(
        source = source_ctx,
        target = target_ctx,
        matched = mapping.len(),
        source_fields = source.len(),
        target_fields = target.len(),
        "Computed field mapping"
    );
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_design_core::{Attribute, Primitive};

    fn string_field(design: &mut Design, key: Option<&str>) -> api_design_core::AttributeId {
        let mut att = Attribute::primitive(Primitive::String);
        if let Some(key) = key {
            att = att.with_transform_key(key);
        }
        design.add_attribute(att)
    }

    fn object(fields: &[(&str, api_design_core::AttributeId)]) -> Object {
        fields.iter().map(|(n, id)| (n.to_string(), *id)).collect()
    }

    #[test]
    fn test_alias_matches_target_name() {
        let mut design = Design::new("api");
        let id = string_field(&mut design, Some("uid"));
        let uid = string_field(&mut design, None);
        let source = object(&[("id", id)]);

        let target = object(&[("uid", uid)]);
        let mapping = compute_mapping(&design, &source, &target, "source", "target").unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["id"], "uid");

        let plain_id = string_field(&mut design, None);
        let identifier = string_field(&mut design, None);
        let mapping = compute_mapping(
            &design,
            &object(&[("id", plain_id)]),
            &object(&[("identifier", identifier)]),
            "source",
            "target",
        )
        .unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_aliases_on_both_sides() {
        let mut design = Design::new("api");
        let a = string_field(&mut design, Some("k"));
        let b = string_field(&mut design, Some("k"));
        let mapping = compute_mapping(
            &design,
            &object(&[("left", a)]),
            &object(&[("right", b)]),
            "source",
            "target",
        )
        .unwrap();
        assert_eq!(mapping["left"], "right");
    }

    #[test]
    fn test_empty_transform_key_is_error() {
        let mut design = Design::new("api");
        let bad = string_field(&mut design, Some(""));
        let ok = string_field(&mut design, None);

        let err = compute_mapping(
            &design,
            &object(&[("ok", ok)]),
            &object(&[("bad", bad)]),
            "source",
            "target.inner",
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransformError::EmptyTransformKey {
                field: "bad".into(),
                context: "target.inner".into()
            }
        );
    }

    #[test]
    fn test_exact_names_are_symmetric() {
        let mut design = Design::new("api");
        let fields: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|n| (*n, string_field(&mut design, None)))
            .collect();
        let left = object(&fields);
        let right = object(&[("b", fields[1].1), ("c", fields[2].1), ("d", fields[0].1)]);

        let forward = compute_mapping(&design, &left, &right, "source", "target").unwrap();
        let backward = compute_mapping(&design, &right, &left, "source", "target").unwrap();
        let reversed: BTreeMap<String, String> =
            backward.into_iter().map(|(s, t)| (t, s)).collect();
        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn test_renaming_aliases_consistently_keeps_mapping() {
        let mut design = Design::new("api");
        let s1 = string_field(&mut design, Some("x"));
        let t1 = string_field(&mut design, Some("x"));
        let s2 = string_field(&mut design, Some("renamed"));
        let t2 = string_field(&mut design, Some("renamed"));

        let first = compute_mapping(
            &design,
            &object(&[("src", s1)]),
            &object(&[("dst", t1)]),
            "source",
            "target",
        )
        .unwrap();
        let second = compute_mapping(
            &design,
            &object(&[("src", s2)]),
            &object(&[("dst", t2)]),
            "source",
            "target",
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_keys_first_name_wins() {
        let mut design = Design::new("api");
        let a = string_field(&mut design, Some("name"));
        let name = string_field(&mut design, None);
        let target = string_field(&mut design, None);
        let mapping = compute_mapping(
            &design,
            &object(&[("alias", a), ("name", name)]),
            &object(&[("name", target)]),
            "source",
            "target",
        )
        .unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["alias"], "name");
    }
}

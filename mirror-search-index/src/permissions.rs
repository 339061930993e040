//! Resource permission extraction
//!
//! Decomposes a thing's attributes and features into leaf-level
//! [`ResourcePermissions`] facets: recursion descends into object values
//! only; scalars, arrays and null are leaves and emit exactly one facet;
//! empty objects emit none (no leaf exists). A feature root always emits
//! one facet of its own, so a feature without properties stays addressable
//! in the index.
//!
//! Extraction is a pure function of `(content, enforcer)` - re-running it
//! for unchanged inputs yields an identical facet set.

use crate::document::{IndexDocument, ID_SEPARATOR};
use crate::error::Result;
use crate::escape::escape_pointer;
use mirror_core::{
    attribute_pointer, feature_pointer, feature_property_pointer, Attributes, Feature, Features,
    Permission, ResourcePointer, TwinObject, TwinValue,
};
use mirror_policy::PolicyEnforcer;
use std::collections::BTreeSet;

/// One leaf-level permission record: the read-subject sets of a single
/// content resource, plus the id components needed to address it in the
/// index. Ephemeral - produced per change event and consumed immediately.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourcePermissions {
    id_suffix: String,
    resource: String,
    read_granted: BTreeSet<String>,
    read_revoked: BTreeSet<String>,
}

impl ResourcePermissions {
    /// Compute the facet for one resource pointer
    fn at(pointer: &ResourcePointer, enforcer: &PolicyEnforcer) -> Self {
        Self {
            id_suffix: escape_pointer(pointer),
            resource: pointer.to_pointer_string(),
            read_granted: enforcer.subject_ids_with_permission(pointer, Permission::Read),
            read_revoked: enforcer.subject_ids_with_revoked_permission(pointer, Permission::Read),
        }
    }

    /// The derived index-document id for this facet
    pub fn entry_id(&self, thing_id: &str) -> String {
        format!("{thing_id}{ID_SEPARATOR}{}", self.id_suffix)
    }

    /// The leaf's resource pointer string
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Subjects with read effectively granted at the leaf
    pub fn read_granted_subject_ids(&self) -> &BTreeSet<String> {
        &self.read_granted
    }

    /// Subjects with read explicitly revoked at the leaf
    pub fn read_revoked_subject_ids(&self) -> &BTreeSet<String> {
        &self.read_revoked
    }

    /// Materialize the index document for this facet
    pub fn to_document(&self, thing_id: &str) -> IndexDocument {
        IndexDocument::new(
            self.entry_id(thing_id),
            self.read_granted.clone(),
            self.read_revoked.clone(),
            self.resource.clone(),
        )
    }
}

/// Facets for every attribute leaf of a thing
pub fn entries_for_attributes(
    attributes: &Attributes,
    enforcer: &PolicyEnforcer,
) -> Result<Vec<ResourcePermissions>> {
    let mut out = Vec::new();
    for (key, value) in attributes {
        let pointer = ResourcePointer::root().append(key.as_str())?;
        collect_attribute_leaves(&pointer, value, enforcer, &mut out)?;
    }
    Ok(out)
}

/// Facets for one attribute subtree; `pointer` is relative to the
/// attributes root.
pub fn entries_for_attribute(
    pointer: &ResourcePointer,
    value: &TwinValue,
    enforcer: &PolicyEnforcer,
) -> Result<Vec<ResourcePermissions>> {
    let mut out = Vec::new();
    collect_attribute_leaves(pointer, value, enforcer, &mut out)?;
    Ok(out)
}

fn collect_attribute_leaves(
    pointer: &ResourcePointer,
    value: &TwinValue,
    enforcer: &PolicyEnforcer,
    out: &mut Vec<ResourcePermissions>,
) -> Result<()> {
    match value.as_object() {
        Some(fields) => {
            for (key, child) in fields {
                let child_pointer = pointer.append(key.as_str())?;
                collect_attribute_leaves(&child_pointer, child, enforcer, out)?;
            }
        }
        None => out.push(ResourcePermissions::at(
            &attribute_pointer(pointer),
            enforcer,
        )),
    }
    Ok(())
}

/// Facets for every feature of a thing (roots and property leaves)
pub fn entries_for_features(
    features: &Features,
    enforcer: &PolicyEnforcer,
) -> Result<Vec<ResourcePermissions>> {
    let mut out = Vec::new();
    for (feature_id, feature) in features {
        out.extend(entries_for_feature(feature_id, feature, enforcer)?);
    }
    Ok(out)
}

/// Facets for one feature: one for the feature root (always, even with no
/// properties) plus one per property leaf.
pub fn entries_for_feature(
    feature_id: &str,
    feature: &Feature,
    enforcer: &PolicyEnforcer,
) -> Result<Vec<ResourcePermissions>> {
    let mut out = vec![ResourcePermissions::at(
        &feature_pointer(feature_id)?,
        enforcer,
    )];
    for (key, value) in feature.properties() {
        let pointer = ResourcePointer::root().append(key.as_str())?;
        collect_property_leaves(feature_id, &pointer, value, enforcer, &mut out)?;
    }
    Ok(out)
}

/// Facets for one feature-property subtree; `pointer` is relative to the
/// feature's properties root.
pub fn entries_for_feature_property(
    feature_id: &str,
    pointer: &ResourcePointer,
    value: &TwinValue,
    enforcer: &PolicyEnforcer,
) -> Result<Vec<ResourcePermissions>> {
    let mut out = Vec::new();
    collect_property_leaves(feature_id, pointer, value, enforcer, &mut out)?;
    Ok(out)
}

/// Facets for a properties object of a feature (without the feature root)
pub fn entries_for_feature_properties(
    feature_id: &str,
    properties: &TwinObject,
    enforcer: &PolicyEnforcer,
) -> Result<Vec<ResourcePermissions>> {
    let mut out = Vec::new();
    for (key, value) in properties {
        let pointer = ResourcePointer::root().append(key.as_str())?;
        collect_property_leaves(feature_id, &pointer, value, enforcer, &mut out)?;
    }
    Ok(out)
}

fn collect_property_leaves(
    feature_id: &str,
    pointer: &ResourcePointer,
    value: &TwinValue,
    enforcer: &PolicyEnforcer,
    out: &mut Vec<ResourcePermissions>,
) -> Result<()> {
    match value.as_object() {
        Some(fields) => {
            for (key, child) in fields {
                let child_pointer = pointer.append(key.as_str())?;
                collect_property_leaves(feature_id, &child_pointer, child, enforcer, out)?;
            }
        }
        None => out.push(ResourcePermissions::at(
            &feature_property_pointer(feature_id, pointer)?,
            enforcer,
        )),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::{Policy, Subject};
    use serde_json::json;

    fn enforcer() -> PolicyEnforcer {
        let policy = Policy::builder("p")
            .for_label("owner")
            .subject(Subject::new("iss", "alice", "jwt"))
            .grant(ResourcePointer::root(), [Permission::Read])
            .for_label("no-secret")
            .subject(Subject::new("iss", "alice", "jwt"))
            .revoke(
                ResourcePointer::parse("/attributes/secret"),
                [Permission::Read],
            )
            .build()
            .unwrap();
        PolicyEnforcer::build(&policy).unwrap()
    }

    fn attrs(value: serde_json::Value) -> Attributes {
        match TwinValue::from_json(value) {
            TwinValue::Object(fields) => fields,
            other => panic!("not an object: {other:?}"),
        }
    }

    #[test]
    fn test_nested_attributes_yield_one_facet_per_leaf() {
        let attributes = attrs(json!({
            "location": {"city": "Berlin", "geo": {"lat": 52.5, "lon": 13.4}},
            "serial": "abc-123"
        }));
        let facets = entries_for_attributes(&attributes, &enforcer()).unwrap();

        let resources: Vec<_> = facets.iter().map(|f| f.resource()).collect();
        assert_eq!(
            resources,
            [
                "/attributes/location/city",
                "/attributes/location/geo/lat",
                "/attributes/location/geo/lon",
                "/attributes/serial"
            ]
        );
    }

    #[test]
    fn test_scalar_array_null_are_leaves() {
        let attributes = attrs(json!({"a": [1, 2], "b": null, "c": 5}));
        let facets = entries_for_attributes(&attributes, &enforcer()).unwrap();
        assert_eq!(facets.len(), 3);
    }

    #[test]
    fn test_empty_object_yields_no_facet() {
        let attributes = attrs(json!({"empty": {}}));
        let facets = entries_for_attributes(&attributes, &enforcer()).unwrap();
        assert!(facets.is_empty());
    }

    #[test]
    fn test_facet_subject_sets() {
        let attributes = attrs(json!({"secret": 1, "open": 2}));
        let facets = entries_for_attributes(&attributes, &enforcer()).unwrap();

        let open = facets.iter().find(|f| f.resource() == "/attributes/open").unwrap();
        assert!(open.read_granted_subject_ids().contains("alice"));
        assert!(open.read_revoked_subject_ids().is_empty());

        let secret = facets.iter().find(|f| f.resource() == "/attributes/secret").unwrap();
        assert!(secret.read_granted_subject_ids().is_empty());
        assert!(secret.read_revoked_subject_ids().contains("alice"));
    }

    #[test]
    fn test_feature_without_properties_still_emits_root_facet() {
        let feature = Feature::new();
        let facets = entries_for_feature("lamp", &feature, &enforcer()).unwrap();
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].resource(), "/features/lamp");
        assert_eq!(facets[0].entry_id("t1"), "t1:features/lamp");
    }

    #[test]
    fn test_feature_properties_recursion() {
        let feature = Feature::with_properties(
            attrs(json!({"status": {"on": true, "color": {"r": 0}}})),
        );
        let facets = entries_for_feature("lamp", &feature, &enforcer()).unwrap();

        let resources: Vec<_> = facets.iter().map(|f| f.resource()).collect();
        assert_eq!(
            resources,
            [
                "/features/lamp",
                "/features/lamp/properties/status/color/r",
                "/features/lamp/properties/status/on"
            ]
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let attributes = attrs(json!({"location": {"city": "Berlin"}, "serial": 7}));
        let e = enforcer();
        let first = entries_for_attributes(&attributes, &e).unwrap();
        let second = entries_for_attributes(&attributes, &e).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_key_with_separator_is_rejected() {
        let attributes = attrs(json!({"bad/key": 1}));
        assert!(entries_for_attributes(&attributes, &enforcer()).is_err());
    }

    #[test]
    fn test_entry_ids_escape_reserved_characters() {
        let attributes = attrs(json!({"a.b": 1}));
        let facets = entries_for_attributes(&attributes, &enforcer()).unwrap();
        assert_eq!(facets[0].entry_id("t1"), "t1:attributes/a~2b");
        // The resource string keeps the original key
        assert_eq!(facets[0].resource(), "/attributes/a.b");
    }
}

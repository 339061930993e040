//! Thing content model
//!
//! A [`Thing`] mirrors one device: an optional id, the id of the policy
//! guarding it, a nested attributes object and a named collection of
//! features. Each [`Feature`] carries a nested properties object.
//!
//! Content lives under two well-known pointer prefixes: `attributes` and
//! `features/<id>/properties`.

use crate::error::Result;
use crate::pointer::ResourcePointer;
use crate::value::{TwinObject, TwinValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pointer prefix for attribute resources
pub const ATTRIBUTES_PREFIX: &str = "attributes";
/// Pointer prefix for feature resources
pub const FEATURES_PREFIX: &str = "features";
/// Pointer segment between a feature id and its property tree
pub const PROPERTIES_SEGMENT: &str = "properties";

/// Nested attribute object of a thing
pub type Attributes = TwinObject;

/// Named feature collection of a thing, keyed by feature id
pub type Features = BTreeMap<String, Feature>;

/// One feature: a named block of properties
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    properties: TwinObject,
}

impl Feature {
    /// Create a feature with no properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a feature from its properties object
    pub fn with_properties(properties: TwinObject) -> Self {
        Self { properties }
    }

    /// The feature's property tree
    pub fn properties(&self) -> &TwinObject {
        &self.properties
    }
}

/// Server-side mirror of one device
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "policyId", skip_serializing_if = "Option::is_none")]
    policy_id: Option<String>,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    features: Features,
}

impl Thing {
    /// Create an empty thing with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Set the guarding policy id
    pub fn with_policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    /// Replace the attributes object
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Add one feature
    pub fn with_feature(mut self, feature_id: impl Into<String>, feature: Feature) -> Self {
        self.features.insert(feature_id.into(), feature);
        self
    }

    /// The thing id, if assigned
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The id of the policy guarding this thing
    pub fn policy_id(&self) -> Option<&str> {
        self.policy_id.as_deref()
    }

    /// The nested attributes object
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The feature collection
    pub fn features(&self) -> &Features {
        &self.features
    }
}

/// Pointer to the whole attributes subtree
pub fn attributes_pointer() -> ResourcePointer {
    ResourcePointer::parse(ATTRIBUTES_PREFIX)
}

/// Pointer to one attribute, given its pointer relative to the attributes
/// root
pub fn attribute_pointer(relative: &ResourcePointer) -> ResourcePointer {
    attributes_pointer().concat(relative)
}

/// Pointer to a feature's root.
///
/// Fails with `InvalidSegment` when the feature id contains the separator.
pub fn feature_pointer(feature_id: &str) -> Result<ResourcePointer> {
    ResourcePointer::parse(FEATURES_PREFIX).append(feature_id)
}

/// Pointer to one feature property, given its pointer relative to the
/// feature's properties root
pub fn feature_property_pointer(
    feature_id: &str,
    relative: &ResourcePointer,
) -> Result<ResourcePointer> {
    Ok(feature_pointer(feature_id)?
        .append(PROPERTIES_SEGMENT)?
        .concat(relative))
}

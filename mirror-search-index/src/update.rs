//! Search-index update builders
//!
//! Translates a content or policy change plus its facets into an
//! [`IndexUpdate`]: one removal filter, zero or more insertions and the
//! global-read bookkeeping. The engine never diffs against the previous
//! leaf set - it removes a whole scope and re-inserts it, so applying the
//! same update twice yields the same store state as applying it once.
//!
//! Scoped builders narrow the removal filter to the changed subtree
//! (attribute pointer, feature, feature property) instead of the whole
//! thing; deletion builders carry a filter and no insertions.

use crate::document::{IndexDocument, RemovalFilter};
use crate::error::{Result, SearchIndexError};
use crate::escape::{escape_key, escape_pointer};
use crate::permissions::{
    entries_for_attribute, entries_for_attributes, entries_for_feature,
    entries_for_feature_properties, entries_for_feature_property, entries_for_features,
    ResourcePermissions,
};
use mirror_core::{
    Attributes, Feature, Features, Permission, ResourcePointer, Thing, TwinObject, TwinValue,
    ATTRIBUTES_PREFIX, FEATURES_PREFIX, PROPERTIES_SEGMENT,
};
use mirror_policy::PolicyEnforcer;
use std::collections::BTreeSet;

/// One mutation against the external index store
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    /// Delete every document whose id matches the filter
    DeleteMany(RemovalFilter),
    /// Insert the given documents
    InsertMany(Vec<IndexDocument>),
    /// Remove all global-read markers of the thing
    PullGlobalReads,
    /// Append a global-read marker per subject id
    PushGlobalReads(BTreeSet<String>),
    /// Remove all legacy ACL markers of the thing (migration path)
    PullAclEntries,
}

/// A complete, idempotent index mutation: removal filter + insertions +
/// optional global-read bookkeeping
#[derive(Clone, Debug, PartialEq)]
pub struct IndexUpdate {
    removal_filter: RemovalFilter,
    insertions: BTreeSet<IndexDocument>,
    pull_global_reads: bool,
    push_global_reads: BTreeSet<String>,
    pull_acl_entries: bool,
}

impl IndexUpdate {
    fn new(removal_filter: RemovalFilter, insertions: BTreeSet<IndexDocument>) -> Self {
        Self {
            removal_filter,
            insertions,
            pull_global_reads: false,
            push_global_reads: BTreeSet::new(),
            pull_acl_entries: false,
        }
    }

    /// The structural removal filter
    pub fn removal_filter(&self) -> &RemovalFilter {
        &self.removal_filter
    }

    /// The documents to insert after removal
    pub fn insertions(&self) -> &BTreeSet<IndexDocument> {
        &self.insertions
    }

    /// Global-read subject ids to push (empty when not a full resync)
    pub fn push_global_reads(&self) -> &BTreeSet<String> {
        &self.push_global_reads
    }

    /// Linearize into the store's bulk verbs.
    ///
    /// An empty global-read push is elided; the pull still runs so stale
    /// markers clear.
    pub fn write_ops(&self) -> Vec<WriteOp> {
        let mut ops = vec![WriteOp::DeleteMany(self.removal_filter.clone())];
        if !self.insertions.is_empty() {
            ops.push(WriteOp::InsertMany(self.insertions.iter().cloned().collect()));
        }
        if self.pull_global_reads {
            ops.push(WriteOp::PullGlobalReads);
        }
        if !self.push_global_reads.is_empty() {
            ops.push(WriteOp::PushGlobalReads(self.push_global_reads.clone()));
        }
        if self.pull_acl_entries {
            ops.push(WriteOp::PullAclEntries);
        }
        ops
    }
}

/// Full resync of a thing: recompute every facet, refresh the global-read
/// markers and clear legacy ACL markers.
///
/// Fails with a missing identifier error when the thing has no id - a
/// programmer error, not a retriable condition.
pub fn create_policy_index_update(thing: &Thing, enforcer: &PolicyEnforcer) -> Result<IndexUpdate> {
    let thing_id = thing
        .id()
        .ok_or_else(|| SearchIndexError::missing_identifier("thing has no id"))?;

    let mut facets = entries_for_attributes(thing.attributes(), enforcer)?;
    facets.extend(entries_for_features(thing.features(), enforcer)?);

    let global_reads =
        enforcer.subject_ids_with_partial_permission(&ResourcePointer::root(), Permission::Read);

    tracing::debug!(
        thing_id,
        facets = facets.len(),
        global_reads = global_reads.len(),
        "building full policy index update"
    );

    let mut update = IndexUpdate::new(
        RemovalFilter::thing_prefix(thing_id),
        to_documents(thing_id, facets),
    );
    update.pull_global_reads = true;
    update.push_global_reads = global_reads;
    update.pull_acl_entries = true;
    Ok(update)
}

/// Update for one changed attribute subtree; `pointer` is relative to the
/// attributes root
pub fn create_attribute_update(
    thing_id: &str,
    pointer: &ResourcePointer,
    value: &TwinValue,
    enforcer: &PolicyEnforcer,
) -> Result<IndexUpdate> {
    let facets = entries_for_attribute(pointer, value, enforcer)?;
    Ok(IndexUpdate::new(
        RemovalFilter::scoped(thing_id, &attribute_scope(pointer)),
        to_documents(thing_id, facets),
    ))
}

/// Update replacing all attributes of a thing
pub fn create_attributes_update(
    thing_id: &str,
    attributes: &Attributes,
    enforcer: &PolicyEnforcer,
) -> Result<IndexUpdate> {
    let facets = entries_for_attributes(attributes, enforcer)?;
    Ok(IndexUpdate::new(
        RemovalFilter::scoped(thing_id, ATTRIBUTES_PREFIX),
        to_documents(thing_id, facets),
    ))
}

/// Deletion of one attribute subtree
pub fn create_attribute_deletion(thing_id: &str, pointer: &ResourcePointer) -> IndexUpdate {
    IndexUpdate::new(
        RemovalFilter::scoped(thing_id, &attribute_scope(pointer)),
        BTreeSet::new(),
    )
}

/// Deletion of all attributes
pub fn create_attributes_deletion(thing_id: &str) -> IndexUpdate {
    IndexUpdate::new(
        RemovalFilter::scoped(thing_id, ATTRIBUTES_PREFIX),
        BTreeSet::new(),
    )
}

/// Update for one created or replaced feature
pub fn create_feature_update(
    thing_id: &str,
    feature_id: &str,
    feature: &Feature,
    enforcer: &PolicyEnforcer,
) -> Result<IndexUpdate> {
    let facets = entries_for_feature(feature_id, feature, enforcer)?;
    Ok(IndexUpdate::new(
        RemovalFilter::scoped(thing_id, &feature_scope(feature_id)),
        to_documents(thing_id, facets),
    ))
}

/// Update replacing all features of a thing
pub fn create_features_update(
    thing_id: &str,
    features: &Features,
    enforcer: &PolicyEnforcer,
) -> Result<IndexUpdate> {
    let facets = entries_for_features(features, enforcer)?;
    Ok(IndexUpdate::new(
        RemovalFilter::scoped(thing_id, FEATURES_PREFIX),
        to_documents(thing_id, facets),
    ))
}

/// Deletion of one feature
pub fn create_feature_deletion(thing_id: &str, feature_id: &str) -> IndexUpdate {
    IndexUpdate::new(
        RemovalFilter::scoped(thing_id, &feature_scope(feature_id)),
        BTreeSet::new(),
    )
}

/// Deletion of all features
pub fn create_features_deletion(thing_id: &str) -> IndexUpdate {
    IndexUpdate::new(
        RemovalFilter::scoped(thing_id, FEATURES_PREFIX),
        BTreeSet::new(),
    )
}

/// Update for one changed feature-property subtree; `pointer` is relative
/// to the feature's properties root
pub fn create_feature_property_update(
    thing_id: &str,
    feature_id: &str,
    pointer: &ResourcePointer,
    value: &TwinValue,
    enforcer: &PolicyEnforcer,
) -> Result<IndexUpdate> {
    let facets = entries_for_feature_property(feature_id, pointer, value, enforcer)?;
    Ok(IndexUpdate::new(
        RemovalFilter::scoped(thing_id, &feature_property_scope(feature_id, pointer)),
        to_documents(thing_id, facets),
    ))
}

/// Update replacing all properties of a feature
pub fn create_feature_properties_update(
    thing_id: &str,
    feature_id: &str,
    properties: &TwinObject,
    enforcer: &PolicyEnforcer,
) -> Result<IndexUpdate> {
    let facets = entries_for_feature_properties(feature_id, properties, enforcer)?;
    Ok(IndexUpdate::new(
        RemovalFilter::scoped(thing_id, &feature_properties_scope(feature_id)),
        to_documents(thing_id, facets),
    ))
}

/// Deletion of one feature-property subtree
pub fn create_feature_property_deletion(
    thing_id: &str,
    feature_id: &str,
    pointer: &ResourcePointer,
) -> IndexUpdate {
    IndexUpdate::new(
        RemovalFilter::scoped(thing_id, &feature_property_scope(feature_id, pointer)),
        BTreeSet::new(),
    )
}

/// Deletion of all properties of a feature
pub fn create_feature_properties_deletion(thing_id: &str, feature_id: &str) -> IndexUpdate {
    IndexUpdate::new(
        RemovalFilter::scoped(thing_id, &feature_properties_scope(feature_id)),
        BTreeSet::new(),
    )
}

/// Purge every index entry of a deleted thing
pub fn create_delete_thing_update(thing_id: &str) -> IndexUpdate {
    IndexUpdate::new(RemovalFilter::thing_prefix(thing_id), BTreeSet::new())
}

fn to_documents(
    thing_id: &str,
    facets: Vec<ResourcePermissions>,
) -> BTreeSet<IndexDocument> {
    facets
        .into_iter()
        .map(|facet| facet.to_document(thing_id))
        .collect()
}

/// Id scope of an attribute subtree; `pointer` is relative to the
/// attributes root
fn attribute_scope(pointer: &ResourcePointer) -> String {
    let suffix = escape_pointer(pointer);
    if suffix.is_empty() {
        ATTRIBUTES_PREFIX.to_owned()
    } else {
        format!("{ATTRIBUTES_PREFIX}/{suffix}")
    }
}

/// Id scope of a feature root
fn feature_scope(feature_id: &str) -> String {
    format!("{FEATURES_PREFIX}/{}", escape_key(feature_id))
}

/// Id scope of a feature's properties subtree
fn feature_properties_scope(feature_id: &str) -> String {
    format!("{}/{PROPERTIES_SEGMENT}", feature_scope(feature_id))
}

/// Id scope of one feature-property subtree; `pointer` is relative to the
/// properties root
fn feature_property_scope(feature_id: &str, pointer: &ResourcePointer) -> String {
    let suffix = escape_pointer(pointer);
    if suffix.is_empty() {
        feature_properties_scope(feature_id)
    } else {
        format!("{}/{suffix}", feature_properties_scope(feature_id))
    }
}

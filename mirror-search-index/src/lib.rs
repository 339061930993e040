//! # Mirror Search Index
//!
//! Search-index permission projection for the mirror digital-twin stack.
//!
//! This crate turns a thing's content and its policy enforcer into
//! denormalized index mutations:
//!
//! - [`permissions`]: recursive decomposition of attributes/features into
//!   leaf-level [`ResourcePermissions`] facets
//! - [`update`]: the `create_*_update` / `create_*_deletion` builder family
//!   producing [`IndexUpdate`]s (removal filter + insertions + global-read
//!   bookkeeping)
//! - [`document`]: the index-document schema and anchored-regex removal
//!   filters
//! - [`escape`]: the injective key encoding shared by id construction and
//!   filter construction
//! - [`store`]: an in-memory store applying write ops, for tests
//!
//! ## Update protocol
//!
//! Every update is one structural removal filter plus zero or more
//! insertions (plus optional pull/push of global-read markers). Document
//! ids derive deterministically from `(thing id, resource scope)`, so
//! remove-then-reinsert is idempotent: applying an update twice leaves the
//! store exactly as applying it once. The cost is write amplification - a
//! whole scope is rewritten even for a single-leaf change - in exchange for
//! never tracking the previous leaf set.

pub mod document;
pub mod error;
pub mod escape;
pub mod permissions;
pub mod store;
pub mod update;

pub use document::{
    IndexDocument, RemovalFilter, FIELD_ACL_ENTRY, FIELD_GLOBAL_READ, FIELD_GRANTED, FIELD_ID,
    FIELD_INTERNAL, FIELD_RESOURCE, FIELD_REVOKED, ID_SEPARATOR,
};
pub use error::{Result, SearchIndexError};
pub use escape::{escape_key, escape_pointer, unescape_key};
pub use permissions::{
    entries_for_attribute, entries_for_attributes, entries_for_feature,
    entries_for_feature_properties, entries_for_feature_property, entries_for_features,
    ResourcePermissions,
};
pub use store::{InternalMarker, MemoryIndexStore};
pub use update::{
    create_attribute_deletion, create_attribute_update, create_attributes_deletion,
    create_attributes_update, create_delete_thing_update, create_feature_deletion,
    create_feature_properties_deletion, create_feature_properties_update,
    create_feature_property_deletion, create_feature_property_update, create_feature_update,
    create_features_deletion, create_features_update, create_policy_index_update, IndexUpdate,
    WriteOp,
};

//! Index document and removal filter shapes
//!
//! One [`IndexDocument`] exists per surviving content leaf. Its id derives
//! deterministically from `(thing id, resource scope)`, so removing a scope
//! and re-inserting its documents reconstructs equivalent state - the basis
//! of the idempotent update protocol.
//!
//! A [`RemovalFilter`] is a structural match over document ids (an anchored
//! regex), not an exact-id match: the engine does not track which leaves
//! existed before a change, it removes a whole scope and re-inserts it.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;

/// Document field: the derived id
pub const FIELD_ID: &str = "id";
/// Document field: subjects with effective read grant
pub const FIELD_GRANTED: &str = "grantedSubjectIds";
/// Document field: subjects with effective read revoke
pub const FIELD_REVOKED: &str = "revokedSubjectIds";
/// Document field: the resource pointer string
pub const FIELD_RESOURCE: &str = "resource";
/// Per-thing array field holding global-read and legacy ACL markers
pub const FIELD_INTERNAL: &str = "__internal";
/// Marker field inside the internal array: global-read subject id
pub const FIELD_GLOBAL_READ: &str = "globalRead";
/// Marker field inside the internal array: legacy ACL subject id
pub const FIELD_ACL_ENTRY: &str = "aclEntry";

/// Separator between the thing id and the resource scope in document ids
pub const ID_SEPARATOR: char = ':';

/// Scope terminator group for scoped removal filters: the escaped scope is
/// followed by a deeper segment or ends the id, never by more characters of
/// a sibling scope (so a filter for feature `f1` cannot match `f10`).
const SCOPE_TERMINATOR: &str = "(/|$)";

/// One denormalized index entry for a content leaf
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexDocument {
    id: String,
    #[serde(rename = "grantedSubjectIds")]
    granted_subject_ids: BTreeSet<String>,
    #[serde(rename = "revokedSubjectIds")]
    revoked_subject_ids: BTreeSet<String>,
    resource: String,
}

impl IndexDocument {
    /// Create an index document
    pub fn new(
        id: String,
        granted_subject_ids: BTreeSet<String>,
        revoked_subject_ids: BTreeSet<String>,
        resource: String,
    ) -> Self {
        Self {
            id,
            granted_subject_ids,
            revoked_subject_ids,
            resource,
        }
    }

    /// The derived document id (`thingId:scope`)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Subjects with read effectively granted at this leaf
    pub fn granted_subject_ids(&self) -> &BTreeSet<String> {
        &self.granted_subject_ids
    }

    /// Subjects with read explicitly revoked at this leaf
    pub fn revoked_subject_ids(&self) -> &BTreeSet<String> {
        &self.revoked_subject_ids
    }

    /// The leaf's resource pointer string
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

/// Anchored-regex structural match over index-document ids
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalFilter {
    id_pattern: String,
}

impl RemovalFilter {
    /// Filter matching every document of a thing (`thingId:` prefix)
    pub fn thing_prefix(thing_id: &str) -> Self {
        Self {
            id_pattern: format!("^{}", regex::escape(&format!("{thing_id}{ID_SEPARATOR}"))),
        }
    }

    /// Filter matching one resource scope of a thing: the scope itself and
    /// everything below it, but no sibling scope sharing the prefix.
    ///
    /// `scope` is an already-escaped id suffix (see `escape::escape_pointer`);
    /// regex metacharacters are quoted here so both sides of the match use
    /// the same injective encoding.
    pub fn scoped(thing_id: &str, scope: &str) -> Self {
        Self {
            id_pattern: format!(
                "^{}{SCOPE_TERMINATOR}",
                regex::escape(&format!("{thing_id}{ID_SEPARATOR}{scope}"))
            ),
        }
    }

    /// The anchored regex over document ids
    pub fn id_pattern(&self) -> &str {
        &self.id_pattern
    }

    /// The store-boundary query form: `{"id": {"$regex": <pattern>}}`
    pub fn to_query(&self) -> serde_json::Value {
        json!({ FIELD_ID: { "$regex": self.id_pattern } })
    }
}

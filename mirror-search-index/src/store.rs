//! In-memory index store
//!
//! Applies [`WriteOp`] sequences against a plain document map using the
//! same anchored-regex semantics as the real store. Exists for tests and
//! local tooling; the production store adapter lives outside this crate and
//! owns retries, ordering and concurrency control.

use crate::document::IndexDocument;
use crate::error::{Result, SearchIndexError};
use crate::update::{IndexUpdate, WriteOp};
use regex::Regex;
use std::collections::BTreeMap;

/// Marker in a thing's internal array
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InternalMarker {
    /// Subject with partial read on the thing
    GlobalRead(String),
    /// Legacy ACL subject (predecessor scheme, only ever pulled)
    AclEntry(String),
}

/// Document map plus per-thing internal marker arrays
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    documents: BTreeMap<String, IndexDocument>,
    internal: BTreeMap<String, Vec<InternalMarker>>,
}

impl MemoryIndexStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update's write ops for a thing, in order
    pub fn apply(&mut self, thing_id: &str, update: &IndexUpdate) -> Result<()> {
        for op in update.write_ops() {
            match op {
                WriteOp::DeleteMany(filter) => {
                    let matcher = Regex::new(filter.id_pattern())
                        .map_err(|e| SearchIndexError::bad_filter(e.to_string()))?;
                    self.documents.retain(|id, _| !matcher.is_match(id));
                }
                WriteOp::InsertMany(docs) => {
                    for doc in docs {
                        self.documents.insert(doc.id().to_owned(), doc);
                    }
                }
                WriteOp::PullGlobalReads => {
                    if let Some(markers) = self.internal.get_mut(thing_id) {
                        markers.retain(|m| !matches!(m, InternalMarker::GlobalRead(_)));
                    }
                }
                WriteOp::PushGlobalReads(subject_ids) => {
                    let markers = self.internal.entry(thing_id.to_owned()).or_default();
                    markers.extend(subject_ids.into_iter().map(InternalMarker::GlobalRead));
                }
                WriteOp::PullAclEntries => {
                    if let Some(markers) = self.internal.get_mut(thing_id) {
                        markers.retain(|m| !matches!(m, InternalMarker::AclEntry(_)));
                    }
                }
            }
        }
        Ok(())
    }

    /// All documents, keyed by id
    pub fn documents(&self) -> &BTreeMap<String, IndexDocument> {
        &self.documents
    }

    /// All document ids, sorted
    pub fn document_ids(&self) -> Vec<&str> {
        self.documents.keys().map(String::as_str).collect()
    }

    /// Internal markers of one thing (empty slice when none)
    pub fn internal_markers(&self, thing_id: &str) -> &[InternalMarker] {
        self.internal
            .get(thing_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Seed a legacy ACL marker (predecessor scheme), for migration tests
    pub fn seed_acl_entry(&mut self, thing_id: &str, subject_id: impl Into<String>) {
        self.internal
            .entry(thing_id.to_owned())
            .or_default()
            .push(InternalMarker::AclEntry(subject_id.into()));
    }

    /// Number of documents in the store
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when the store holds no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

//! Policy model
//!
//! A [`Policy`] is the full access-control specification for a thing: a set
//! of labeled [`PolicyEntry`]s, each binding subjects to granted/revoked
//! permission sets on hierarchical resources. Policies are immutable once
//! built; a revision change replaces the whole object.
//!
//! The grant/revoke sets of a [`ResourceEntry`] must be disjoint - this is
//! checked at construction, and re-checked by the enforcer build for
//! policies that arrive through deserialization.

use crate::error::{Error, Result};
use crate::pointer::ResourcePointer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

/// Element of the fixed permission set.
///
/// Permissions are independent: granting or revoking one never implies
/// another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    /// Read access to a resource
    Read,
    /// Write access to a resource
    Write,
}

/// An authenticated principal: `(issuer, id, subject_type)`.
///
/// Identity is `(issuer, id)`; the subject type is descriptive only and
/// does not participate in equality or hashing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subject {
    issuer: String,
    id: String,
    #[serde(rename = "type")]
    subject_type: String,
}

impl Subject {
    /// Create a new subject
    pub fn new(
        issuer: impl Into<String>,
        id: impl Into<String>,
        subject_type: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            id: id.into(),
            subject_type: subject_type.into(),
        }
    }

    /// The issuing authority
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The subject id, unique per issuer.
    ///
    /// This is the string the enforcer indexes by and the string that ends
    /// up in index documents; deployments qualify it with the issuer
    /// upstream when ids can collide across issuers.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The descriptive subject type (e.g. a token kind)
    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }
}

impl PartialEq for Subject {
    fn eq(&self, other: &Self) -> bool {
        self.issuer == other.issuer && self.id == other.id
    }
}

impl Eq for Subject {}

impl Hash for Subject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.issuer.hash(state);
        self.id.hash(state);
    }
}

impl PartialOrd for Subject {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Subject {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.issuer, &self.id).cmp(&(&other.issuer, &other.id))
    }
}

/// One resource scope inside a policy entry: a pointer plus the permission
/// sets granted and revoked there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pointer: ResourcePointer,
    granted: BTreeSet<Permission>,
    revoked: BTreeSet<Permission>,
}

impl ResourceEntry {
    /// Create a resource entry.
    ///
    /// Fails with [`Error::InvalidPolicy`] if any permission appears in
    /// both the granted and the revoked set.
    pub fn new(
        pointer: ResourcePointer,
        granted: BTreeSet<Permission>,
        revoked: BTreeSet<Permission>,
    ) -> Result<Self> {
        let entry = Self {
            pointer,
            granted,
            revoked,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Check the grant/revoke disjointness invariant.
    ///
    /// Deserialized entries bypass [`ResourceEntry::new`], so consumers that
    /// accept policies from the wire re-run this check.
    pub fn validate(&self) -> Result<()> {
        if let Some(permission) = self.granted.intersection(&self.revoked).next() {
            return Err(Error::invalid_policy(format!(
                "permission {permission:?} both granted and revoked at '{}'",
                self.pointer
            )));
        }
        Ok(())
    }

    /// The resource this entry scopes
    pub fn pointer(&self) -> &ResourcePointer {
        &self.pointer
    }

    /// Permissions granted at this resource
    pub fn granted(&self) -> &BTreeSet<Permission> {
        &self.granted
    }

    /// Permissions revoked at this resource
    pub fn revoked(&self) -> &BTreeSet<Permission> {
        &self.revoked
    }
}

/// One labeled rule: a set of subjects bound to a set of resource entries
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    label: String,
    subjects: BTreeSet<Subject>,
    resources: Vec<ResourceEntry>,
}

impl PolicyEntry {
    /// Create a policy entry
    pub fn new(
        label: impl Into<String>,
        subjects: BTreeSet<Subject>,
        resources: Vec<ResourceEntry>,
    ) -> Self {
        Self {
            label: label.into(),
            subjects,
            resources,
        }
    }

    /// The entry label, unique within its policy
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The subjects this entry binds
    pub fn subjects(&self) -> &BTreeSet<Subject> {
        &self.subjects
    }

    /// The resource scopes this entry binds
    pub fn resources(&self) -> &[ResourceEntry] {
        &self.resources
    }
}

/// The full access-control specification for a thing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    id: String,
    entries: BTreeMap<String, PolicyEntry>,
}

impl Policy {
    /// Create a policy from pre-built entries, keyed by label
    pub fn new(id: impl Into<String>, entries: BTreeMap<String, PolicyEntry>) -> Self {
        Self {
            id: id.into(),
            entries,
        }
    }

    /// Start building a policy with the fluent [`PolicyBuilder`]
    pub fn builder(id: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder::new(id)
    }

    /// The policy id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The labeled entries, keyed by label
    pub fn entries(&self) -> &BTreeMap<String, PolicyEntry> {
        &self.entries
    }
}

/// Fluent builder for [`Policy`].
///
/// Mirrors the shape policies are written in: open a label, attach
/// subjects, then grant/revoke permissions at resources.
#[derive(Debug)]
pub struct PolicyBuilder {
    id: String,
    entries: BTreeMap<String, PolicyEntry>,
    current: Option<PolicyEntry>,
    error: Option<Error>,
}

impl PolicyBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: BTreeMap::new(),
            current: None,
            error: None,
        }
    }

    fn flush(&mut self) {
        if let Some(entry) = self.current.take() {
            self.entries.insert(entry.label.clone(), entry);
        }
    }

    /// Open a new labeled entry; closes the previous one
    pub fn for_label(mut self, label: impl Into<String>) -> Self {
        self.flush();
        self.current = Some(PolicyEntry::new(label, BTreeSet::new(), Vec::new()));
        self
    }

    /// Bind a subject to the current entry
    pub fn subject(mut self, subject: Subject) -> Self {
        if let Some(entry) = self.current.as_mut() {
            entry.subjects.insert(subject);
        } else if self.error.is_none() {
            self.error = Some(Error::invalid_policy("subject added before any label"));
        }
        self
    }

    /// Grant permissions at a resource in the current entry
    pub fn grant(
        self,
        pointer: ResourcePointer,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        self.resource(pointer, permissions.into_iter().collect(), BTreeSet::new())
    }

    /// Revoke permissions at a resource in the current entry
    pub fn revoke(
        self,
        pointer: ResourcePointer,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        self.resource(pointer, BTreeSet::new(), permissions.into_iter().collect())
    }

    /// Attach a full grant/revoke resource scope to the current entry
    pub fn resource(
        mut self,
        pointer: ResourcePointer,
        granted: BTreeSet<Permission>,
        revoked: BTreeSet<Permission>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.current.as_mut() {
            Some(entry) => match ResourceEntry::new(pointer, granted, revoked) {
                Ok(resource) => entry.resources.push(resource),
                Err(e) => self.error = Some(e),
            },
            None => self.error = Some(Error::invalid_policy("resource added before any label")),
        }
        self
    }

    /// Finish building; fails if any step recorded an error
    pub fn build(mut self) -> Result<Policy> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.flush();
        Ok(Policy {
            id: self.id,
            entries: self.entries,
        })
    }
}

//! Enforcer cache
//!
//! Enforcers are rebuilt whenever a policy revision changes and reused
//! across requests in between. The cache is externally owned - the enforcer
//! itself is stateless - and keyed by `(policy id, revision)`, so a revision
//! bump naturally misses and triggers a rebuild.
//!
//! When a build fails (structurally invalid replacement policy), the cache
//! keeps whatever entry it held before; callers continue serving from the
//! stale revision until a valid replacement arrives.

use crate::enforcer::PolicyEnforcer;
use crate::error::Result;
use mirror_core::Policy;
use std::collections::HashMap;
use std::sync::RwLock;

/// Cache of built enforcers, keyed by policy id and revision
#[derive(Debug, Default)]
pub struct EnforcerCache {
    entries: RwLock<HashMap<(String, u64), PolicyEnforcer>>,
}

impl EnforcerCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the enforcer for a policy revision
    pub fn get(&self, policy_id: &str, revision: u64) -> Option<PolicyEnforcer> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(policy_id.to_owned(), revision))
            .cloned()
    }

    /// Return the cached enforcer for `(policy.id(), revision)`, building
    /// and inserting it on a miss.
    ///
    /// A failed build leaves the cache untouched, so earlier revisions stay
    /// in service.
    pub fn get_or_build(&self, policy: &Policy, revision: u64) -> Result<PolicyEnforcer> {
        if let Some(enforcer) = self.get(policy.id(), revision) {
            return Ok(enforcer);
        }

        let enforcer = PolicyEnforcer::build(policy)?;
        tracing::debug!(policy_id = policy.id(), revision, "caching rebuilt enforcer");

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Drop superseded revisions of the same policy
        entries.retain(|(id, _), _| id != policy.id());
        entries.insert((policy.id().to_owned(), revision), enforcer.clone());
        Ok(enforcer)
    }

    /// Drop all cached revisions of a policy
    pub fn invalidate(&self, policy_id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(id, _), _| id != policy_id);
    }

    /// Number of cached enforcers
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True if the cache holds no enforcers
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

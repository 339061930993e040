//! # Mirror Policy
//!
//! Policy enforcement for the mirror digital-twin search stack.
//!
//! This crate provides:
//! - [`PolicyEnforcer`]: the resolved, queryable form of a policy (a
//!   segment trie with per-subject grant/revoke effects per node)
//! - [`EnforcerCache`]: externally-owned reuse of enforcers across
//!   requests, keyed by policy id and revision
//!
//! ## Evaluation semantics
//!
//! 1. **Deepest match wins**: the most specific resource entry naming a
//!    subject and permission determines the outcome
//! 2. **Revoke over grant**: at equal specificity, a revoke beats a grant
//! 3. **Default deny**: absence of any applicable entry means no permission
//! 4. **Totality**: queries never fail; unknown subjects and paths resolve
//!    to "no permission"
//!
//! The enforcer is pure and immutable after build: safe for unsynchronized
//! concurrent reads, cheap to clone, rebuilt (not mutated) on every policy
//! revision.

pub mod cache;
pub mod enforcer;
pub mod error;

pub use cache::EnforcerCache;
pub use enforcer::PolicyEnforcer;
pub use error::{PolicyError, Result};

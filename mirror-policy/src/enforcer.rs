//! Policy enforcer
//!
//! [`PolicyEnforcer`] is the resolved, queryable form of a [`Policy`]. Build
//! indexes every resource entry into a segment trie; per trie node it keeps,
//! per subject id, the permission sets explicitly granted and revoked there.
//! Queries walk the trie instead of re-scanning entries, so query cost
//! depends on pointer depth, not policy size.
//!
//! # Resolution semantics
//!
//! - The deepest (most specific) path with an explicit grant or revoke for
//!   a subject determines the outcome at a query pointer.
//! - At the same path, revoke overrides grant, even when another entry at
//!   that path grants the permission.
//! - Paths not ancestor-comparable to the query pointer are never consulted.
//! - No applicable entry means no permission (default deny).
//!
//! The enforcer is immutable after build and cheap to clone (Arc-wrapped
//! inner); one instance is bound to one policy revision.

use crate::error::{PolicyError, Result};
use mirror_core::{Permission, Policy, ResourcePointer};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Explicit grant/revoke sets for one subject at one trie node
#[derive(Debug, Default)]
struct Effect {
    grant: BTreeSet<Permission>,
    revoke: BTreeSet<Permission>,
}

/// One node of the resource trie
#[derive(Debug, Default)]
struct PathNode {
    children: BTreeMap<String, PathNode>,
    /// Subject id -> effect accumulated across all entries naming this path
    effects: BTreeMap<String, Effect>,
}

impl PathNode {
    fn descend_mut(&mut self, pointer: &ResourcePointer) -> &mut PathNode {
        let mut node = self;
        for segment in pointer.segments() {
            node = node.children.entry(segment.clone()).or_default();
        }
        node
    }
}

#[derive(Debug)]
struct EnforcerInner {
    policy_id: String,
    root: PathNode,
}

/// The resolved, queryable form of a policy.
///
/// Cloning is cheap; clones share the same immutable index, so one enforcer
/// can serve many concurrent readers without synchronization.
#[derive(Debug, Clone)]
pub struct PolicyEnforcer {
    inner: Arc<EnforcerInner>,
}

impl PolicyEnforcer {
    /// Build an enforcer from a policy.
    ///
    /// Fails with [`PolicyError::InvalidPolicy`] if any resource entry has a
    /// permission in both its granted and revoked set. Entries constructed
    /// through `ResourceEntry::new` cannot violate this, but policies that
    /// arrived through deserialization can, so build re-checks.
    pub fn build(policy: &Policy) -> Result<Self> {
        let mut root = PathNode::default();
        let mut resource_count = 0usize;

        for (label, entry) in policy.entries() {
            for resource in entry.resources() {
                resource.validate().map_err(|e| {
                    PolicyError::invalid_policy(policy.id(), format!("entry '{label}': {e}"))
                })?;

                let node = root.descend_mut(resource.pointer());
                for subject in entry.subjects() {
                    let effect = node.effects.entry(subject.id().to_owned()).or_default();
                    effect.grant.extend(resource.granted().iter().copied());
                    effect.revoke.extend(resource.revoked().iter().copied());
                }
                resource_count += 1;
            }
        }

        tracing::debug!(
            policy_id = policy.id(),
            entries = policy.entries().len(),
            resources = resource_count,
            "built policy enforcer"
        );

        Ok(Self {
            inner: Arc::new(EnforcerInner {
                policy_id: policy.id().to_owned(),
                root,
            }),
        })
    }

    /// Id of the policy this enforcer was built from
    pub fn policy_id(&self) -> &str {
        &self.inner.policy_id
    }

    /// True iff, for every permission in `required`, at least one of
    /// `subject_ids` has that permission effectively granted at `pointer`.
    ///
    /// Total: unknown subjects and unindexed pointers resolve to "no
    /// permission".
    pub fn has_permission(
        &self,
        pointer: &ResourcePointer,
        subject_ids: &[&str],
        required: &[Permission],
    ) -> bool {
        let nodes = self.nodes_along(pointer);
        required.iter().all(|&permission| {
            subject_ids
                .iter()
                .any(|subject_id| resolve(&nodes, subject_id, permission) == Some(true))
        })
    }

    /// Subjects for whom `permission` is effectively granted at `pointer`,
    /// respecting inheritance from ancestor paths.
    pub fn subject_ids_with_permission(
        &self,
        pointer: &ResourcePointer,
        permission: Permission,
    ) -> BTreeSet<String> {
        self.resolve_candidates(pointer, permission, true)
    }

    /// Subjects for whom `permission` is explicitly revoked at `pointer`
    /// (a revoke not overridden by a deeper grant along the path).
    ///
    /// Subjects the policy never mentions are in neither this set nor the
    /// granted set; default deny is absence, not revocation.
    pub fn subject_ids_with_revoked_permission(
        &self,
        pointer: &ResourcePointer,
        permission: Permission,
    ) -> BTreeSet<String> {
        self.resolve_candidates(pointer, permission, false)
    }

    /// Subjects who hold `permission` at `pointer` or at any descendant
    /// path, with no revoke at an equally-or-more-specific path in between.
    ///
    /// Flags subjects who can see *some* part of the subtree even when
    /// blocked from its root.
    pub fn subject_ids_with_partial_permission(
        &self,
        pointer: &ResourcePointer,
        permission: Permission,
    ) -> BTreeSet<String> {
        let nodes = self.nodes_along(pointer);
        let reached_pointer = nodes.len() == pointer.depth() + 1;

        let mut states: BTreeMap<&str, bool> = BTreeMap::new();
        let ancestors = if reached_pointer {
            &nodes[..nodes.len() - 1]
        } else {
            // Trie ends above the pointer: no descendants exist, partial
            // resolution degenerates to exact resolution.
            &nodes[..]
        };
        for node in ancestors {
            apply_effects(node, permission, &mut states);
        }

        let mut out = BTreeSet::new();
        if reached_pointer {
            collect_partial(nodes[nodes.len() - 1], permission, &states, &mut out);
        } else {
            for (subject_id, granted) in &states {
                if *granted {
                    out.insert((*subject_id).to_owned());
                }
            }
        }
        out
    }

    /// Trie nodes from the root to the deepest existing node along
    /// `pointer`; always contains at least the root node.
    fn nodes_along(&self, pointer: &ResourcePointer) -> Vec<&PathNode> {
        let mut nodes = Vec::with_capacity(pointer.depth() + 1);
        let mut node = &self.inner.root;
        nodes.push(node);
        for segment in pointer.segments() {
            match node.children.get(segment) {
                Some(child) => {
                    node = child;
                    nodes.push(node);
                }
                None => break,
            }
        }
        nodes
    }

    /// Resolve every subject mentioned along `pointer` and keep those whose
    /// outcome matches `granted`.
    fn resolve_candidates(
        &self,
        pointer: &ResourcePointer,
        permission: Permission,
        granted: bool,
    ) -> BTreeSet<String> {
        let nodes = self.nodes_along(pointer);
        let mut out = BTreeSet::new();
        for node in &nodes {
            for subject_id in node.effects.keys() {
                if out.contains(subject_id) {
                    continue;
                }
                if resolve(&nodes, subject_id, permission) == Some(granted) {
                    out.insert(subject_id.clone());
                }
            }
        }
        out
    }
}

/// Effective state of one subject for one permission along a node path.
///
/// `Some(true)` = granted, `Some(false)` = explicitly revoked, `None` = no
/// applicable entry. Deeper nodes override shallower ones; within one node a
/// revoke wins over a grant.
fn resolve(nodes: &[&PathNode], subject_id: &str, permission: Permission) -> Option<bool> {
    let mut state = None;
    for node in nodes {
        if let Some(effect) = node.effects.get(subject_id) {
            if effect.revoke.contains(&permission) {
                state = Some(false);
            } else if effect.grant.contains(&permission) {
                state = Some(true);
            }
        }
    }
    state
}

/// Fold one node's effects into the running per-subject states
fn apply_effects<'a>(
    node: &'a PathNode,
    permission: Permission,
    states: &mut BTreeMap<&'a str, bool>,
) {
    for (subject_id, effect) in &node.effects {
        if effect.revoke.contains(&permission) {
            states.insert(subject_id, false);
        } else if effect.grant.contains(&permission) {
            states.insert(subject_id, true);
        }
    }
}

/// Depth-first walk of a subtree, collecting every subject whose state
/// becomes "granted" at any node.
fn collect_partial<'a>(
    node: &'a PathNode,
    permission: Permission,
    inherited: &BTreeMap<&'a str, bool>,
    out: &mut BTreeSet<String>,
) {
    let mut states = inherited.clone();
    apply_effects(node, permission, &mut states);
    for (subject_id, granted) in &states {
        if *granted {
            out.insert((*subject_id).to_owned());
        }
    }
    for child in node.children.values() {
        collect_partial(child, permission, &states, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::{Policy, Subject};
    use Permission::{Read, Write};

    fn ptr(s: &str) -> ResourcePointer {
        ResourcePointer::parse(s)
    }

    fn subject(id: &str) -> Subject {
        Subject::new("iss", id, "jwt")
    }

    fn ids(xs: &[&str]) -> BTreeSet<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_deny() {
        let policy = Policy::builder("p")
            .for_label("owner")
            .subject(subject("alice"))
            .grant(ptr("/"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        // Unknown subject and unmentioned permission both deny
        assert!(!enforcer.has_permission(&ptr("/"), &["nobody"], &[Read]));
        assert!(!enforcer.has_permission(&ptr("/"), &["alice"], &[Write]));
        // The root grant is inherited by paths the trie never indexed
        assert!(enforcer.has_permission(&ptr("/attributes/deep/unknown"), &["alice"], &[Read]));
    }

    #[test]
    fn test_deepest_match_wins() {
        let policy = Policy::builder("p")
            .for_label("broad")
            .subject(subject("alice"))
            .grant(ptr("/"), [Read])
            .for_label("narrow")
            .subject(subject("alice"))
            .grant(ptr("/a/b"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        assert!(enforcer.has_permission(&ptr("/a/b"), &["alice"], &[Read]));
        // The deeper grant also covers descendants
        assert!(enforcer.has_permission(&ptr("/a/b/c"), &["alice"], &[Read]));
    }

    #[test]
    fn test_deeper_revoke_blocks_inherited_grant() {
        let policy = Policy::builder("p")
            .for_label("owner")
            .subject(subject("alice"))
            .grant(ptr("/"), [Read])
            .for_label("block")
            .subject(subject("alice"))
            .revoke(ptr("/features/secret"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        assert!(enforcer.has_permission(&ptr("/"), &["alice"], &[Read]));
        assert!(!enforcer.has_permission(&ptr("/features/secret"), &["alice"], &[Read]));
        assert!(!enforcer.has_permission(&ptr("/features/secret/properties/x"), &["alice"], &[Read]));
        // Sibling resources stay readable
        assert!(enforcer.has_permission(&ptr("/features/lamp"), &["alice"], &[Read]));
    }

    #[test]
    fn test_deeper_grant_overrides_revoke() {
        let policy = Policy::builder("p")
            .for_label("blocked")
            .subject(subject("alice"))
            .revoke(ptr("/features"), [Read])
            .for_label("except")
            .subject(subject("alice"))
            .grant(ptr("/features/lamp"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        assert!(!enforcer.has_permission(&ptr("/features"), &["alice"], &[Read]));
        assert!(enforcer.has_permission(&ptr("/features/lamp"), &["alice"], &[Read]));
    }

    #[test]
    fn test_same_path_revoke_overrides_grant() {
        let policy = Policy::builder("p")
            .for_label("grant")
            .subject(subject("alice"))
            .grant(ptr("/x"), [Write])
            .for_label("revoke")
            .subject(subject("alice"))
            .revoke(ptr("/x"), [Write])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        assert!(!enforcer.has_permission(&ptr("/x"), &["alice"], &[Write]));
    }

    #[test]
    fn test_has_permission_any_subject_per_permission() {
        let policy = Policy::builder("p")
            .for_label("reader")
            .subject(subject("reader"))
            .grant(ptr("/"), [Read])
            .for_label("writer")
            .subject(subject("writer"))
            .grant(ptr("/"), [Write])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        // Together the two subjects cover READ+WRITE
        assert!(enforcer.has_permission(&ptr("/"), &["reader", "writer"], &[Read, Write]));
        // Neither alone does
        assert!(!enforcer.has_permission(&ptr("/"), &["reader"], &[Read, Write]));
        assert!(!enforcer.has_permission(&ptr("/"), &["writer"], &[Read, Write]));
    }

    #[test]
    fn test_subject_ids_with_permission() {
        let policy = Policy::builder("p")
            .for_label("owner")
            .subject(subject("alice"))
            .subject(subject("bob"))
            .grant(ptr("/"), [Read])
            .for_label("block-bob")
            .subject(subject("bob"))
            .revoke(ptr("/attributes"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        let at_root = enforcer.subject_ids_with_permission(&ptr("/"), Read);
        assert_eq!(at_root, ids(&["alice", "bob"]));

        let at_attrs = enforcer.subject_ids_with_permission(&ptr("/attributes"), Read);
        assert_eq!(at_attrs, ids(&["alice"]));

        let revoked = enforcer.subject_ids_with_revoked_permission(&ptr("/attributes"), Read);
        assert_eq!(revoked, ids(&["bob"]));
    }

    #[test]
    fn test_partial_permission() {
        let policy = Policy::builder("p")
            .for_label("feature-only")
            .subject(subject("carol"))
            .grant(ptr("/features/f1"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        // carol cannot read the root itself...
        assert!(enforcer
            .subject_ids_with_permission(&ptr("/"), Read)
            .is_empty());
        // ...but partially sees the tree
        let partial = enforcer.subject_ids_with_partial_permission(&ptr("/"), Read);
        assert_eq!(partial, ids(&["carol"]));
    }

    #[test]
    fn test_partial_permission_respects_intermediate_revoke() {
        // A revoke below a shallow grant blocks the subtree under it,
        // but partial visibility at the grant level itself is unaffected.
        let policy = Policy::builder("p")
            .for_label("grant-shallow")
            .subject(subject("dave"))
            .grant(ptr("/a"), [Read])
            .for_label("revoke-deep")
            .subject(subject("dave"))
            .revoke(ptr("/a/b"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        // dave reads /a, so partial at /a holds regardless of the deeper revoke
        assert_eq!(
            enforcer.subject_ids_with_partial_permission(&ptr("/a"), Read),
            ids(&["dave"])
        );
        // At /a/b the revoke is decisive and nothing deeper re-grants
        assert!(enforcer
            .subject_ids_with_partial_permission(&ptr("/a/b"), Read)
            .is_empty());
    }

    #[test]
    fn test_partial_permission_regrant_below_revoke() {
        let policy = Policy::builder("p")
            .for_label("revoke")
            .subject(subject("erin"))
            .revoke(ptr("/features"), [Read])
            .for_label("regrant")
            .subject(subject("erin"))
            .grant(ptr("/features/f1/properties/on"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        // The deeper grant re-grants below the revoke, so erin partially
        // sees the features subtree (and the whole tree).
        assert_eq!(
            enforcer.subject_ids_with_partial_permission(&ptr("/features"), Read),
            ids(&["erin"])
        );
        assert_eq!(
            enforcer.subject_ids_with_partial_permission(&ptr("/"), Read),
            ids(&["erin"])
        );
        // Exact resolution at /features still denies
        assert!(!enforcer.has_permission(&ptr("/features"), &["erin"], &[Read]));
    }

    #[test]
    fn test_partial_below_trie_depth() {
        let policy = Policy::builder("p")
            .for_label("owner")
            .subject(subject("alice"))
            .grant(ptr("/attributes"), [Read])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        // Query below any indexed path: partial degenerates to exact
        assert_eq!(
            enforcer.subject_ids_with_partial_permission(&ptr("/attributes/a/b"), Read),
            ids(&["alice"])
        );
        assert!(enforcer
            .subject_ids_with_partial_permission(&ptr("/features/f1"), Read)
            .is_empty());
    }

    #[test]
    fn test_build_rejects_overlapping_sets() {
        // ResourceEntry::new cannot produce overlap; a deserialized policy can
        let json = r#"{
            "id": "bad",
            "entries": {
                "e": {
                    "label": "e",
                    "subjects": [{"issuer": "iss", "id": "alice", "type": "jwt"}],
                    "resources": [{"pointer": "/", "granted": ["READ"], "revoked": ["READ"]}]
                }
            }
        }"#;
        let policy: Policy = serde_json::from_str(json).unwrap();
        let err = PolicyEnforcer::build(&policy).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPolicy { .. }));
    }

    #[test]
    fn test_permissions_are_independent() {
        let policy = Policy::builder("p")
            .for_label("writer")
            .subject(subject("alice"))
            .grant(ptr("/"), [Write])
            .build()
            .unwrap();
        let enforcer = PolicyEnforcer::build(&policy).unwrap();

        assert!(enforcer.has_permission(&ptr("/"), &["alice"], &[Write]));
        assert!(!enforcer.has_permission(&ptr("/"), &["alice"], &[Read]));
    }
}

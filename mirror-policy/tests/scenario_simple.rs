//! Calibration scenario: one entry granting READ+WRITE at the thing root to
//! two subjects, a second entry revoking WRITE at the same root for one of
//! them. Exercises same-path revoke-over-grant together with default deny
//! for unmentioned subjects.

use mirror_core::{Permission, Policy, ResourcePointer, Subject};
use mirror_policy::PolicyEnforcer;
use Permission::{Read, Write};

const SUBJECT_ALL_GRANTED: &str = "sid_all";
const SUBJECT_NONE_GRANTED: &str = "sid_none";
const SUBJECT_WRITE_REVOKED: &str = "sid_write_revoke";

fn scenario_policy() -> Policy {
    let issuer = "https://accounts.google.com";
    Policy::builder("benchmark:Scenario1Simple1")
        .for_label("all")
        .subject(Subject::new(issuer, SUBJECT_ALL_GRANTED, "jwt"))
        .subject(Subject::new(issuer, SUBJECT_WRITE_REVOKED, "jwt"))
        .grant(ResourcePointer::root(), [Read, Write])
        .for_label("revokeWrite")
        .subject(Subject::new(issuer, SUBJECT_WRITE_REVOKED, "jwt"))
        .revoke(ResourcePointer::root(), [Write])
        .build()
        .expect("scenario policy is well-formed")
}

#[test]
fn fully_granted_subject_has_read_and_write() {
    let enforcer = PolicyEnforcer::build(&scenario_policy()).unwrap();
    let root = ResourcePointer::root();

    assert!(enforcer.has_permission(&root, &[SUBJECT_ALL_GRANTED], &[Read, Write]));
}

#[test]
fn write_revoked_subject_keeps_read_loses_write() {
    let enforcer = PolicyEnforcer::build(&scenario_policy()).unwrap();
    let root = ResourcePointer::root();

    assert!(enforcer.has_permission(&root, &[SUBJECT_WRITE_REVOKED], &[Read]));
    assert!(!enforcer.has_permission(&root, &[SUBJECT_WRITE_REVOKED], &[Write]));
    assert!(!enforcer.has_permission(&root, &[SUBJECT_WRITE_REVOKED], &[Read, Write]));
}

#[test]
fn unmentioned_subject_has_nothing() {
    let enforcer = PolicyEnforcer::build(&scenario_policy()).unwrap();
    let root = ResourcePointer::root();

    assert!(!enforcer.has_permission(&root, &[SUBJECT_NONE_GRANTED], &[Read]));
    assert!(!enforcer.has_permission(&root, &[SUBJECT_NONE_GRANTED], &[Write]));
}

#[test]
fn revoke_applies_at_descendants_too() {
    let enforcer = PolicyEnforcer::build(&scenario_policy()).unwrap();
    let deep = ResourcePointer::parse("/features/lamp/properties/on");

    assert!(enforcer.has_permission(&deep, &[SUBJECT_WRITE_REVOKED], &[Read]));
    assert!(!enforcer.has_permission(&deep, &[SUBJECT_WRITE_REVOKED], &[Write]));
    assert!(enforcer.has_permission(&deep, &[SUBJECT_ALL_GRANTED], &[Read, Write]));
}

#[test]
fn granted_and_revoked_subject_sets_at_root() {
    let enforcer = PolicyEnforcer::build(&scenario_policy()).unwrap();
    let root = ResourcePointer::root();

    let readers = enforcer.subject_ids_with_permission(&root, Read);
    assert!(readers.contains(SUBJECT_ALL_GRANTED));
    assert!(readers.contains(SUBJECT_WRITE_REVOKED));
    assert!(!readers.contains(SUBJECT_NONE_GRANTED));

    let writers = enforcer.subject_ids_with_permission(&root, Write);
    assert!(writers.contains(SUBJECT_ALL_GRANTED));
    assert!(!writers.contains(SUBJECT_WRITE_REVOKED));

    let write_revoked = enforcer.subject_ids_with_revoked_permission(&root, Write);
    assert!(write_revoked.contains(SUBJECT_WRITE_REVOKED));
    assert!(!write_revoked.contains(SUBJECT_ALL_GRANTED));
}

#[test]
fn partial_read_equals_full_read_for_root_grants() {
    let enforcer = PolicyEnforcer::build(&scenario_policy()).unwrap();
    let root = ResourcePointer::root();

    assert_eq!(
        enforcer.subject_ids_with_partial_permission(&root, Read),
        enforcer.subject_ids_with_permission(&root, Read)
    );
}

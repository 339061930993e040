//! # Mirror Core
//!
//! Shared model types for the mirror digital-twin search stack.
//!
//! This crate provides:
//! - [`ResourcePointer`]: hierarchical addressing into a thing's content
//! - [`TwinValue`]: the closed content value set (null, bool, number,
//!   string, array, object)
//! - The policy model: [`Subject`], [`Permission`], [`ResourceEntry`],
//!   [`PolicyEntry`], [`Policy`]
//! - The thing model: [`Thing`], [`Feature`]
//!
//! ## Design principles
//!
//! 1. **Pure data**: no I/O, no async, no interior mutability
//! 2. **Deterministic serialization**: ordered maps/sets throughout, so a
//!    policy or thing always serializes the same way
//! 3. **Validate at the boundary**: malformed segments and overlapping
//!    grant/revoke sets are rejected at construction, never corrected

pub mod error;
pub mod pointer;
pub mod policy;
pub mod thing;
pub mod value;

pub use error::{Error, Result};
pub use pointer::{ResourcePointer, SEPARATOR};
pub use policy::{Permission, Policy, PolicyBuilder, PolicyEntry, ResourceEntry, Subject};
pub use thing::{
    attribute_pointer, attributes_pointer, feature_pointer, feature_property_pointer, Attributes,
    Feature, Features, Thing, ATTRIBUTES_PREFIX, FEATURES_PREFIX, PROPERTIES_SEGMENT,
};
pub use value::{TwinObject, TwinValue};

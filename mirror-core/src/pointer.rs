//! Hierarchical resource pointers
//!
//! A `ResourcePointer` addresses a location inside a thing's content tree:
//! the whole thing (`/`), an attribute subtree (`/attributes/location/city`),
//! a feature (`/features/lamp`) or a feature property
//! (`/features/lamp/properties/on`).
//!
//! Pointers are ordered sequences of segments. Pointer `a` is an ancestor of
//! pointer `b` iff `a`'s segments are a prefix of `b`'s segments; the root
//! pointer is an ancestor of everything. Segments never contain the `/`
//! separator; [`ResourcePointer::append`] rejects such input rather than
//! silently splitting it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The path separator used in pointer strings
pub const SEPARATOR: char = '/';

/// Hierarchical address into a thing's content, or the whole-thing root
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ResourcePointer {
    segments: Vec<String>,
}

impl ResourcePointer {
    /// The root pointer `/`, addressing the whole thing
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a pointer from its string form.
    ///
    /// Leading/trailing separators and empty segments are ignored, so
    /// `"/attributes/foo"`, `"attributes/foo"` and `"attributes/foo/"` all
    /// parse to the same pointer. The empty string and `"/"` parse to the
    /// root pointer. Parsing is total.
    pub fn parse(s: &str) -> Self {
        let segments = s
            .split(SEPARATOR)
            .filter(|seg| !seg.is_empty())
            .map(str::to_owned)
            .collect();
        Self { segments }
    }

    /// Build a pointer from pre-split segments.
    ///
    /// Fails with [`Error::InvalidSegment`] if any segment contains the
    /// separator.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pointer = Self::root();
        for segment in segments {
            pointer = pointer.append(segment)?;
        }
        Ok(pointer)
    }

    /// True if this is the root pointer
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The pointer's segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments (0 for the root pointer)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True iff `self`'s segments are a prefix of `other`'s segments.
    ///
    /// Every pointer is an ancestor of itself; the root pointer is an
    /// ancestor of everything.
    pub fn is_ancestor_of(&self, other: &ResourcePointer) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments == other.segments[..self.segments.len()]
    }

    /// Return a new pointer with `segment` appended.
    ///
    /// Fails with [`Error::InvalidSegment`] if the segment contains the
    /// separator; malformed input is rejected at the boundary, never
    /// silently corrected.
    pub fn append(&self, segment: impl Into<String>) -> Result<Self> {
        let segment = segment.into();
        if segment.contains(SEPARATOR) {
            return Err(Error::invalid_segment(format!(
                "segment '{segment}' contains the separator '{SEPARATOR}'"
            )));
        }
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// Return a new pointer with all of `other`'s segments appended
    pub fn concat(&self, other: &ResourcePointer) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// The canonical string form: `/seg1/seg2`, or `/` for the root
    pub fn to_pointer_string(&self) -> String {
        if self.segments.is_empty() {
            SEPARATOR.to_string()
        } else {
            let mut out = String::new();
            for segment in &self.segments {
                out.push(SEPARATOR);
                out.push_str(segment);
            }
            out
        }
    }
}

impl fmt::Display for ResourcePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer_string())
    }
}

impl From<String> for ResourcePointer {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ResourcePointer> for String {
    fn from(pointer: ResourcePointer) -> Self {
        pointer.to_pointer_string()
    }
}

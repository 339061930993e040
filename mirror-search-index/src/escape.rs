//! Key escaping for index-document ids and field names
//!
//! Document ids embed thing ids and pointer segments; the store reserves
//! `$` and `.` in field paths and this module reserves `~` as its own escape
//! introducer. The encoding is injective: two distinct inputs never escape
//! to the same output, which is what lets removal filters built from
//! escaped ids target exactly the intended id family.
//!
//! `/` needs no escape here: pointer segments are validated to never
//! contain the separator, so a literal `/` in an id is always a segment
//! boundary.

use mirror_core::ResourcePointer;

const TILDE: char = '~';
const DOLLAR: char = '$';
const DOT: char = '.';

/// Escape one key (a pointer segment, a thing id, or a map key used as a
/// store field name)
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            TILDE => out.push_str("~0"),
            DOLLAR => out.push_str("~1"),
            DOT => out.push_str("~2"),
            other => out.push(other),
        }
    }
    out
}

/// Reverse [`escape_key`]. Unknown escape sequences pass through verbatim.
pub fn unescape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        if c == TILDE {
            match chars.next() {
                Some('0') => out.push(TILDE),
                Some('1') => out.push(DOLLAR),
                Some('2') => out.push(DOT),
                Some(other) => {
                    out.push(TILDE);
                    out.push(other);
                }
                None => out.push(TILDE),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape a pointer into an id suffix: escaped segments joined by `/`,
/// without a leading separator (the root pointer becomes the empty string).
pub fn escape_pointer(pointer: &ResourcePointer) -> String {
    pointer
        .segments()
        .iter()
        .map(|segment| escape_key(segment))
        .collect::<Vec<_>>()
        .join("/")
}

//! TwinValue - polymorphic thing-content value type
//!
//! Attribute and feature-property values form a closed, enumerated set:
//! null, boolean, number, string, array or nested object. Arrays are opaque
//! leaves and are never decomposed further; only objects nest.
//!
//! ## Number contract
//!
//! Integral JSON numbers that round-trip through a 64-bit signed integer are
//! held as [`TwinValue::Long`]; everything else falls back to
//! [`TwinValue::Double`]. The `#[serde(untagged)]` variant order encodes the
//! same preference for deserialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nested key/value object, ordered for deterministic serialization
pub type TwinObject = BTreeMap<String, TwinValue>;

/// Polymorphic value type for thing content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TwinValue {
    /// JSON null
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer (integral numbers that fit)
    Long(i64),
    /// 64-bit floating point (fallback for everything else numeric)
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Array - an opaque leaf, never decomposed
    Array(Vec<TwinValue>),
    /// Nested object - the only variant that nests
    Object(TwinObject),
}

impl TwinValue {
    /// True if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, TwinValue::Null)
    }

    /// True if this is a nested object
    pub fn is_object(&self) -> bool {
        matches!(self, TwinValue::Object(_))
    }

    /// The nested object fields, if this is an object
    pub fn as_object(&self) -> Option<&TwinObject> {
        match self {
            TwinValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Convert from a `serde_json::Value`, applying the number contract
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TwinValue::Null,
            serde_json::Value::Bool(b) => TwinValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(long) => TwinValue::Long(long),
                None => TwinValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => TwinValue::String(s),
            serde_json::Value::Array(items) => {
                TwinValue::Array(items.into_iter().map(TwinValue::from_json).collect())
            }
            serde_json::Value::Object(fields) => TwinValue::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, TwinValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert into a `serde_json::Value`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            TwinValue::Null => serde_json::Value::Null,
            TwinValue::Bool(b) => serde_json::Value::Bool(*b),
            TwinValue::Long(l) => serde_json::Value::from(*l),
            TwinValue::Double(d) => {
                serde_json::Number::from_f64(*d).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            TwinValue::String(s) => serde_json::Value::String(s.clone()),
            TwinValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(TwinValue::to_json).collect())
            }
            TwinValue::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for TwinValue {
    fn from(value: serde_json::Value) -> Self {
        TwinValue::from_json(value)
    }
}

impl From<TwinValue> for serde_json::Value {
    fn from(value: TwinValue) -> Self {
        value.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integral_numbers_become_long() {
        assert_eq!(TwinValue::from_json(json!(5)), TwinValue::Long(5));
        assert_eq!(TwinValue::from_json(json!(-12)), TwinValue::Long(-12));
        assert_eq!(TwinValue::from_json(json!(i64::MAX)), TwinValue::Long(i64::MAX));
    }

    #[test]
    fn test_non_integral_numbers_fall_back_to_double() {
        assert_eq!(TwinValue::from_json(json!(5.5)), TwinValue::Double(5.5));
        // u64 beyond i64 range cannot round-trip through i64
        let big = u64::MAX;
        match TwinValue::from_json(json!(big)) {
            TwinValue::Double(_) => {}
            other => panic!("expected Double, got {other:?}"),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let value = TwinValue::from_json(json!({
            "on": true,
            "color": {"r": 0, "g": 255, "b": 0},
            "tags": ["a", "b"],
            "brightness": 0.75,
            "note": null
        }));
        assert_eq!(
            value.to_json(),
            json!({
                "on": true,
                "color": {"r": 0, "g": 255, "b": 0},
                "tags": ["a", "b"],
                "brightness": 0.75,
                "note": null
            })
        );
    }

    #[test]
    fn test_untagged_deserialize_matches_contract() {
        let v: TwinValue = serde_json::from_str("42").unwrap();
        assert_eq!(v, TwinValue::Long(42));
        let v: TwinValue = serde_json::from_str("42.5").unwrap();
        assert_eq!(v, TwinValue::Double(42.5));
        let v: TwinValue = serde_json::from_str("null").unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_array_is_opaque() {
        let v = TwinValue::from_json(json!([{"nested": 1}]));
        assert!(matches!(v, TwinValue::Array(_)));
        assert!(!v.is_object());
    }
}

//! Tag Matching
//!
//! Resource metadata is an arbitrary JSON object. Recipes match against it
//! with a pattern that only needs to cover the keys it cares about.

use serde_json::{Map, Value};

/// Metadata attached to a fluid stack
pub type TagCompound = Map<String, Value>;

/// Wildcard value: matches any value present under the same key
pub const WILDCARD: &str = "*";

/// Check a candidate tag against an optional pattern.
///
/// No pattern matches everything. A pattern against a missing tag only
/// matches when the pattern itself is empty.
pub fn matches(pattern: Option<&TagCompound>, candidate: Option<&TagCompound>) -> bool {
    match (pattern, candidate) {
        (None, _) => true,
        (Some(pattern), None) => pattern.is_empty(),
        (Some(pattern), Some(candidate)) => match_compound(pattern, candidate),
    }
}

fn match_compound(pattern: &TagCompound, candidate: &TagCompound) -> bool {
    pattern.iter().all(|(key, expected)| {
        candidate
            .get(key)
            .is_some_and(|actual| match_value(expected, actual))
    })
}

fn match_value(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(pattern), Value::Object(candidate)) => match_compound(pattern, candidate),
        // Every pattern element must be found somewhere in the candidate list
        (Value::Array(pattern), Value::Array(candidate)) => pattern
            .iter()
            .all(|p| candidate.iter().any(|c| match_value(p, c))),
        (Value::String(s), _) if s == WILDCARD => true,
        (Value::String(s), Value::Number(n)) => match (Comparison::parse(s), n.as_f64()) {
            (Some(cmp), Some(value)) => cmp.test(value),
            _ => false,
        },
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        _ => expected == actual,
    }
}

/// Numeric comparison written as a string pattern, e.g. `">=5"`
#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparison {
    Equal(f64),
    NotEqual(f64),
    Less(f64),
    LessEqual(f64),
    Greater(f64),
    GreaterEqual(f64),
}

impl Comparison {
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        // Two-character operators first so ">=" isn't read as ">"
        let (op, rest) = ["==", "!=", "<=", ">=", "<", ">"]
            .iter()
            .find_map(|op| s.strip_prefix(op).map(|rest| (*op, rest)))?;
        let value: f64 = rest.trim().parse().ok()?;
        Some(match op {
            "==" => Comparison::Equal(value),
            "!=" => Comparison::NotEqual(value),
            "<=" => Comparison::LessEqual(value),
            ">=" => Comparison::GreaterEqual(value),
            "<" => Comparison::Less(value),
            _ => Comparison::Greater(value),
        })
    }

    fn test(&self, actual: f64) -> bool {
        match *self {
            Comparison::Equal(v) => actual == v,
            Comparison::NotEqual(v) => actual != v,
            Comparison::Less(v) => actual < v,
            Comparison::LessEqual(v) => actual <= v,
            Comparison::Greater(v) => actual > v,
            Comparison::GreaterEqual(v) => actual >= v,
        }
    }
}

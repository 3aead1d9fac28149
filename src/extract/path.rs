//! Safe path access into loosely-shaped JSON
//!
//! [`Lookup`] wraps an optional node. Navigating through a missing segment
//! yields another empty lookup instead of failing, and every typed accessor
//! has a documented default, so sibling fields never depend on each other.

use serde_json::Value;

/// A possibly-absent position inside a JSON document
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    node: Option<&'a Value>,
}

impl<'a> Lookup<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { node: Some(value) }
    }

    pub fn missing() -> Self {
        Self { node: None }
    }

    /// Follows a JSON pointer (`/a/b/0/c`) relative to this position
    pub fn at(&self, pointer: &str) -> Lookup<'a> {
        Lookup {
            node: self.node.and_then(|v| v.pointer(pointer)),
        }
    }

    /// The last element of an array position
    pub fn last(&self) -> Lookup<'a> {
        Lookup {
            node: self.node.and_then(Value::as_array).and_then(|a| a.last()),
        }
    }

    pub fn value(&self) -> Option<&'a Value> {
        self.node.filter(|v| !v.is_null())
    }

    pub fn exists(&self) -> bool {
        self.value().is_some()
    }

    pub fn str(&self) -> Option<&'a str> {
        self.node.and_then(Value::as_str)
    }

    /// Non-empty string value
    pub fn string(&self) -> Option<String> {
        self.str().filter(|s| !s.is_empty()).map(str::to_string)
    }

    /// String value, empty when absent
    pub fn text(&self) -> String {
        self.str().unwrap_or_default().to_string()
    }

    pub fn bool(&self) -> Option<bool> {
        self.node.and_then(Value::as_bool)
    }

    pub fn i64(&self) -> Option<i64> {
        self.node.and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Count stored as a number or as an abbreviated string ("1,204", "3.4K")
    pub fn count(&self) -> Option<u64> {
        self.node.and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => parse_abbreviated_count(s),
            _ => None,
        })
    }

    pub fn count_or_zero(&self) -> u64 {
        self.count().unwrap_or(0)
    }

    /// Array elements, empty when absent or not an array
    pub fn array(&self) -> &'a [Value] {
        self.node
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Parses counts such as `"12"`, `"1,204"`, `"3.4K"` or `"2M"`
pub fn parse_abbreviated_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let (number, multiplier) = match cleaned.chars().last()? {
        'K' | 'k' => (&cleaned[..cleaned.len() - 1], 1_000f64),
        'M' | 'm' => (&cleaned[..cleaned.len() - 1], 1_000_000f64),
        _ => (cleaned.as_str(), 1f64),
    };

    if multiplier == 1f64 {
        return number.parse().ok();
    }

    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value.is_sign_negative() {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

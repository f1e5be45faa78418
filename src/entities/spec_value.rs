//! Typed specification values for the open-ended `specifications` map on parts
//!
//! Catalog rows carry free-form key/value specifications. At the boundary
//! every value is narrowed to a [`SpecValue`] so comparisons can pattern-match
//! on the variant instead of guessing at runtime types.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single specification value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SpecValue {
    /// Numeric view of the value.
    ///
    /// Text that parses as a number (e.g. `"0.75"`) is accepted, as catalog
    /// imports frequently store measurements as strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SpecValue::Number(n) if n.is_finite() => Some(*n),
            SpecValue::Number(_) => None,
            SpecValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            SpecValue::Bool(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SpecValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            SpecValue::Bool(_) => "bool",
            SpecValue::Number(_) => "number",
            SpecValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Bool(b) => write!(f, "{}", b),
            SpecValue::Number(n) => write!(f, "{}", format_number(*n)),
            SpecValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for SpecValue {
    fn from(n: f64) -> Self {
        SpecValue::Number(n)
    }
}

impl From<i64> for SpecValue {
    fn from(n: i64) -> Self {
        SpecValue::Number(n as f64)
    }
}

impl From<i32> for SpecValue {
    fn from(n: i32) -> Self {
        SpecValue::Number(n as f64)
    }
}

impl From<&str> for SpecValue {
    fn from(s: &str) -> Self {
        SpecValue::Text(s.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(s: String) -> Self {
        SpecValue::Text(s)
    }
}

impl From<bool> for SpecValue {
    fn from(b: bool) -> Self {
        SpecValue::Bool(b)
    }
}

/// Render a number without trailing zeros (`0.75`, `1`, `12.5`)
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let s = format!("{:.4}", n);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Specification map of a part, keyed by specification name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Specifications(BTreeMap<String, SpecValue>);

impl Specifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SpecValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Numeric value of a key, `None` when absent or not numeric
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(SpecValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SpecValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SpecValue)> {
        self.0.iter()
    }

    /// Narrow a loosely-typed JSON object into typed specifications.
    ///
    /// Nulls are treated as absent. Nested arrays and objects cannot take part
    /// in comparisons and are dropped.
    pub fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut specs = Specifications::new();
        for (key, value) in map {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::Bool(b) => specs.insert(key, b),
                serde_json::Value::Number(n) => match n.as_f64() {
                    Some(f) => specs.insert(key, f),
                    None => tracing::debug!(key = %key, "dropping non-finite specification number"),
                },
                serde_json::Value::String(s) => specs.insert(key, s),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    tracing::debug!(key = %key, "dropping nested specification value");
                }
            }
        }
        specs
    }
}

impl<K: Into<String>, V: Into<SpecValue>> FromIterator<(K, V)> for Specifications {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut specs = Specifications::new();
        for (k, v) in iter {
            specs.insert(k, v);
        }
        specs
    }
}

impl<'de> Deserialize<'de> for Specifications {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
        Ok(raw.map(Specifications::from_json_map).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_is_numeric() {
        assert_eq!(SpecValue::from("0.75").as_f64(), Some(0.75));
        assert_eq!(SpecValue::from("#35").as_f64(), None);
        assert_eq!(SpecValue::from(true).as_f64(), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.75), "0.75");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
    }

    #[test]
    fn test_from_json_drops_nested_and_null() {
        let json = serde_json::json!({
            "bore_in": 0.75,
            "chain_size": "#35",
            "rpm_range": { "min": 1800, "max": 3600 },
            "weight_lbs": null,
            "sealed": true
        });
        let map = match json {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        };
        let specs = Specifications::from_json_map(map);
        assert_eq!(specs.len(), 3);
        assert_eq!(specs.number("bore_in"), Some(0.75));
        assert_eq!(specs.text("chain_size"), Some("#35"));
        assert!(!specs.contains_key("rpm_range"));
        assert!(!specs.contains_key("weight_lbs"));
        assert_eq!(specs.get("sealed"), Some(&SpecValue::Bool(true)));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = "bore_in: 0.75\nteeth: 12\nposition: axle\n";
        let specs: Specifications = serde_yml::from_str(yaml).unwrap();
        assert_eq!(specs.number("teeth"), Some(12.0));
        assert_eq!(specs.text("position"), Some("axle"));
    }
}

//! Raw signals and the unified user context built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One raw measurement supplied by a connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SignalValue {
    /// Numeric view of the value.
    ///
    /// Booleans map to 1/0 and numeric strings are parsed. Returns `None`
    /// for non-numeric text and non-finite numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SignalValue::Number(n) if n.is_finite() => Some(*n),
            SignalValue::Number(_) => None,
            SignalValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            SignalValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Convert a JSON value from connector output.
    ///
    /// `null`, arrays and objects carry no scalar signal and are dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(SignalValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(SignalValue::Number),
            serde_json::Value::String(s) => Some(SignalValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            SignalValue::Number(n) => write!(f, "{}", n),
            SignalValue::Bool(b) => write!(f, "{}", b),
            SignalValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for SignalValue {
    fn from(n: f64) -> Self {
        SignalValue::Number(n)
    }
}

impl From<i64> for SignalValue {
    fn from(n: i64) -> Self {
        SignalValue::Number(n as f64)
    }
}

impl From<i32> for SignalValue {
    fn from(n: i32) -> Self {
        SignalValue::Number(n as f64)
    }
}

impl From<bool> for SignalValue {
    fn from(b: bool) -> Self {
        SignalValue::Bool(b)
    }
}

impl From<&str> for SignalValue {
    fn from(s: &str) -> Self {
        SignalValue::Text(s.to_string())
    }
}

impl From<String> for SignalValue {
    fn from(s: String) -> Self {
        SignalValue::Text(s)
    }
}

/// Signals keyed by name. Ordered so renderings are stable.
pub type SignalMap = BTreeMap<String, SignalValue>;

/// Build a signal map from a JSON object, dropping non-scalar entries.
pub fn signal_map_from_json(object: &serde_json::Map<String, serde_json::Value>) -> SignalMap {
    object
        .iter()
        .filter_map(|(k, v)| SignalValue::from_json(v).map(|sv| (k.clone(), sv)))
        .collect()
}

/// Unified view of everything known about one user for one evaluation.
///
/// Immutable once built; the aggregator is the usual constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    user_id: String,
    signals: SignalMap,
}

impl UserContext {
    /// Create a context from already-merged signals.
    pub fn new(user_id: impl Into<String>, signals: SignalMap) -> Self {
        Self {
            user_id: user_id.into(),
            signals,
        }
    }

    /// The user this context describes.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// All merged signals.
    pub fn signals(&self) -> &SignalMap {
        &self.signals
    }

    /// Look up one signal.
    pub fn get(&self, key: &str) -> Option<&SignalValue> {
        self.signals.get(key)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_f64_conversions() {
        assert_eq!(SignalValue::from(80).as_f64(), Some(80.0));
        assert_eq!(SignalValue::from(true).as_f64(), Some(1.0));
        assert_eq!(SignalValue::from(" 2.5 ").as_f64(), Some(2.5));
        assert_eq!(SignalValue::from("enterprise").as_f64(), None);
        assert_eq!(SignalValue::Number(f64::NAN).as_f64(), None);
    }

    #[test]
    fn test_signal_map_from_json_drops_non_scalars() {
        let value = json!({
            "lead_score": 80,
            "plan": "pro",
            "verified": false,
            "tags": ["a", "b"],
            "owner": null,
            "nested": {"x": 1}
        });
        let map = signal_map_from_json(value.as_object().unwrap());

        assert_eq!(map.len(), 3);
        assert_eq!(map["lead_score"], SignalValue::Number(80.0));
        assert_eq!(map["plan"], SignalValue::Text("pro".to_string()));
        assert_eq!(map["verified"], SignalValue::Bool(false));
    }

    #[test]
    fn test_untagged_deserialize() {
        let map: SignalMap =
            serde_json::from_str(r#"{"a": 3, "b": "x", "c": true, "d": 0.25}"#).unwrap();
        assert_eq!(map["a"], SignalValue::Number(3.0));
        assert_eq!(map["b"], SignalValue::Text("x".into()));
        assert_eq!(map["c"], SignalValue::Bool(true));
        assert_eq!(map["d"], SignalValue::Number(0.25));
    }

    #[test]
    fn test_display_integers_without_fraction() {
        assert_eq!(SignalValue::from(20).to_string(), "20");
        assert_eq!(SignalValue::from(0.4).to_string(), "0.4");
    }
}

//! Connector trait and the in-memory connector.

use async_trait::async_trait;

use crate::error::{ValtheraError, ValtheraResult};
use crate::types::{signal_map_from_json, SignalMap};

/// A source of raw signals about a user (CRM, analytics, warehouse).
///
/// Implementations live outside the core. A failing fetch never aborts
/// aggregation; the aggregator substitutes an empty map.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Fetch all known signals for one user.
    async fn fetch(&self, user_id: &str) -> ValtheraResult<SignalMap>;
}

/// Connector over already-resolved data. Returns the same map for every user.
#[derive(Debug, Clone)]
pub struct StaticConnector {
    name: String,
    signals: SignalMap,
}

impl StaticConnector {
    pub fn new(name: impl Into<String>, signals: SignalMap) -> Self {
        Self {
            name: name.into(),
            signals,
        }
    }

    /// Build from a JSON object such as inline tool input.
    pub fn from_json(name: impl Into<String>, value: &serde_json::Value) -> ValtheraResult<Self> {
        let name = name.into();
        let object = value.as_object().ok_or_else(|| {
            ValtheraError::connector(name.clone(), "connector data must be a JSON object")
        })?;
        Ok(Self::new(name, signal_map_from_json(object)))
    }
}

#[async_trait]
impl Connector for StaticConnector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _user_id: &str) -> ValtheraResult<SignalMap> {
        Ok(self.signals.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalValue;
    use serde_json::json;

    #[test]
    fn test_static_connector_from_json() {
        let connector =
            StaticConnector::from_json("inline", &json!({"lead_score": 80, "plan": "pro"})).unwrap();
        let signals = tokio_test::block_on(connector.fetch("user_1")).unwrap();

        assert_eq!(connector.name(), "inline");
        assert_eq!(signals["lead_score"], SignalValue::Number(80.0));
    }

    #[test]
    fn test_static_connector_rejects_non_object() {
        let err = StaticConnector::from_json("inline", &json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("inline"));
    }
}

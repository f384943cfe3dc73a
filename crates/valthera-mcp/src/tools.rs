//! MCP tool input/output type definitions.
//!
//! These types are used with `schemars::JsonSchema` to generate the JSON Schema
//! that MCP clients use to understand tool parameters.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Input for the valthera_evaluate and valthera_explain tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EvaluateInput {
    /// Unique identifier for the user.
    pub user_id: String,

    /// User's email address. Added to the signals as `email` unless the
    /// connector data already has one.
    #[serde(default)]
    pub email: Option<String>,

    /// ID of the behavior being evaluated.
    pub behavior_id: String,

    /// Name of the behavior.
    pub behavior_name: String,

    /// Description of the behavior.
    #[serde(default)]
    pub behavior_description: String,

    /// Raw signals for the user as a flat JSON object, e.g.
    /// `{"lead_score": 80, "session_count": 3}`.
    /// Merged after any server-side connectors, so these values win.
    #[serde(default)]
    pub connector_data: Option<serde_json::Value>,
}

/// Compact result of the valthera_explain tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExplainResult {
    /// Recommended action (trigger, improve_motivation, improve_ability, wait).
    pub action: String,

    /// How the decision was reached (deterministic, oracle, oracle_override, fallback).
    pub source: String,

    /// Motivation score.
    pub motivation: f64,

    /// Ability score.
    pub ability: f64,

    /// Keys configured but absent from the user's signals.
    pub missing_signals: Vec<String>,

    /// The one-line summary, identical to valthera_evaluate output.
    pub summary: String,

    /// Full evaluation trace with per-signal breakdowns.
    pub evaluation: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_input_schema() {
        let schema = rmcp::schemars::schema_for!(EvaluateInput);
        let json = serde_json::to_string_pretty(&schema).unwrap();
        assert!(json.contains("user_id"));
        assert!(json.contains("behavior_name"));
        assert!(json.contains("connector_data"));
    }

    #[test]
    fn test_evaluate_input_optional_fields() {
        let input: EvaluateInput = serde_json::from_str(
            r#"{"user_id": "user_12345", "behavior_id": "upgrade_plan", "behavior_name": "Upgrade plan"}"#,
        )
        .unwrap();
        assert!(input.email.is_none());
        assert!(input.connector_data.is_none());
        assert_eq!(input.behavior_description, "");
    }
}

//! MCP server implementation for the valthera readiness pipeline.
//!
//! Uses the rmcp SDK's macro-based approach for defining tools.

use std::sync::Arc;
use std::time::Duration;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};

use valthera_core::{
    BehaviorSpec, Connector, DataAggregator, Evaluation, SignalMap, SignalValue, StaticConnector,
    ValtheraAgent, ValtheraError,
};

use crate::tools::*;

const INLINE_CONNECTOR: &str = "connector_data";
const EMAIL_CONNECTOR: &str = "email";

/// MCP server for behavior-readiness evaluations.
///
/// Wraps a shared [`ValtheraAgent`] plus any server-side connectors. Inline
/// `connector_data` from a tool call is merged after those, so it wins.
#[derive(Clone)]
pub struct ValtheraServer {
    agent: Arc<ValtheraAgent>,
    connectors: Vec<Arc<dyn Connector>>,
    connector_timeout: Duration,
    tool_router: ToolRouter<ValtheraServer>,
}

#[tool_router]
impl ValtheraServer {
    /// Create a server with no server-side connectors.
    pub fn new(agent: Arc<ValtheraAgent>, connector_timeout: Duration) -> Self {
        Self {
            agent,
            connectors: Vec::new(),
            connector_timeout,
            tool_router: Self::tool_router(),
        }
    }

    /// Add a connector consulted on every call, before inline data.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connectors.push(connector);
        self
    }

    /// Evaluate a user and return the one-line recommendation summary.
    #[tool(
        name = "valthera_evaluate",
        description = "Evaluate whether a user is ready for a behavior (motivation and ability against thresholds) and return a trigger recommendation, or 'No trigger recommendation.' when the user should not be prompted yet."
    )]
    async fn valthera_evaluate(
        &self,
        Parameters(input): Parameters<EvaluateInput>,
    ) -> Result<CallToolResult, McpError> {
        let evaluation = self.run_evaluation(input).await?;
        Ok(CallToolResult::success(vec![Content::text(
            evaluation.summary(),
        )]))
    }

    /// Evaluate a user and return the full scoring and decision trace.
    #[tool(
        name = "valthera_explain",
        description = "Same input as valthera_evaluate, but returns the full evaluation as JSON: per-signal score breakdowns, missing signals, the decision with its source and rationale, and the outcome."
    )]
    async fn valthera_explain(
        &self,
        Parameters(input): Parameters<EvaluateInput>,
    ) -> Result<CallToolResult, McpError> {
        let evaluation = self.run_evaluation(input).await?;

        let evaluation_json = serde_json::to_value(&evaluation)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let output = ExplainResult {
            action: evaluation.decision.action.to_string(),
            source: evaluation.decision.source.to_string(),
            motivation: evaluation.motivation.value,
            ability: evaluation.ability.value,
            missing_signals: missing_signals(&evaluation),
            summary: evaluation.summary(),
            evaluation: evaluation_json,
        };

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&output).unwrap_or_default(),
        )]))
    }

    async fn run_evaluation(&self, input: EvaluateInput) -> Result<Evaluation, McpError> {
        let behavior = BehaviorSpec::new(
            input.behavior_id,
            input.behavior_name,
            input.behavior_description,
        );

        let mut connectors = self.connectors.clone();
        if let Some(email) = input.email.filter(|e| !e.trim().is_empty()) {
            let mut signals = SignalMap::new();
            signals.insert("email".to_string(), SignalValue::Text(email));
            connectors.push(Arc::new(StaticConnector::new(EMAIL_CONNECTOR, signals)));
        }
        if let Some(data) = input.connector_data.as_ref() {
            let inline = StaticConnector::from_json(INLINE_CONNECTOR, data)
                .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
            connectors.push(Arc::new(inline));
        }

        let aggregator = DataAggregator::new(connectors).with_timeout(self.connector_timeout);
        self.agent
            .evaluate_user(&input.user_id, &behavior, &aggregator)
            .await
            .map_err(to_mcp_error)
    }
}

fn missing_signals(evaluation: &Evaluation) -> Vec<String> {
    let mut keys: Vec<String> = evaluation
        .motivation
        .missing_keys()
        .into_iter()
        .chain(evaluation.ability.missing_keys())
        .map(str::to_string)
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

fn to_mcp_error(err: ValtheraError) -> McpError {
    match err {
        ValtheraError::UnknownBehavior { .. } | ValtheraError::MissingSignal { .. } => {
            McpError::invalid_params(err.to_string(), None)
        }
        other => McpError::internal_error(other.to_string(), None),
    }
}

#[tool_handler]
impl ServerHandler for ValtheraServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Valthera decides whether and how to prompt a user toward a behavior. \
                 Use valthera_evaluate with the user's signals in connector_data to get a trigger recommendation. \
                 Use valthera_explain to see how the scores and decision were reached."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use valthera_core::{
        Decision, GenerationOracle, MissingSignalPolicy, TriggerDraft, UserContext,
        ValtheraResult,
    };

    /// Always drafts the same message.
    struct CannedGeneration;

    #[async_trait]
    impl GenerationOracle for CannedGeneration {
        async fn generate(
            &self,
            _context: &UserContext,
            _behavior: &BehaviorSpec,
            _decision: &Decision,
        ) -> ValtheraResult<TriggerDraft> {
            Ok(TriggerDraft {
                trigger_message: "Unlock Pro reports today".to_string(),
                channel: "email".to_string(),
                confidence: json!(0.9),
                rationale: "engaged".to_string(),
            })
        }
    }

    fn server(policy: MissingSignalPolicy) -> ValtheraServer {
        let agent = ValtheraAgent::builder()
            .missing_signal_policy(policy)
            .generation_oracle(Arc::new(CannedGeneration))
            .build()
            .unwrap();
        ValtheraServer::new(Arc::new(agent), Duration::from_secs(1))
    }

    fn input(connector_data: serde_json::Value) -> EvaluateInput {
        EvaluateInput {
            user_id: "user_12345".to_string(),
            email: Some("user@example.com".to_string()),
            behavior_id: "upgrade_plan".to_string(),
            behavior_name: "Upgrade plan".to_string(),
            behavior_description: "Move to a paid plan".to_string(),
            connector_data: Some(connector_data),
        }
    }

    fn text(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).unwrap();
        value["content"][0]["text"].as_str().unwrap().to_string()
    }

    fn ready_user() -> serde_json::Value {
        json!({
            "lead_score": 100,
            "events_count_past_30days": 50,
            "marketing_emails_opened": 10,
            "session_count": 5,
            "onboarding_steps_completed": 5,
            "behavior_complexity": 1
        })
    }

    #[tokio::test]
    async fn test_evaluate_returns_trigger_summary() {
        let result = server(MissingSignalPolicy::default())
            .valthera_evaluate(Parameters(input(ready_user())))
            .await
            .unwrap();

        let summary = text(&result);
        assert!(summary.contains("Unlock Pro reports today"));
        assert!(summary.contains("email"));
    }

    #[tokio::test]
    async fn test_evaluate_without_signals_has_no_recommendation() {
        let result = server(MissingSignalPolicy::default())
            .valthera_evaluate(Parameters(input(json!({}))))
            .await
            .unwrap();

        assert_eq!(text(&result), valthera_core::NO_RECOMMENDATION);
    }

    #[tokio::test]
    async fn test_explain_lists_missing_signals() {
        let result = server(MissingSignalPolicy::default())
            .valthera_explain(Parameters(input(json!({"lead_score": 80}))))
            .await
            .unwrap();

        let output: serde_json::Value = serde_json::from_str(&text(&result)).unwrap();
        let missing = output["missing_signals"].as_array().unwrap();
        assert!(missing.contains(&json!("session_count")));
        assert!(!missing.contains(&json!("lead_score")));
        assert_eq!(output["evaluation"]["user_id"], "user_12345");
    }

    #[tokio::test]
    async fn test_empty_behavior_name_is_invalid_params() {
        let mut bad = input(ready_user());
        bad.behavior_name = String::new();

        let err = server(MissingSignalPolicy::default())
            .valthera_evaluate(Parameters(bad))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_non_object_connector_data_is_invalid_params() {
        let err = server(MissingSignalPolicy::default())
            .valthera_evaluate(Parameters(input(json!([1, 2, 3]))))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_strict_policy_missing_signal_is_invalid_params() {
        let err = server(MissingSignalPolicy::Error)
            .valthera_evaluate(Parameters(input(json!({"lead_score": 80}))))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_inline_data_overrides_server_connector() {
        let mut base = SignalMap::new();
        base.insert("lead_score".to_string(), SignalValue::Number(0.0));
        let server = server(MissingSignalPolicy::default())
            .with_connector(Arc::new(StaticConnector::new("crm", base)));

        let result = server
            .valthera_explain(Parameters(input(json!({"lead_score": 100}))))
            .await
            .unwrap();
        let output: serde_json::Value = serde_json::from_str(&text(&result)).unwrap();
        let lead = output["evaluation"]["motivation"]["breakdown"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["key"] == "lead_score")
            .unwrap()
            .clone();
        assert_eq!(lead["raw"], json!(100.0));
    }

    #[test]
    fn test_server_info_enables_tools() {
        let info = server(MissingSignalPolicy::default()).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("valthera_evaluate"));
    }
}

//! Trigger content generation for `Trigger` decisions.

use std::sync::Arc;

use crate::config::OraclePolicy;
use crate::error::{ErrorCode, ValtheraError, ValtheraResult};
use crate::retry::call_with_policy;
use crate::traits::{GenerationOracle, TriggerDraft};
use crate::types::{Action, BehaviorSpec, Decision, Recommendation, UserContext};

/// Turns a `Trigger` decision into a validated [`Recommendation`].
#[derive(Clone)]
pub struct TriggerGenerator {
    oracle: Arc<dyn GenerationOracle>,
    policy: OraclePolicy,
}

impl TriggerGenerator {
    pub fn new(oracle: Arc<dyn GenerationOracle>) -> Self {
        Self {
            oracle,
            policy: OraclePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: OraclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Generate trigger content.
    ///
    /// Returns `Generation` when the decision is not `Trigger`, or when the
    /// oracle still fails after its retry.
    pub async fn generate(
        &self,
        context: &UserContext,
        behavior: &BehaviorSpec,
        decision: &Decision,
    ) -> ValtheraResult<Recommendation> {
        if decision.action != Action::Trigger {
            return Err(ValtheraError::generation(format!(
                "no trigger content for action {}",
                decision.action
            )));
        }

        let oracle = &self.oracle;
        call_with_policy("generation", &self.policy, || async move {
            let draft = oracle.generate(context, behavior, decision).await?;
            validate_draft(draft, decision)
        })
        .await
        .map_err(ValtheraError::generation_from)
    }
}

/// Check a draft: the message must be non-empty and the confidence must be
/// numeric. Out-of-range confidence is clamped.
fn validate_draft(draft: TriggerDraft, decision: &Decision) -> ValtheraResult<Recommendation> {
    let trigger_message = draft.trigger_message.trim();
    if trigger_message.is_empty() {
        return Err(ValtheraError::oracle_missing_field("trigger_message"));
    }

    let confidence = parse_confidence(&draft.confidence)?.clamp(0.0, 1.0);
    let rationale = if draft.rationale.trim().is_empty() {
        decision.rationale.clone()
    } else {
        draft.rationale
    };

    Ok(Recommendation {
        trigger_message: trigger_message.to_string(),
        channel: draft.channel.trim().to_string(),
        confidence,
        rationale,
    })
}

fn parse_confidence(value: &serde_json::Value) -> ValtheraResult<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|c| c.is_finite()).ok_or_else(|| ValtheraError::OracleParse {
        message: format!("confidence {} is not a number", value),
        code: ErrorCode::OrcInvalidValue,
    })
}

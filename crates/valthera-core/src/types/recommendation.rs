//! Recommendations and the tagged outcome of an evaluation.

use serde::{Deserialize, Serialize};

use crate::types::Action;

/// Summary line when no trigger is recommended.
pub const NO_RECOMMENDATION: &str = "No trigger recommendation.";

/// Generated trigger content. Only exists for a `Trigger` decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub trigger_message: String,
    /// Delivery channel; may be empty when the oracle gave none.
    pub channel: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub rationale: String,
}

impl Recommendation {
    /// Render the one-line form agent frameworks expect.
    ///
    /// Channel and rationale segments are omitted when empty. Confidence
    /// always keeps a decimal point (`1.0`, not `1`).
    pub fn summary(&self) -> String {
        let mut result = format!("Trigger: {}", self.trigger_message);
        result.push_str(&format!(", Confidence: {:?}", self.confidence));
        if !self.channel.is_empty() {
            result.push_str(&format!(", Channel: {}", self.channel));
        }
        if !self.rationale.is_empty() {
            result.push_str(&format!(", Rationale: {}", self.rationale));
        }
        result
    }
}

/// Final result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Recommended { recommendation: Recommendation },
    NoRecommendation { action: Action, rationale: String },
}

impl EvaluationOutcome {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            EvaluationOutcome::Recommended { recommendation } => Some(recommendation),
            EvaluationOutcome::NoRecommendation { .. } => None,
        }
    }

    pub fn into_recommendation(self) -> Option<Recommendation> {
        match self {
            EvaluationOutcome::Recommended { recommendation } => Some(recommendation),
            EvaluationOutcome::NoRecommendation { .. } => None,
        }
    }

    /// Textual summary for tool adapters.
    pub fn summary(&self) -> String {
        render_summary(self.recommendation())
    }
}

/// Render an optional recommendation as the tool summary line.
pub fn render_summary(recommendation: Option<&Recommendation>) -> String {
    match recommendation {
        Some(r) => r.summary(),
        None => NO_RECOMMENDATION.to_string(),
    }
}

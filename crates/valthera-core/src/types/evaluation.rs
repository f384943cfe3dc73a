//! Full trace of one (user, behavior) evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{CompositeScore, Decision, EvaluationOutcome, Recommendation};

/// Pipeline position. Evaluations only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Start,
    Aggregated,
    Scored,
    Decided,
    Generated,
    Skipped,
    Done,
}

/// Everything one evaluation produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub user_id: String,
    pub behavior_id: String,
    pub motivation: CompositeScore,
    pub ability: CompositeScore,
    pub decision: Decision,
    /// Last branch taken before `Done`: `Generated` or `Skipped`.
    pub terminal_stage: Stage,
    pub outcome: EvaluationOutcome,
}

impl Evaluation {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.outcome.recommendation()
    }

    pub fn into_recommendation(self) -> Option<Recommendation> {
        self.outcome.into_recommendation()
    }

    /// Tool summary line.
    pub fn summary(&self) -> String {
        self.outcome.summary()
    }
}

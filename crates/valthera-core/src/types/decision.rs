//! Decision policy types.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ValtheraError, ValtheraResult};

/// What the pipeline recommends doing about a behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    /// Both factors clear their thresholds; send a trigger.
    Trigger,
    /// Motivation is the limiting factor.
    ImproveMotivation,
    /// Ability is the limiting factor.
    ImproveAbility,
    /// Not ready, no single factor to work on.
    Wait,
}

impl Action {
    /// Parse from string with flexible matching.
    ///
    /// Accepts any case and `_`, `-`, or space separators. Unknown strings
    /// yield `None`.
    pub fn from_str_flexible(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        match normalized.as_str() {
            "trigger" => Some(Action::Trigger),
            "improvemotivation" => Some(Action::ImproveMotivation),
            "improveability" => Some(Action::ImproveAbility),
            "wait" => Some(Action::Wait),
            _ => None,
        }
    }
}

/// Per-factor readiness thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub motivation: f64,
    pub ability: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            motivation: 0.5,
            ability: 0.5,
        }
    }
}

impl Thresholds {
    pub fn new(motivation: f64, ability: f64) -> ValtheraResult<Self> {
        let thresholds = Self { motivation, ability };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> ValtheraResult<()> {
        for (name, value) in [("motivation", self.motivation), ("ability", self.ability)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValtheraError::invalid_config(
                    ErrorCode::CfgInvalidThreshold,
                    format!("{} threshold {} is outside [0, 1]", name, value),
                ));
            }
        }
        Ok(())
    }
}

/// Composite values handed to the decision policy and the reasoning oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadinessScores {
    pub motivation: f64,
    pub ability: f64,
    pub thresholds: Thresholds,
}

/// How a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DecisionSource {
    /// No oracle configured.
    Deterministic,
    /// Oracle supplied the rationale; thresholds chose the action.
    Oracle,
    /// Oracle supplied the rationale and replaced the action.
    OracleOverride,
    /// Oracle failed; thresholds chose the action and the rationale is
    /// the score summary.
    Fallback,
}

/// The single decision produced per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub rationale: String,
    pub source: DecisionSource,
}

impl Decision {
    /// Score summary used whenever no oracle rationale is available.
    pub fn summary_rationale(motivation: f64, ability: f64, action: Action) -> String {
        format!(
            "motivation={:.2}, ability={:.2}, action={}",
            motivation, ability, action
        )
    }
}

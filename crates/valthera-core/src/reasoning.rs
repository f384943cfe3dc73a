//! Two-tier decision policy: thresholds first, oracle advice second.

use std::sync::Arc;

use crate::config::ReasoningSettings;
use crate::error::ValtheraError;
use crate::retry::call_with_policy;
use crate::traits::ReasoningOracle;
use crate::types::{Action, BehaviorSpec, Decision, DecisionSource, ReadinessScores, Thresholds};

/// Produces the single [`Decision`] of an evaluation.
#[derive(Clone)]
pub struct ReasoningEngine {
    thresholds: Thresholds,
    oracle: Option<Arc<dyn ReasoningOracle>>,
    settings: ReasoningSettings,
}

impl ReasoningEngine {
    /// Engine with thresholds only.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            oracle: None,
            settings: ReasoningSettings::default(),
        }
    }

    /// Attach an advisory oracle.
    pub fn with_oracle(mut self, oracle: Arc<dyn ReasoningOracle>, settings: ReasoningSettings) -> Self {
        self.oracle = Some(oracle);
        self.settings = settings;
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Threshold policy. Pure and total.
    ///
    /// When both factors fall short with equal scores, motivation is the
    /// limiting factor.
    pub fn decide_deterministic(scores: &ReadinessScores) -> Action {
        let (m, a) = (scores.motivation, scores.ability);
        let t = scores.thresholds;

        if m >= t.motivation && a >= t.ability {
            Action::Trigger
        } else if m < t.motivation && m <= a {
            Action::ImproveMotivation
        } else if a < t.ability && a < m {
            Action::ImproveAbility
        } else {
            Action::Wait
        }
    }

    /// Decide for the given composite values.
    ///
    /// Never fails. Oracle timeouts and malformed answers fall back to the
    /// threshold action with a score summary as rationale.
    pub async fn decide(&self, motivation: f64, ability: f64, behavior: &BehaviorSpec) -> Decision {
        let scores = ReadinessScores {
            motivation,
            ability,
            thresholds: self.thresholds,
        };
        let action = Self::decide_deterministic(&scores);

        let Some(oracle) = &self.oracle else {
            return Decision {
                action,
                rationale: Decision::summary_rationale(motivation, ability, action),
                source: DecisionSource::Deterministic,
            };
        };

        let result = call_with_policy("reasoning", &self.settings.policy, || async move {
            let verdict = oracle.evaluate(&scores, behavior).await?;
            if verdict.rationale.trim().is_empty() {
                return Err(ValtheraError::oracle_missing_field("rationale"));
            }
            Ok(verdict)
        })
        .await;

        match result {
            Ok(verdict) => {
                let suggested = verdict.action.as_deref().and_then(|raw| {
                    let parsed = Action::from_str_flexible(raw);
                    if parsed.is_none() {
                        tracing::debug!(action = raw, "Ignoring unknown oracle action");
                    }
                    parsed
                });

                match suggested {
                    Some(oracle_action) if self.settings.allow_override && oracle_action != action => {
                        tracing::debug!(
                            threshold_action = %action,
                            oracle_action = %oracle_action,
                            "Oracle overrode threshold action"
                        );
                        Decision {
                            action: oracle_action,
                            rationale: verdict.rationale,
                            source: DecisionSource::OracleOverride,
                        }
                    }
                    _ => Decision {
                        action,
                        rationale: verdict.rationale,
                        source: DecisionSource::Oracle,
                    },
                }
            }
            Err(e) => {
                tracing::warn!(
                    behavior_id = %behavior.behavior_id,
                    "Reasoning oracle failed, using threshold decision: {}",
                    e
                );
                Decision {
                    action,
                    rationale: Decision::summary_rationale(motivation, ability, action),
                    source: DecisionSource::Fallback,
                }
            }
        }
    }
}

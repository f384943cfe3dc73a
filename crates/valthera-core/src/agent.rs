//! Agent orchestrating one (user, behavior) evaluation end to end.
//!
//! Stages run strictly in order:
//! `Start -> Aggregated -> Scored -> Decided -> {Generated | Skipped} -> Done`.
//! The agent holds only immutable configuration and shared oracle handles,
//! so one instance serves concurrent evaluations.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::aggregator::DataAggregator;
use crate::config::{OraclePolicy, ValtheraConfig};
use crate::error::{ValtheraError, ValtheraResult};
use crate::reasoning::ReasoningEngine;
use crate::scorer::Scorer;
use crate::traits::{GenerationOracle, ReasoningOracle};
use crate::trigger::TriggerGenerator;
use crate::types::{
    Action, BehaviorSpec, Evaluation, EvaluationOutcome, MissingSignalPolicy, Recommendation,
    ScoreConfig, SignalMap, Stage, Thresholds, UserContext,
};

/// Behavior-readiness agent.
#[derive(Clone)]
pub struct ValtheraAgent {
    motivation: ScoreConfig,
    ability: ScoreConfig,
    scorer: Scorer,
    reasoning: ReasoningEngine,
    generator: TriggerGenerator,
}

impl ValtheraAgent {
    /// Build an agent from a validated configuration and explicit oracles.
    pub fn from_config(
        config: ValtheraConfig,
        generation_oracle: Arc<dyn GenerationOracle>,
        reasoning_oracle: Option<Arc<dyn ReasoningOracle>>,
    ) -> ValtheraResult<Self> {
        config.validate()?;

        let mut reasoning = ReasoningEngine::new(config.thresholds);
        if let Some(oracle) = reasoning_oracle {
            reasoning = reasoning.with_oracle(oracle, config.reasoning);
        }

        Ok(Self {
            motivation: config.motivation,
            ability: config.ability,
            scorer: Scorer::new(config.missing_signal_policy),
            reasoning,
            generator: TriggerGenerator::new(generation_oracle).with_policy(config.generation),
        })
    }

    /// Create a builder.
    pub fn builder() -> ValtheraAgentBuilder {
        ValtheraAgentBuilder::default()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.reasoning.thresholds()
    }

    /// Evaluate a pre-built context and return the full trace.
    ///
    /// Only an invalid behavior or, under the strict missing-signal policy,
    /// a missing signal is returned as an error. Oracle trouble degrades to
    /// fallback decisions or `no_recommendation`.
    pub async fn evaluate(
        &self,
        context: &UserContext,
        behavior: &BehaviorSpec,
    ) -> ValtheraResult<Evaluation> {
        behavior.validate()?;

        let evaluation_id = Uuid::new_v4();
        tracing::debug!(
            %evaluation_id,
            user_id = context.user_id(),
            behavior_id = %behavior.behavior_id,
            stage = %Stage::Aggregated,
            signals = context.len(),
            "Context ready"
        );

        let motivation = self.scorer.score(context, &self.motivation)?;
        let ability = self.scorer.score(context, &self.ability)?;
        tracing::debug!(
            %evaluation_id,
            stage = %Stage::Scored,
            motivation = motivation.value,
            ability = ability.value,
            "Scores computed"
        );

        let decision = self
            .reasoning
            .decide(motivation.value, ability.value, behavior)
            .await;
        tracing::debug!(
            %evaluation_id,
            stage = %Stage::Decided,
            action = %decision.action,
            source = %decision.source,
            "Decision made"
        );

        let (terminal_stage, outcome) = if decision.action == Action::Trigger {
            match self.generator.generate(context, behavior, &decision).await {
                Ok(recommendation) => (
                    Stage::Generated,
                    EvaluationOutcome::Recommended { recommendation },
                ),
                Err(e) => {
                    tracing::warn!(
                        %evaluation_id,
                        behavior_id = %behavior.behavior_id,
                        "Trigger generation failed, no recommendation: {}",
                        e
                    );
                    (
                        Stage::Skipped,
                        EvaluationOutcome::NoRecommendation {
                            action: decision.action,
                            rationale: format!("{}; generation failed: {}", decision.rationale, e),
                        },
                    )
                }
            }
        } else {
            (
                Stage::Skipped,
                EvaluationOutcome::NoRecommendation {
                    action: decision.action,
                    rationale: decision.rationale.clone(),
                },
            )
        };
        tracing::debug!(%evaluation_id, stage = %terminal_stage, "Branch complete");

        let evaluation = Evaluation {
            evaluation_id,
            evaluated_at: Utc::now(),
            user_id: context.user_id().to_string(),
            behavior_id: behavior.behavior_id.clone(),
            motivation,
            ability,
            decision,
            terminal_stage,
            outcome,
        };
        tracing::debug!(%evaluation_id, stage = %Stage::Done, "Evaluation finished");
        Ok(evaluation)
    }

    /// Evaluate and return only the recommendation. Every error maps to
    /// `None`.
    pub async fn run(&self, context: &UserContext, behavior: &BehaviorSpec) -> Option<Recommendation> {
        match self.evaluate(context, behavior).await {
            Ok(evaluation) => evaluation.into_recommendation(),
            Err(e) => {
                tracing::warn!(
                    user_id = context.user_id(),
                    behavior_id = %behavior.behavior_id,
                    "Evaluation failed: {}",
                    e
                );
                None
            }
        }
    }

    /// Fetch signals through `aggregator`, then evaluate.
    pub async fn evaluate_user(
        &self,
        user_id: &str,
        behavior: &BehaviorSpec,
        aggregator: &DataAggregator,
    ) -> ValtheraResult<Evaluation> {
        tracing::debug!(user_id, stage = %Stage::Start, "Collecting signals");
        let context = aggregator.collect(user_id).await;
        self.evaluate(&context, behavior).await
    }

    /// Merge already-resolved connector outputs (last wins), then evaluate.
    pub async fn evaluate_signals(
        &self,
        user_id: &str,
        sources: Vec<SignalMap>,
        behavior: &BehaviorSpec,
    ) -> ValtheraResult<Evaluation> {
        let context = DataAggregator::merge(user_id, sources);
        self.evaluate(&context, behavior).await
    }
}

/// Builder for [`ValtheraAgent`].
#[derive(Default)]
pub struct ValtheraAgentBuilder {
    config: ValtheraConfig,
    reasoning_oracle: Option<Arc<dyn ReasoningOracle>>,
    generation_oracle: Option<Arc<dyn GenerationOracle>>,
}

impl ValtheraAgentBuilder {
    /// Start from a full configuration.
    pub fn config(mut self, config: ValtheraConfig) -> Self {
        self.config = config;
        self
    }

    pub fn motivation(mut self, config: ScoreConfig) -> Self {
        self.config.motivation = config;
        self
    }

    pub fn ability(mut self, config: ScoreConfig) -> Self {
        self.config.ability = config;
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn missing_signal_policy(mut self, policy: MissingSignalPolicy) -> Self {
        self.config.missing_signal_policy = policy;
        self
    }

    /// Attach an advisory reasoning oracle.
    pub fn reasoning_oracle(mut self, oracle: Arc<dyn ReasoningOracle>) -> Self {
        self.reasoning_oracle = Some(oracle);
        self
    }

    pub fn reasoning_policy(mut self, policy: OraclePolicy) -> Self {
        self.config.reasoning.policy = policy;
        self
    }

    pub fn allow_oracle_override(mut self, allow: bool) -> Self {
        self.config.reasoning.allow_override = allow;
        self
    }

    /// Set the generation oracle. Required.
    pub fn generation_oracle(mut self, oracle: Arc<dyn GenerationOracle>) -> Self {
        self.generation_oracle = Some(oracle);
        self
    }

    pub fn generation_policy(mut self, policy: OraclePolicy) -> Self {
        self.config.generation = policy;
        self
    }

    /// Validate configuration and build the agent.
    pub fn build(self) -> ValtheraResult<ValtheraAgent> {
        let generation_oracle = self.generation_oracle.ok_or_else(|| {
            ValtheraError::Configuration("a generation oracle is required".to_string())
        })?;
        ValtheraAgent::from_config(self.config, generation_oracle, self.reasoning_oracle)
    }
}

//! valthera-core - Core library for valthera.
//!
//! This crate provides the behavior-readiness pipeline: signal aggregation,
//! weighted motivation/ability scoring, the threshold decision policy with
//! optional oracle advice, and trigger generation.
//!
//! # Example
//!
//! ```ignore
//! use valthera_core::{BehaviorSpec, DataAggregator, ValtheraAgent, ValtheraConfig};
//!
//! let agent = ValtheraAgent::builder()
//!     .config(ValtheraConfig::from_env()?)
//!     .generation_oracle(generation_oracle)
//!     .build()?;
//!
//! let behavior = BehaviorSpec::new("upgrade_plan", "Upgrade plan", "Move to the paid tier");
//! let context = DataAggregator::merge("user_12345", vec![crm_signals, analytics_signals]);
//!
//! match agent.run(&context, &behavior).await {
//!     Some(recommendation) => println!("{}", recommendation.summary()),
//!     None => println!("No trigger recommendation."),
//! }
//! ```

pub mod agent;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod json_parser;
pub mod reasoning;
mod retry;
pub mod scorer;
pub mod traits;
pub mod trigger;
pub mod types;

// Re-export commonly used types
pub use agent::{ValtheraAgent, ValtheraAgentBuilder};
pub use aggregator::DataAggregator;
pub use config::{LlmProvider, LlmProviderConfig, OraclePolicy, ReasoningSettings, ValtheraConfig};
pub use error::{ErrorCode, ValtheraError, ValtheraResult};
pub use reasoning::ReasoningEngine;
pub use scorer::Scorer;
pub use traits::{
    Connector, GenerationOptions, GenerationOracle, Llm, LlmConfig, LlmResponse, OracleVerdict,
    ReasoningOracle, ResponseFormat, StaticConnector, TriggerDraft,
};
pub use trigger::TriggerGenerator;
pub use types::{
    Action, BehaviorSpec, CompositeScore, Decision, DecisionSource, Evaluation, EvaluationOutcome,
    Message, MessageRole, MissingSignalPolicy, ReadinessScores, Recommendation, ScoreConfig,
    ScoreRule, SignalMap, SignalValue, Stage, Thresholds, Transform, UserContext,
    NO_RECOMMENDATION,
};

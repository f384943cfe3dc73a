//! Oracle contracts consumed by the reasoning and generation stages.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValtheraResult;
use crate::types::{BehaviorSpec, Decision, ReadinessScores, UserContext};

/// Advisory answer from a reasoning oracle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleVerdict {
    /// Suggested action. Ignored unless it names one of the four actions;
    /// non-string values deserialize as `None`.
    #[serde(default, deserialize_with = "string_or_none")]
    pub action: Option<String>,
    /// Qualitative explanation. Must be non-empty to be used.
    #[serde(default, alias = "analysis", deserialize_with = "null_as_empty")]
    pub rationale: String,
}

/// Unvalidated trigger content from a generation oracle.
///
/// `confidence` stays loosely typed; the trigger generator decides whether
/// it parses as a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerDraft {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub trigger_message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub channel: String,
    #[serde(default)]
    pub confidence: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rationale: String,
}

/// Oracle output is loosely typed; anything but a string means "no action".
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(str::to_string)))
}

/// Explicit `null` reads the same as a missing key.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Qualitative reasoning service consulted after the threshold policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    async fn evaluate(
        &self,
        scores: &ReadinessScores,
        behavior: &BehaviorSpec,
    ) -> ValtheraResult<OracleVerdict>;
}

/// Content service that writes the trigger message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    async fn generate(
        &self,
        context: &UserContext,
        behavior: &BehaviorSpec,
        decision: &Decision,
    ) -> ValtheraResult<TriggerDraft>;
}

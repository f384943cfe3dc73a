//! Configuration system for valthera.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ErrorCode, ValtheraError, ValtheraResult};
use crate::traits::LlmConfig;
use crate::types::{MissingSignalPolicy, ScoreConfig, Thresholds};

/// Oracles get at most one retry.
pub const MAX_ORACLE_RETRIES: u32 = 1;

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Anthropic,
}

impl FromStr for LlmProvider {
    type Err = ValtheraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" => Ok(LlmProvider::Anthropic),
            other => Err(ValtheraError::UnsupportedProvider {
                provider: other.to_string(),
            }),
        }
    }
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            config: LlmConfig {
                model: "gpt-4o".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Timeout and retry budget for one oracle call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OraclePolicy {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retries after the first attempt. Values above 1 are clamped.
    pub max_retries: u32,
    /// Pause before the retry in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for OraclePolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 1,
            retry_delay_ms: 200,
        }
    }
}

impl OraclePolicy {
    /// Policy with the given timeout and default retry budget.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
            ..Default::default()
        }
    }

    /// Builder: set the retry count (clamped to one).
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builder: set the retry delay.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Effective retry count.
    pub fn effective_retries(&self) -> usize {
        self.max_retries.min(MAX_ORACLE_RETRIES) as usize
    }

    pub fn validate(&self, name: &str) -> ValtheraResult<()> {
        if self.timeout_ms == 0 {
            return Err(ValtheraError::invalid_config_with_suggestion(
                ErrorCode::CfgInvalidPolicy,
                format!("{} oracle timeout_ms must be positive", name),
                "Oracle calls must be bounded; set timeout_ms to a positive value",
            ));
        }
        Ok(())
    }
}

/// Reasoning oracle settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningSettings {
    #[serde(flatten)]
    pub policy: OraclePolicy,
    /// Let a valid oracle action replace the threshold decision.
    pub allow_override: bool,
}

/// Main valthera configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValtheraConfig {
    /// Rules for the motivation score.
    pub motivation: ScoreConfig,
    /// Rules for the ability score.
    pub ability: ScoreConfig,
    /// Decision thresholds.
    pub thresholds: Thresholds,
    /// Behavior when a configured signal is absent.
    pub missing_signal_policy: MissingSignalPolicy,
    /// Reasoning oracle call policy.
    pub reasoning: ReasoningSettings,
    /// Generation oracle call policy.
    pub generation: OraclePolicy,
    /// Per-connector fetch timeout in milliseconds.
    pub connector_timeout_ms: u64,
    /// LLM used by the live oracles.
    pub llm: LlmProviderConfig,
}

impl Default for ValtheraConfig {
    fn default() -> Self {
        Self {
            motivation: ScoreConfig::default_motivation(),
            ability: ScoreConfig::default_ability(),
            thresholds: Thresholds::default(),
            missing_signal_policy: MissingSignalPolicy::default(),
            reasoning: ReasoningSettings::default(),
            generation: OraclePolicy::default(),
            connector_timeout_ms: 5_000,
            llm: LlmProviderConfig::default(),
        }
    }
}

impl ValtheraConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ValtheraResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ValtheraError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ValtheraError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| ValtheraError::Configuration(e.to_string()))?,
            _ => {
                return Err(ValtheraError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> ValtheraResult<Self> {
        let mut config = Self::default();

        if let Ok(provider) = std::env::var("VALTHERA_LLM_PROVIDER") {
            config.llm.provider = provider.parse()?;
        }
        if let Ok(model) = std::env::var("VALTHERA_LLM_MODEL") {
            config.llm.config.model = model;
        }
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if config.llm.provider == LlmProvider::OpenAI {
                config.llm.config.api_key = Some(api_key);
            }
        }
        if let Some(t) = env_parse::<f64>("VALTHERA_MOTIVATION_THRESHOLD")? {
            config.thresholds.motivation = t;
        }
        if let Some(t) = env_parse::<f64>("VALTHERA_ABILITY_THRESHOLD")? {
            config.thresholds.ability = t;
        }
        if let Some(ms) = env_parse::<u64>("VALTHERA_ORACLE_TIMEOUT_MS")? {
            config.reasoning.policy.timeout_ms = ms;
            config.generation.timeout_ms = ms;
        }
        if let Some(allow) = env_parse::<bool>("VALTHERA_ALLOW_ORACLE_OVERRIDE")? {
            config.reasoning.allow_override = allow;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints. Score configs validate themselves.
    pub fn validate(&self) -> ValtheraResult<()> {
        self.thresholds.validate()?;
        self.reasoning.policy.validate("reasoning")?;
        self.generation.validate("generation")?;
        if self.connector_timeout_ms == 0 {
            return Err(ValtheraError::invalid_config(
                ErrorCode::CfgInvalidPolicy,
                "connector_timeout_ms must be positive",
            ));
        }
        Ok(())
    }

    pub fn connector_timeout(&self) -> Duration {
        Duration::from_millis(self.connector_timeout_ms)
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> ValtheraConfigBuilder {
        ValtheraConfigBuilder::default()
    }
}

fn env_parse<T: FromStr>(name: &str) -> ValtheraResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ValtheraError::Configuration(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

/// Builder for ValtheraConfig.
#[derive(Default)]
pub struct ValtheraConfigBuilder {
    config: ValtheraConfig,
}

impl ValtheraConfigBuilder {
    /// Set motivation rules.
    pub fn motivation(mut self, config: ScoreConfig) -> Self {
        self.config.motivation = config;
        self
    }

    /// Set ability rules.
    pub fn ability(mut self, config: ScoreConfig) -> Self {
        self.config.ability = config;
        self
    }

    /// Set decision thresholds.
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Set the missing-signal policy.
    pub fn missing_signal_policy(mut self, policy: MissingSignalPolicy) -> Self {
        self.config.missing_signal_policy = policy;
        self
    }

    /// Set the reasoning oracle call policy.
    pub fn reasoning_policy(mut self, policy: OraclePolicy) -> Self {
        self.config.reasoning.policy = policy;
        self
    }

    /// Allow the reasoning oracle to replace the threshold action.
    pub fn allow_oracle_override(mut self, allow: bool) -> Self {
        self.config.reasoning.allow_override = allow;
        self
    }

    /// Set the generation oracle call policy.
    pub fn generation_policy(mut self, policy: OraclePolicy) -> Self {
        self.config.generation = policy;
        self
    }

    /// Set the connector fetch timeout.
    pub fn connector_timeout(mut self, timeout: Duration) -> Self {
        self.config.connector_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> ValtheraResult<ValtheraConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

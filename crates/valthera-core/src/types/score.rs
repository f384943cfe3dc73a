//! Declarative scoring rules and the composite scores they produce.
//!
//! A [`ScoreConfig`] is an ordered list of [`ScoreRule`]s. Each rule names a
//! signal key, a weight in (0, 1], and a [`Transform`] mapping the raw value
//! onto [0, 1]. Built-in transforms are plain data so configs round-trip
//! through TOML/JSON/YAML; arbitrary functions plug in through
//! [`SignalTransform`] via [`Transform::Custom`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorCode, ValtheraError, ValtheraResult};
use crate::types::SignalValue;

/// Injected pure function mapping a raw signal onto [0, 1].
///
/// Returning `None` marks the input as unusable (non-numeric); the scorer
/// then records a zero contribution.
pub trait SignalTransform: Send + Sync {
    fn apply(&self, value: &SignalValue) -> Option<f64>;
}

impl<F> SignalTransform for F
where
    F: Fn(&SignalValue) -> Option<f64> + Send + Sync,
{
    fn apply(&self, value: &SignalValue) -> Option<f64> {
        self(value)
    }
}

/// A named [`SignalTransform`] carried inside a rule.
#[derive(Clone)]
pub struct CustomTransform {
    name: String,
    func: Arc<dyn SignalTransform>,
}

impl CustomTransform {
    pub fn new(name: impl Into<String>, func: impl SignalTransform + 'static) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// How a raw signal value becomes a [0, 1] contribution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Use the numeric value as-is.
    #[default]
    Identity,
    /// `min(x, cap) / cap`.
    Capped { cap: f64 },
    /// `1 - min(x, cap) / cap`; high raw values mean low readiness.
    InverseCapped { cap: f64 },
    /// Linear rescale of `[min, max]` onto `[0, 1]`.
    Range { min: f64, max: f64 },
    /// 1 when `x >= min`, else 0.
    Threshold { min: f64 },
    /// Lookup table for string signals.
    Categorical {
        values: BTreeMap<String, f64>,
        #[serde(default)]
        default: f64,
    },
    /// Caller-supplied function. Not serializable.
    #[serde(skip)]
    Custom(CustomTransform),
}

impl Transform {
    /// Wrap a closure as a custom transform.
    pub fn custom(
        name: impl Into<String>,
        func: impl Fn(&SignalValue) -> Option<f64> + Send + Sync + 'static,
    ) -> Self {
        Transform::Custom(CustomTransform::new(name, func))
    }

    /// Apply the transform. The result is not clamped here.
    pub fn apply(&self, value: &SignalValue) -> Option<f64> {
        match self {
            Transform::Identity => value.as_f64(),
            Transform::Capped { cap } => value.as_f64().map(|x| x.min(*cap) / cap),
            Transform::InverseCapped { cap } => value.as_f64().map(|x| 1.0 - x.min(*cap) / cap),
            Transform::Range { min, max } => value.as_f64().map(|x| (x - min) / (max - min)),
            Transform::Threshold { min } => {
                value.as_f64().map(|x| if x >= *min { 1.0 } else { 0.0 })
            }
            Transform::Categorical { values, default } => {
                Some(values.get(&value.to_string()).copied().unwrap_or(*default))
            }
            Transform::Custom(custom) => custom.func.apply(value),
        }
    }

    fn validate(&self, key: &str) -> ValtheraResult<()> {
        let invalid = |msg: String| {
            Err(ValtheraError::invalid_config(
                ErrorCode::CfgInvalidTransform,
                format!("rule '{}': {}", key, msg),
            ))
        };

        match self {
            Transform::Capped { cap } | Transform::InverseCapped { cap } => {
                if !(cap.is_finite() && *cap > 0.0) {
                    return invalid(format!("cap must be a positive number, got {}", cap));
                }
            }
            Transform::Range { min, max } => {
                if !(min.is_finite() && max.is_finite() && max > min) {
                    return invalid(format!("range requires min < max, got [{}, {}]", min, max));
                }
            }
            Transform::Threshold { min } => {
                if !min.is_finite() {
                    return invalid("threshold min must be finite".to_string());
                }
            }
            Transform::Categorical { values, default } => {
                if !default.is_finite() || values.values().any(|v| !v.is_finite()) {
                    return invalid("categorical values must be finite".to_string());
                }
            }
            Transform::Identity | Transform::Custom(_) => {}
        }
        Ok(())
    }
}

/// One weighted scoring rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRule {
    /// Signal key to look up in the user context.
    pub key: String,
    /// Weight in (0, 1].
    pub weight: f64,
    #[serde(default)]
    pub transform: Transform,
}

impl ScoreRule {
    pub fn new(key: impl Into<String>, weight: f64, transform: Transform) -> Self {
        Self {
            key: key.into(),
            weight,
            transform,
        }
    }
}

/// Validated, ordered list of scoring rules.
///
/// Shared read-only across evaluations. Weights summing above 1 are allowed
/// but produce scores that may exceed 1; construction logs a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScoreRule>", into = "Vec<ScoreRule>")]
pub struct ScoreConfig {
    rules: Vec<ScoreRule>,
}

impl ScoreConfig {
    /// Validate and build a config.
    pub fn new(rules: Vec<ScoreRule>) -> ValtheraResult<Self> {
        if rules.is_empty() {
            return Err(ValtheraError::invalid_config_with_suggestion(
                ErrorCode::CfgEmptyRules,
                "score config has no rules",
                "Add at least one rule with a key, weight, and transform",
            ));
        }

        for rule in &rules {
            if rule.key.trim().is_empty() {
                return Err(ValtheraError::invalid_config(
                    ErrorCode::CfgInvalidKey,
                    "rule key is empty",
                ));
            }
            if !(rule.weight > 0.0 && rule.weight <= 1.0) {
                return Err(ValtheraError::invalid_config_with_suggestion(
                    ErrorCode::CfgInvalidWeight,
                    format!("rule '{}' has weight {} outside (0, 1]", rule.key, rule.weight),
                    "Weights must be greater than 0 and at most 1",
                ));
            }
            rule.transform.validate(&rule.key)?;
        }

        let config = Self { rules };
        let total = config.total_weight();
        if total > 1.0 + f64::EPSILON {
            tracing::warn!(
                total_weight = total,
                "Score config weights sum above 1; composite scores may exceed 1"
            );
        }
        Ok(config)
    }

    pub fn rules(&self) -> &[ScoreRule] {
        &self.rules
    }

    /// Sum of all rule weights.
    pub fn total_weight(&self) -> f64 {
        self.rules.iter().map(|r| r.weight).sum()
    }

    /// Reference motivation config: lead score, recent events, email opens,
    /// and sessions.
    pub fn default_motivation() -> Self {
        Self {
            rules: vec![
                ScoreRule::new("lead_score", 0.30, Transform::Capped { cap: 100.0 }),
                ScoreRule::new("events_count_past_30days", 0.30, Transform::Capped { cap: 50.0 }),
                ScoreRule::new("marketing_emails_opened", 0.20, Transform::Capped { cap: 10.0 }),
                ScoreRule::new("session_count", 0.20, Transform::Capped { cap: 5.0 }),
            ],
        }
    }

    /// Reference ability config: onboarding progress, sessions, and inverse
    /// behavior complexity.
    pub fn default_ability() -> Self {
        Self {
            rules: vec![
                ScoreRule::new("onboarding_steps_completed", 0.30, Transform::Capped { cap: 5.0 }),
                ScoreRule::new("session_count", 0.30, Transform::Capped { cap: 10.0 }),
                ScoreRule::new("behavior_complexity", 0.40, Transform::InverseCapped { cap: 5.0 }),
            ],
        }
    }
}

impl TryFrom<Vec<ScoreRule>> for ScoreConfig {
    type Error = ValtheraError;

    fn try_from(rules: Vec<ScoreRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<ScoreConfig> for Vec<ScoreRule> {
    fn from(config: ScoreConfig) -> Self {
        config.rules
    }
}

/// What the scorer does when a configured signal is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSignalPolicy {
    /// Contribute 0 and record the key as missing.
    #[default]
    Zero,
    /// Fail the evaluation with `MissingSignal`.
    Error,
}

/// Outcome of one rule lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Present,
    Missing,
    NonNumeric,
}

/// One row of a score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<SignalValue>,
    /// Transform output after clamping to [0, 1].
    pub transformed: f64,
    /// `transformed * weight`.
    pub weighted: f64,
    pub status: ComponentStatus,
}

/// Weighted-sum score with its itemized contributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub value: f64,
    pub breakdown: Vec<ScoreComponent>,
}

impl CompositeScore {
    /// Keys that were configured but absent from the context.
    pub fn missing_keys(&self) -> Vec<&str> {
        self.breakdown
            .iter()
            .filter(|c| c.status == ComponentStatus::Missing)
            .map(|c| c.key.as_str())
            .collect()
    }
}

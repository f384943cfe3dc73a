//! Weighted composite scoring.

use crate::error::{ValtheraError, ValtheraResult};
use crate::types::{
    ComponentStatus, CompositeScore, MissingSignalPolicy, ScoreComponent, ScoreConfig, UserContext,
};

/// Computes a [`CompositeScore`] from a context and a rule list.
///
/// Stateless; motivation and ability are scored by two independent calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    policy: MissingSignalPolicy,
}

impl Scorer {
    pub fn new(policy: MissingSignalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MissingSignalPolicy {
        self.policy
    }

    /// Score `context` against `config`.
    ///
    /// Transform output is clamped to [0, 1] before weighting. The sum is
    /// not clamped. Only fails under [`MissingSignalPolicy::Error`].
    pub fn score(&self, context: &UserContext, config: &ScoreConfig) -> ValtheraResult<CompositeScore> {
        let mut breakdown = Vec::with_capacity(config.rules().len());

        for rule in config.rules() {
            let component = match context.get(&rule.key) {
                None => {
                    if self.policy == MissingSignalPolicy::Error {
                        return Err(ValtheraError::MissingSignal {
                            key: rule.key.clone(),
                        });
                    }
                    ScoreComponent {
                        key: rule.key.clone(),
                        raw: None,
                        transformed: 0.0,
                        weighted: 0.0,
                        status: ComponentStatus::Missing,
                    }
                }
                Some(raw) => match rule.transform.apply(raw).filter(|v| !v.is_nan()) {
                    Some(value) => {
                        let transformed = value.clamp(0.0, 1.0);
                        ScoreComponent {
                            key: rule.key.clone(),
                            raw: Some(raw.clone()),
                            transformed,
                            weighted: transformed * rule.weight,
                            status: ComponentStatus::Present,
                        }
                    }
                    None => ScoreComponent {
                        key: rule.key.clone(),
                        raw: Some(raw.clone()),
                        transformed: 0.0,
                        weighted: 0.0,
                        status: ComponentStatus::NonNumeric,
                    },
                },
            };
            breakdown.push(component);
        }

        let value = breakdown.iter().map(|c| c.weighted).sum();
        Ok(CompositeScore { value, breakdown })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScoreRule, SignalMap, SignalValue, Transform};

    fn context(pairs: &[(&str, SignalValue)]) -> UserContext {
        let signals: SignalMap = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        UserContext::new("user_12345", signals)
    }

    fn reference_context() -> UserContext {
        context(&[
            ("lead_score", 80.into()),
            ("events_count_past_30days", 20.into()),
            ("marketing_emails_opened", 5.into()),
            ("session_count", 3.into()),
            ("onboarding_steps_completed", 2.into()),
            ("behavior_complexity", 2.into()),
        ])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_motivation() {
        let score = Scorer::default()
            .score(&reference_context(), &ScoreConfig::default_motivation())
            .unwrap();

        assert!(approx(score.value, 0.58));
        let weighted: Vec<f64> = score.breakdown.iter().map(|c| c.weighted).collect();
        assert!(approx(weighted[0], 0.24));
        assert!(approx(weighted[1], 0.12));
        assert!(approx(weighted[2], 0.10));
        assert!(approx(weighted[3], 0.12));
    }

    #[test]
    fn test_reference_ability() {
        let score = Scorer::default()
            .score(&reference_context(), &ScoreConfig::default_ability())
            .unwrap();

        // 0.30 * 0.4 + 0.30 * 0.3 + 0.40 * 0.6
        assert!(approx(score.value, 0.45));
    }

    #[test]
    fn test_missing_signal_contributes_zero() {
        let full = Scorer::default()
            .score(&reference_context(), &ScoreConfig::default_motivation())
            .unwrap();
        let partial = Scorer::default()
            .score(
                &context(&[
                    ("events_count_past_30days", 20.into()),
                    ("marketing_emails_opened", 5.into()),
                    ("session_count", 3.into()),
                ]),
                &ScoreConfig::default_motivation(),
            )
            .unwrap();

        assert!(partial.value < full.value);
        assert_eq!(partial.missing_keys(), vec!["lead_score"]);
        assert_eq!(partial.breakdown[0].status, ComponentStatus::Missing);
        assert!(partial.breakdown[0].raw.is_none());
    }

    #[test]
    fn test_missing_signal_error_policy() {
        let err = Scorer::new(MissingSignalPolicy::Error)
            .score(&context(&[]), &ScoreConfig::default_ability())
            .unwrap_err();

        assert!(matches!(err, ValtheraError::MissingSignal { key } if key == "onboarding_steps_completed"));
    }

    #[test]
    fn test_misbehaving_transform_is_clamped() {
        let config = ScoreConfig::new(vec![
            ScoreRule::new("a", 0.5, Transform::custom("doubler", |v: &SignalValue| {
                v.as_f64().map(|x| x * 2.0)
            })),
            ScoreRule::new("b", 0.5, Transform::Range { min: 0.0, max: 10.0 }),
        ])
        .unwrap();

        let score = Scorer::default()
            .score(&context(&[("a", 3.into()), ("b", (-5).into())]), &config)
            .unwrap();

        assert!(approx(score.breakdown[0].transformed, 1.0));
        assert!(approx(score.breakdown[1].transformed, 0.0));
        assert!(approx(score.value, 0.5));
    }

    #[test]
    fn test_non_numeric_signal() {
        let config = ScoreConfig::new(vec![ScoreRule::new(
            "lead_score",
            1.0,
            Transform::Capped { cap: 100.0 },
        )])
        .unwrap();

        let score = Scorer::default()
            .score(&context(&[("lead_score", "hot".into())]), &config)
            .unwrap();

        assert_eq!(score.value, 0.0);
        assert_eq!(score.breakdown[0].status, ComponentStatus::NonNumeric);
    }

    #[test]
    fn test_score_bounded_for_bounded_configs() {
        let extremes: [SignalValue; 5] = [
            0.into(),
            1_000_000.into(),
            (-42).into(),
            true.into(),
            "12.5".into(),
        ];
        for raw in extremes {
            let ctx = context(&[
                ("lead_score", raw.clone()),
                ("events_count_past_30days", raw.clone()),
                ("marketing_emails_opened", raw.clone()),
                ("session_count", raw.clone()),
            ]);
            let score = Scorer::default()
                .score(&ctx, &ScoreConfig::default_motivation())
                .unwrap();
            assert!((0.0..=1.0).contains(&score.value), "{:?}", score.value);
        }
    }
}

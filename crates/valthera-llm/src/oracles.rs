//! Reasoning and generation oracles backed by an [`Llm`].

use async_trait::async_trait;
use std::sync::Arc;

use valthera_core::config::LlmProviderConfig;
use valthera_core::error::{ValtheraError, ValtheraResult};
use valthera_core::json_parser::{parse_trigger_draft, parse_verdict};
use valthera_core::traits::{
    GenerationOptions, GenerationOracle, Llm, OracleVerdict, ReasoningOracle, ResponseFormat,
    TriggerDraft,
};
use valthera_core::types::{BehaviorSpec, Decision, ReadinessScores, UserContext};

use crate::factory::LlmFactory;
use crate::prompts::{generation_messages, reasoning_messages};

const REASONING_TEMPERATURE: f32 = 0.0;
const GENERATION_TEMPERATURE: f32 = 0.7;

fn json_options(llm: &dyn Llm, temperature: f32) -> GenerationOptions {
    GenerationOptions {
        temperature: Some(temperature),
        max_tokens: None,
        response_format: llm.supports_json_mode().then_some(ResponseFormat::Json),
    }
}

/// Reasoning oracle asking an LLM for `{action, rationale}`.
pub struct LlmReasoningOracle {
    llm: Arc<dyn Llm>,
}

impl LlmReasoningOracle {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReasoningOracle for LlmReasoningOracle {
    async fn evaluate(
        &self,
        scores: &ReadinessScores,
        behavior: &BehaviorSpec,
    ) -> ValtheraResult<OracleVerdict> {
        let messages = reasoning_messages(scores, behavior);
        let response = self
            .llm
            .generate(&messages, Some(json_options(self.llm.as_ref(), REASONING_TEMPERATURE)))
            .await?;

        tracing::debug!(model = self.llm.model_name(), "Reasoning oracle answered");
        parse_verdict(response.content_or_empty())
    }
}

/// Generation oracle asking an LLM for trigger content.
pub struct LlmTriggerOracle {
    llm: Arc<dyn Llm>,
}

impl LlmTriggerOracle {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GenerationOracle for LlmTriggerOracle {
    async fn generate(
        &self,
        context: &UserContext,
        behavior: &BehaviorSpec,
        decision: &Decision,
    ) -> ValtheraResult<TriggerDraft> {
        let messages = generation_messages(context, behavior, decision);
        let response = self
            .llm
            .generate(&messages, Some(json_options(self.llm.as_ref(), GENERATION_TEMPERATURE)))
            .await?;

        let content = response.content_or_empty();
        if content.trim().is_empty() {
            return Err(ValtheraError::oracle_parse("empty generation response"));
        }
        tracing::debug!(model = self.llm.model_name(), "Generation oracle answered");
        parse_trigger_draft(content)
    }
}

/// Live reasoning and generation oracles sharing one provider.
pub struct Oracles {
    pub reasoning: Arc<dyn ReasoningOracle>,
    pub generation: Arc<dyn GenerationOracle>,
}

/// Factory for the "default to live service" setup.
pub struct OracleFactory;

impl OracleFactory {
    /// Build both oracles over one LLM.
    pub fn from_llm(llm: Arc<dyn Llm>) -> Oracles {
        Oracles {
            reasoning: Arc::new(LlmReasoningOracle::new(llm.clone())),
            generation: Arc::new(LlmTriggerOracle::new(llm)),
        }
    }

    /// Build both oracles from provider configuration.
    pub fn from_config(config: &LlmProviderConfig) -> ValtheraResult<Oracles> {
        let llm = LlmFactory::create(config.provider, config.config.clone())?;
        Ok(Self::from_llm(llm))
    }

    /// Build both oracles over OpenAI `gpt-4o`, reading `OPENAI_API_KEY`.
    pub fn openai() -> ValtheraResult<Oracles> {
        Self::from_config(&LlmProviderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use valthera_core::traits::LlmResponse;
    use valthera_core::types::{Action, DecisionSource, Message, SignalMap, Thresholds};

    /// Replays canned responses and records the options it was called with.
    struct MockLlm {
        responses: Mutex<Vec<String>>,
        seen: Mutex<Vec<GenerationOptions>>,
    }

    impl MockLlm {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Llm for MockLlm {
        async fn generate(
            &self,
            _messages: &[Message],
            options: Option<GenerationOptions>,
        ) -> ValtheraResult<LlmResponse> {
            self.seen.lock().unwrap().push(options.unwrap_or_default());
            let content = self.responses.lock().unwrap().pop();
            Ok(LlmResponse {
                content,
                usage: None,
            })
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn scores() -> ReadinessScores {
        ReadinessScores {
            motivation: 0.58,
            ability: 0.45,
            thresholds: Thresholds::default(),
        }
    }

    fn behavior() -> BehaviorSpec {
        BehaviorSpec::new("upgrade_plan", "Upgrade plan", "Go paid")
    }

    #[tokio::test]
    async fn test_reasoning_oracle_parses_analysis() {
        let llm = Arc::new(MockLlm::new(&[
            r#"{"action": "trigger", "analysis": "User shows strong intent."}"#,
        ]));
        let oracle = LlmReasoningOracle::new(llm.clone());

        let verdict = oracle.evaluate(&scores(), &behavior()).await.unwrap();
        assert_eq!(verdict.action.as_deref(), Some("trigger"));
        assert_eq!(verdict.rationale, "User shows strong intent.");

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, Some(0.0));
        assert_eq!(seen[0].response_format, Some(ResponseFormat::Json));
    }

    #[test]
    fn test_reasoning_oracle_rejects_prose() {
        let oracle = LlmReasoningOracle::new(Arc::new(MockLlm::new(&["I think they are ready."])));
        assert!(tokio_test::block_on(oracle.evaluate(&scores(), &behavior())).is_err());
    }

    #[tokio::test]
    async fn test_trigger_oracle_parses_fenced_json() {
        let llm = Arc::new(MockLlm::new(&[
            "```json\n{\"trigger_message\": \"Go Pro today\", \"channel\": \"email\", \"confidence\": 0.8, \"rationale\": \"engaged\"}\n```",
        ]));
        let oracle = LlmTriggerOracle::new(llm.clone());
        let decision = Decision {
            action: Action::Trigger,
            rationale: "ready".to_string(),
            source: DecisionSource::Deterministic,
        };

        let draft = oracle
            .generate(&UserContext::new("u", SignalMap::new()), &behavior(), &decision)
            .await
            .unwrap();
        assert_eq!(draft.trigger_message, "Go Pro today");
        assert_eq!(llm.seen.lock().unwrap()[0].temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_trigger_oracle_empty_response() {
        let oracle = LlmTriggerOracle::new(Arc::new(MockLlm::new(&[])));
        let decision = Decision {
            action: Action::Trigger,
            rationale: "ready".to_string(),
            source: DecisionSource::Deterministic,
        };
        let err = oracle
            .generate(&UserContext::new("u", SignalMap::new()), &behavior(), &decision)
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}

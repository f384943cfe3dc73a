//! valthera-llm - LLM providers and LLM-backed oracles for valthera.
//!
//! The core pipeline only sees the `ReasoningOracle` and `GenerationOracle`
//! traits. This crate supplies live implementations of both over any
//! [`Llm`], plus the providers themselves.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - GPT-4o and friends
//! - **Anthropic** - Claude 3.5, Claude 3, etc.
//!
//! # Example
//!
//! ```ignore
//! use valthera_llm::OracleFactory;
//!
//! let oracles = OracleFactory::openai()?;
//! let agent = ValtheraAgent::builder()
//!     .reasoning_oracle(oracles.reasoning)
//!     .generation_oracle(oracles.generation)
//!     .build()?;
//! ```

mod anthropic;
mod factory;
mod openai;
mod oracles;
pub mod prompts;

pub use anthropic::AnthropicLlm;
pub use factory::LlmFactory;
pub use openai::OpenAIProvider;
pub use oracles::{LlmReasoningOracle, LlmTriggerOracle, OracleFactory, Oracles};

// Re-export core types for convenience
pub use valthera_core::config::{LlmProvider, LlmProviderConfig};
pub use valthera_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat};

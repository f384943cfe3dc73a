//! Collaborator traits: connectors, oracles, and LLM providers.

mod connector;
mod llm;
mod oracle;

pub use connector::*;
pub use llm::*;
pub use oracle::*;

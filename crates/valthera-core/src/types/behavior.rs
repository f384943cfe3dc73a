//! Candidate behavior descriptions.

use serde::{Deserialize, Serialize};

use crate::error::{ValtheraError, ValtheraResult};

/// Static description of the behavior a trigger would occasion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorSpec {
    /// Unique identifier for the behavior.
    pub behavior_id: String,
    /// Short human-readable name.
    pub name: String,
    /// Longer description handed to oracles.
    #[serde(default)]
    pub description: String,
}

impl BehaviorSpec {
    /// Create a new behavior spec.
    pub fn new(
        behavior_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            behavior_id: behavior_id.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Reject specs missing an id or name.
    pub fn validate(&self) -> ValtheraResult<()> {
        if self.behavior_id.trim().is_empty() {
            return Err(ValtheraError::unknown_behavior("behavior_id is empty"));
        }
        if self.name.trim().is_empty() {
            return Err(ValtheraError::unknown_behavior(format!(
                "behavior '{}' has no name",
                self.behavior_id
            )));
        }
        Ok(())
    }
}

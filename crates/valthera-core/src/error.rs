//! Error types for valthera operations.
//!
//! Errors carry structured codes so tool adapters and callers can branch on
//! them without matching message text. Configuration errors are raised at
//! construction; per-evaluation oracle errors are recovered inside the
//! pipeline and only surface in logs and rationales.

use thiserror::Error;

/// Result type alias for valthera operations.
pub type ValtheraResult<T> = Result<T, ValtheraError>;

/// Main error type for all valthera operations.
#[derive(Error, Debug)]
pub enum ValtheraError {
    /// A score config, threshold, or policy is invalid.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// A configured signal was absent under the strict missing-signal policy.
    #[error("Missing signal: {key}")]
    MissingSignal { key: String },

    /// An oracle did not answer within its timeout.
    #[error("Oracle timed out after {timeout_ms}ms: {oracle}")]
    OracleTimeout { oracle: String, timeout_ms: u64 },

    /// An oracle answered with something that could not be used.
    #[error("Oracle response could not be parsed: {message}")]
    OracleParse { message: String, code: ErrorCode },

    /// Trigger content generation failed after its retry budget.
    #[error("Generation error: {message}")]
    Generation {
        message: String,
        #[source]
        source: Option<Box<ValtheraError>>,
    },

    /// Behavior spec is structurally invalid.
    #[error("Unknown behavior: {message}")]
    UnknownBehavior { message: String },

    /// A connector failed to fetch signals.
    #[error("Connector '{connector}' failed: {message}")]
    Connector { connector: String, message: String },

    /// LLM operation failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Environment or file configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgEmptyRules,
    CfgInvalidWeight,
    CfgInvalidTransform,
    CfgInvalidThreshold,
    CfgInvalidKey,
    CfgInvalidPolicy,

    // Signals (SIG_xxx)
    SigMissing,

    // Oracle (ORC_xxx)
    OrcTimeout,
    OrcInvalidJson,
    OrcMissingField,
    OrcInvalidValue,

    // Generation (GEN_xxx)
    GenFailed,

    // Behavior (BHV_xxx)
    BhvInvalid,

    // Connector (CON_xxx)
    ConFetchFailed,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmInvalidResponse,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgEmptyRules => "CFG_001",
            ErrorCode::CfgInvalidWeight => "CFG_002",
            ErrorCode::CfgInvalidTransform => "CFG_003",
            ErrorCode::CfgInvalidThreshold => "CFG_004",
            ErrorCode::CfgInvalidKey => "CFG_005",
            ErrorCode::CfgInvalidPolicy => "CFG_006",
            ErrorCode::SigMissing => "SIG_001",
            ErrorCode::OrcTimeout => "ORC_001",
            ErrorCode::OrcInvalidJson => "ORC_002",
            ErrorCode::OrcMissingField => "ORC_003",
            ErrorCode::OrcInvalidValue => "ORC_004",
            ErrorCode::GenFailed => "GEN_001",
            ErrorCode::BhvInvalid => "BHV_001",
            ErrorCode::ConFetchFailed => "CON_001",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmInvalidResponse => "LLM_003",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl ValtheraError {
    /// Create an invalid configuration error.
    pub fn invalid_config(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            code,
            suggestion: None,
        }
    }

    /// Create an invalid configuration error with a suggestion.
    pub fn invalid_config_with_suggestion(
        code: ErrorCode,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            code,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create an oracle parse error.
    pub fn oracle_parse(message: impl Into<String>) -> Self {
        Self::OracleParse {
            message: message.into(),
            code: ErrorCode::OrcInvalidJson,
        }
    }

    /// Create an oracle parse error for a missing or empty field.
    pub fn oracle_missing_field(field: &str) -> Self {
        Self::OracleParse {
            message: format!("field '{}' is missing or empty", field),
            code: ErrorCode::OrcMissingField,
        }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap the last oracle error as a generation failure.
    pub fn generation_from(err: ValtheraError) -> Self {
        Self::Generation {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create an unknown behavior error.
    pub fn unknown_behavior(message: impl Into<String>) -> Self {
        Self::UnknownBehavior {
            message: message.into(),
        }
    }

    /// Create a connector error.
    pub fn connector(connector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            message: message.into(),
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { code, .. } => *code,
            Self::MissingSignal { .. } => ErrorCode::SigMissing,
            Self::OracleTimeout { .. } => ErrorCode::OrcTimeout,
            Self::OracleParse { code, .. } => *code,
            Self::Generation { .. } => ErrorCode::GenFailed,
            Self::UnknownBehavior { .. } => ErrorCode::BhvInvalid,
            Self::Connector { .. } => ErrorCode::ConFetchFailed,
            Self::Llm { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether a retry of the same oracle call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::OracleTimeout { .. } | Self::OracleParse { .. } | Self::Llm { .. }
        )
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::InvalidConfig { suggestion, .. } => suggestion.as_deref(),
            Self::MissingSignal { .. } => {
                Some("Check connector output or switch missing_signal_policy to 'zero'")
            }
            Self::OracleTimeout { .. } => Some("Raise the oracle timeout_ms or check provider latency"),
            Self::UnknownBehavior { .. } => Some("Provide a non-empty behavior_id and name"),
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            _ => None,
        }
    }
}

//! Error types for the birth plan assistant.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid API key: {reason}")]
    InvalidCredential { reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider {provider} quota exhausted: {reason}")]
    QuotaExceeded { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} did not answer within {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The user-facing classes a generation failure is reported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Bad credential. The user has to fix the key.
    Auth,
    /// Too many requests; waiting helps.
    RateLimit,
    /// Billing or quota exhausted.
    Quota,
    /// Transport, server or unknown failure.
    Generic,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Quota => "quota",
            Self::Generic => "generic",
        };
        write!(f, "{s}")
    }
}

impl LlmError {
    /// Classify the error for the notice shown in the conversation.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::AuthFailed { .. } => FailureClass::Auth,
            Self::RateLimited { .. } => FailureClass::RateLimit,
            Self::QuotaExceeded { .. } => FailureClass::Quota,
            _ => FailureClass::Generic,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Credential and quota problems never resolve on their own within a
    /// turn, so only transport-level failures are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestFailed { .. } | Self::Timeout { .. })
    }
}

/// Model output that is not a valid dialogue action.
///
/// Never reaches the user: the parser downgrades it to a plain reply.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolDecodeError {
    #[error("response is not an action object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a synthesized plan was (partly) replaced by defaults.
///
/// Absorbed inside the synthesizer; callers always get a complete plan.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("plan generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("plan is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("plan is not a JSON object")]
    NotAnObject,

    #[error("plan is missing sections: {}", .0.join(", "))]
    MissingSections(Vec<&'static str>),
}

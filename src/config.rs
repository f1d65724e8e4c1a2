//! Configuration types.
//!
//! Everything is read from environment variables at startup. The lookup is
//! injectable so tests never touch the process environment.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;
use crate::llm::RetryPolicy;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Models offered in the settings prompt.
pub const SUPPORTED_MODELS: &[&str] = &["gpt-4", "gpt-3.5-turbo"];

/// Prefix every OpenAI secret key carries.
const API_KEY_PREFIX: &str = "sk-";

/// API key plus the model it is used with.
#[derive(Debug, Clone)]
pub struct Credentials {
    api_key: SecretString,
    pub model: String,
}

impl Credentials {
    /// Validate and wrap a key before anything is sent over the network.
    /// The key must carry the `sk-` prefix and something after it.
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::InvalidCredential {
                reason: "API key is empty".to_string(),
            });
        }
        match api_key.strip_prefix(API_KEY_PREFIX) {
            None => {
                return Err(ConfigError::InvalidCredential {
                    reason: format!("API key should start with \"{API_KEY_PREFIX}\""),
                });
            }
            Some("") => {
                return Err(ConfigError::InvalidCredential {
                    reason: format!("API key has nothing after \"{API_KEY_PREFIX}\""),
                });
            }
            Some(_) => {}
        }

        let model = model.into();
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "model".to_string(),
                message: "model identifier is empty".to_string(),
            });
        }

        Ok(Self {
            api_key: SecretString::from(api_key.to_string()),
            model,
        })
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// Last four characters of the key, for display.
    pub fn key_hint(&self) -> String {
        let key = self.api_key.expose_secret();
        let tail: String = key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{API_KEY_PREFIX}…{tail}")
    }
}

/// Sampling bounds and retry tolerance for one kind of generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallProfile {
    pub temperature: f32,
    pub max_tokens: u32,
    pub retry: RetryPolicy,
}

impl CallProfile {
    /// Conversational turns: moderate temperature, short replies.
    pub const fn turn() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            retry: RetryPolicy::none(),
        }
    }

    /// Plan synthesis: near-deterministic, room for the whole document.
    pub const fn synthesis() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 3000,
            retry: RetryPolicy::new(2, Duration::from_millis(500)),
        }
    }
}

/// Generation settings shared by every call in a session.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub base_url: String,
    /// Upper bound for a single provider call.
    pub timeout: Duration,
    pub turn: CallProfile,
    pub synthesis: CallProfile,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            turn: CallProfile::turn(),
            synthesis: CallProfile::synthesis(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub generation: GenerationConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` (variable name → value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;
        let model = lookup("BIRTH_PLAN_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let credentials = Credentials::new(&api_key, model)?;

        let mut generation = GenerationConfig::default();
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            generation.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "BIRTH_PLAN_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "BIRTH_PLAN_TIMEOUT_SECS".to_string(),
                    message: "timeout must be at least one second".to_string(),
                });
            }
            generation.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, "BIRTH_PLAN_TURN_RETRIES")? {
            generation.turn.retry.max_retries = retries;
            if generation.turn.retry.base_delay.is_zero() {
                generation.turn.retry.base_delay = Duration::from_millis(500);
            }
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, "BIRTH_PLAN_SYNTHESIS_RETRIES")? {
            generation.synthesis.retry.max_retries = retries;
        }

        Ok(Self {
            credentials,
            generation,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}

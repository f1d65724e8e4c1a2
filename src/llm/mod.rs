//! LLM integration.
//!
//! - `provider`: provider-agnostic message types and the `LlmProvider` trait
//! - `openai`: OpenAI-compatible chat-completions transport over reqwest
//! - `client`: the generation client used by the dialogue and the synthesizer

pub mod client;
mod costs;
pub mod openai;
pub mod provider;
pub(crate) mod retry;
#[cfg(test)]
pub(crate) mod testing;

pub use client::GenerationClient;
pub use openai::OpenAiProvider;
pub use provider::*;
pub use retry::RetryPolicy;

use std::sync::Arc;

use crate::config::{Credentials, GenerationConfig};
use crate::error::ConfigError;

/// Build a generation client from validated credentials.
pub fn create_client(
    credentials: &Credentials,
    generation: &GenerationConfig,
) -> Result<GenerationClient, ConfigError> {
    let provider = OpenAiProvider::new(
        credentials.api_key().clone(),
        credentials.model.clone(),
        generation.base_url.clone(),
    )?;
    tracing::info!(
        model = %credentials.model,
        key = %credentials.key_hint(),
        "Using OpenAI"
    );
    Ok(GenerationClient::new(Arc::new(provider), generation.timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_client_uses_configured_model() {
        let credentials = Credentials::new("sk-test", "gpt-3.5-turbo").unwrap();
        let client = create_client(&credentials, &GenerationConfig::default()).unwrap();
        assert_eq!(client.model_name(), "gpt-3.5-turbo");
    }
}

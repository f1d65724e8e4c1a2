//! Generation client: one instruction plus an ordered conversation in, text out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::CallProfile;
use crate::error::LlmError;
use crate::llm::costs::estimate_cost;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::llm::retry::with_retry;

/// Thin adapter over an `LlmProvider`.
///
/// Prepends the system instruction, applies the call profile, bounds each
/// attempt with a timeout and retries transient failures per the profile.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Run one generation call and return the raw text.
    pub async fn invoke(
        &self,
        instruction: &str,
        messages: &[ChatMessage],
        profile: &CallProfile,
    ) -> Result<String, LlmError> {
        let mut full = Vec::with_capacity(messages.len() + 1);
        full.push(ChatMessage::system(instruction));
        full.extend_from_slice(messages);

        let request = CompletionRequest::new(full)
            .with_temperature(profile.temperature)
            .with_max_tokens(profile.max_tokens);

        debug!(
            model = self.provider.model_name(),
            messages = request.messages.len(),
            temperature = profile.temperature,
            max_tokens = profile.max_tokens,
            "Invoking generation"
        );

        let response = with_retry(profile.retry, || {
            let request = request.clone();
            async move {
                match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(LlmError::Timeout {
                        provider: self.provider.model_name().to_string(),
                        timeout: self.timeout,
                    }),
                }
            }
        })
        .await?;

        let cost = estimate_cost(
            self.provider.cost_per_token(),
            response.input_tokens,
            response.output_tokens,
        );
        info!(
            model = self.provider.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            cost_usd = %cost.round_dp(6),
            "Generation complete"
        );

        Ok(response.content)
    }
}

//! Scripted provider for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Scripted {
    Text(String),
    Auth,
    RateLimit,
    Quota,
    Network,
    /// Never answers; used to exercise timeouts and cancellation.
    Hang,
}

impl Scripted {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// A well-formed action reply.
    pub fn action(action: &str, message: &str) -> Self {
        Self::Text(serde_json::json!({ "action": action, "message": message }).to_string())
    }
}

/// Answers requests from a queue and records what it was sent.
///
/// An exhausted queue answers with a network failure.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        let provider = "scripted".to_string();
        match next {
            Some(Scripted::Text(content)) => Ok(CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
                response_id: None,
            }),
            Some(Scripted::Auth) => Err(LlmError::AuthFailed { provider }),
            Some(Scripted::RateLimit) => Err(LlmError::RateLimited {
                provider,
                retry_after: Some(Duration::from_secs(1)),
            }),
            Some(Scripted::Quota) => Err(LlmError::QuotaExceeded {
                provider,
                reason: "insufficient_quota".to_string(),
            }),
            Some(Scripted::Hang) => std::future::pending().await,
            Some(Scripted::Network) | None => Err(LlmError::RequestFailed {
                provider,
                reason: "connection reset".to_string(),
            }),
        }
    }
}

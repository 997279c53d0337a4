//! Language-model client for an OpenAI-compatible chat-completions API.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::clients::{Completion, LanguageModelClient};
use crate::core::config::LlmConfig;
use crate::core::errors::{CapabilityError, CapabilityResult};
use crate::core::message::ChatTurn;

/// Sliding-window length for the client-side rate limiter.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Client-side sliding-window rate limiter.
struct RateLimiter {
    max_requests: usize,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    fn new(max_requests: usize) -> Self {
        Self {
            max_requests,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Record an attempt at `now`; returns false when the window is full.
    fn try_acquire(&self, now: Instant) -> bool {
        let Ok(mut timestamps) = self.timestamps.lock() else {
            return false;
        };
        while timestamps
            .front()
            .is_some_and(|first| now.duration_since(*first) >= RATE_LIMIT_WINDOW)
        {
            timestamps.pop_front();
        }
        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push_back(now);
        true
    }
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiChatClient {
    http: reqwest::Client,
    config: LlmConfig,
    limiter: RateLimiter,
}

#[derive(Deserialize)]
struct CompletionEnvelope {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Default, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiChatClient {
    /// Create a client from configuration. The API key is checked per
    /// request, not at construction, so a keyless process can still start.
    #[must_use]
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            limiter: RateLimiter::new(config.rate_limit_per_minute),
            config,
        }
    }
}

#[async_trait]
impl LanguageModelClient for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatTurn]) -> CapabilityResult<Completion> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            CapabilityError::MissingCredential("language model API key is not set".to_string())
        })?;

        if !self.limiter.try_acquire(Instant::now()) {
            return Err(CapabilityError::RateLimited);
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.config.model,
                "messages": messages,
                "max_tokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }))
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(CapabilityError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(CapabilityError::Api(format!(
                "completion failed with status {}",
                response.status()
            )));
        }

        let envelope: CompletionEnvelope = response.json().await?;
        let text = envelope
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| CapabilityError::Api("completion had no choices".to_string()))?;

        Ok(Completion {
            text,
            model_id: envelope.model,
            tokens_used: envelope.usage.total_tokens,
        })
    }
}

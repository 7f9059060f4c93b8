//! OpenAI-compatible language-model backend.
//!
//! Chat models go through `POST {base}/chat/completions`, plain text models
//! through `POST {base}/completions` (which also forwards the `logprobs` and
//! `echo` sampling fields). Either endpoint may return several candidate
//! completions per call via the `n` sampling parameter.
//!
//! Transient failures (HTTP 429/5xx and transport errors) are retried with
//! capped exponential backoff; anything else is fatal to the call.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SamplingParams;
use crate::model::backend::{Backend, Generation, Prompt};

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author: `"system"`, `"user"`, or `"assistant"`.
    pub role: String,
    /// The textual content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Token usage statistics for a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Usage,
}

/// HTTP backend for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    api_base: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
    max_retries: usize,
}

impl OpenAiBackend {
    /// Create a backend pointing at `api_base` (e.g. `"https://api.openai.com/v1"`).
    pub fn new(api_base: &str, api_key: &str, model: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build reqwest client");
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            http,
            max_retries: 5,
        }
    }

    /// Whether a model id names a chat model.
    pub fn is_chat_model(model: &str) -> bool {
        model.contains("gpt-3.5-turbo") || model.contains("gpt-4") || model.contains("chat")
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<Generation> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "top_p": params.top_p,
            "n": params.n,
        });
        debug!(model = %self.model, n = params.n, "sending chat completion request");

        let response = self.send_with_backoff(&url, &body).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse chat completion response")?;

        let samples = parsed
            .choices
            .into_iter()
            .map(|choice| choice.message.content)
            .collect();
        let cost = estimate_cost(&self.model, &parsed.usage);
        info!(
            model = %self.model,
            prompt_tokens = parsed.usage.prompt_tokens,
            completion_tokens = parsed.usage.completion_tokens,
            cost,
            "chat completion succeeded"
        );
        Ok(Generation { samples, cost })
    }

    async fn completion(&self, prompt: &str, params: &SamplingParams) -> Result<Generation> {
        let url = format!("{}/completions", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "top_p": params.top_p,
            "n": params.n,
            "logprobs": params.logprobs,
            "echo": params.echo,
        });
        debug!(model = %self.model, n = params.n, "sending completion request");

        let response = self.send_with_backoff(&url, &body).await?;
        let parsed: CompletionResponse = response
            .json()
            .await
            .context("failed to parse completion response")?;

        let samples = parsed.choices.into_iter().map(|choice| choice.text).collect();
        let cost = estimate_cost(&self.model, &parsed.usage);
        info!(
            model = %self.model,
            total_tokens = parsed.usage.total_tokens,
            cost,
            "completion succeeded"
        );
        Ok(Generation { samples, cost })
    }

    /// Post `body`, retrying transient failures with exponential backoff.
    async fn send_with_backoff(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        let mut delay = Duration::from_secs(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .http
                .post(url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response)
                    if attempt <= self.max_retries
                        && (response.status().is_server_error()
                            || response.status().as_u16() == 429) =>
                {
                    warn!(
                        status = %response.status(),
                        attempt,
                        "transient API failure, backing off"
                    );
                }
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    bail!("language model API returned {status}: {text}");
                }
                Err(err) if attempt <= self.max_retries => {
                    warn!(error = %err, attempt, "request failed, backing off");
                }
                Err(err) => {
                    return Err(err).context("failed to send language model request");
                }
            }
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }
}

impl Backend for OpenAiBackend {
    async fn generate(&self, prompt: &Prompt, params: &SamplingParams) -> Result<Generation> {
        match prompt {
            Prompt::Chat(messages) => self.chat_completion(messages, params).await,
            Prompt::Text(text) => self.completion(text, params).await,
        }
    }
}

/// Dollar cost of a request under the provider's published per-token rates.
fn estimate_cost(model: &str, usage: &Usage) -> f64 {
    if model.contains("gpt-4") {
        usage.prompt_tokens as f64 * 0.03 / 1000.0 + usage.completion_tokens as f64 * 0.06 / 1000.0
    } else if model.contains("gpt-3.5") {
        usage.total_tokens as f64 * 0.002 / 1000.0
    } else {
        0.0
    }
}

//! Generation service seam and the OpenAI-compatible chat client
//!
//! Works against any OpenAI-compatible endpoint (OpenAI, Ollama, vLLM,
//! LM Studio, ...). One logical call per persona; transient failures are
//! retried by the shared [`RetryPolicy`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GenerationSettings;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Longest slice of an error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Prompt pair sent to the generation service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
}

/// Text generation backend
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Generate a completion for `request`, returning the raw text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

// ─────────────────────────────────────────────────────────────────
// OpenAI API types (request/response)
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────
// OpenAI Client
// ─────────────────────────────────────────────────────────────────

/// Chat-completions client for OpenAI-compatible APIs
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(settings: &GenerationSettings, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let retry = settings.retry_policy();
        info!(
            base_url = %settings.base_url,
            model = %settings.model,
            max_attempts = retry.max_attempts(),
            "OpenAI-compatible client created"
        );

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout_secs: settings.timeout_secs,
            retry,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, request: &'a GenerationRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    async fn complete_once(&self, body: &ChatCompletionRequest<'_>) -> Result<String> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::from_synthesis(self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SynthesisStatus {
                status: status.as_u16(),
                message: body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::from_synthesis(self.timeout_secs, e))?;

        extract_content(parsed)
    }
}

fn extract_content(parsed: ChatCompletionResponse) -> Result<String> {
    if let Some(usage) = &parsed.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "Token usage"
        );
    }

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::synthesis_failed("No choices in API response"))?;

    if choice.finish_reason.as_deref() == Some("length") {
        debug!("Completion stopped at max_tokens");
    }

    Ok(choice.message.content.unwrap_or_default().trim().to_string())
}

#[async_trait]
impl GenerationService for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = self.request_body(request);
        self.retry
            .run("chat_completion", || self.complete_once(&body))
            .await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted generation service

    use parking_lot::Mutex;

    use super::*;

    pub struct MockGenerationService {
        reply: std::result::Result<String, u16>,
        pub requests: Mutex<Vec<GenerationRequest>>,
    }

    impl MockGenerationService {
        pub fn replying(text: impl Into<String>) -> Self {
            Self {
                reply: Ok(text.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl GenerationService for MockGenerationService {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.requests.lock().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(Error::SynthesisStatus {
                    status: *status,
                    message: "mock failure".to_string(),
                }),
            }
        }
    }
}

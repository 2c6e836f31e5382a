/// Enhancement client: the single place that calls an AI chat-completion provider.
///
/// Every call is one request with no retry. The provider and key come from the
/// `AiConfig` passed in by the caller; this module holds no configuration of its own.
/// On success the returned text replaces the user's field verbatim; on any error the
/// field is left as it was.
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::{AiConfig, AiProvider};

pub mod prompts;

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("There is no text to enhance")]
    NothingToEnhance,

    #[error("No API key is configured for {0}")]
    MissingApiKey(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider returned an unreadable response: {0}")]
    Malformed(String),

    #[error("Provider returned no content")]
    EmptyContent,
}

impl AiProvider {
    fn endpoint(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "https://api.openai.com/v1/chat/completions",
            AiProvider::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
            AiProvider::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
            }
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4",
            AiProvider::DeepSeek => "deepseek-chat",
            AiProvider::Gemini => "gemini-1.5-flash",
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// OpenAI-compatible providers answer `{"error": {"message": ...}}` on failure;
// some wrap it in a one-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderError {
    Single { error: ProviderErrorBody },
    Wrapped(Vec<ProviderError>),
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

impl ProviderError {
    fn into_message(self) -> Option<String> {
        match self {
            ProviderError::Single { error } => Some(error.message),
            ProviderError::Wrapped(inner) => inner.into_iter().next()?.into_message(),
        }
    }
}

#[derive(Clone)]
pub struct EnhancementClient {
    client: Client,
    base_url: Option<String>,
}

impl EnhancementClient {
    /// `base_url` replaces the provider's endpoint when set; the request path is
    /// still `/v1/chat/completions`.
    pub fn new(timeout: Duration, base_url: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the AI provider")?;
        Ok(Self { client, base_url })
    }

    fn url_for(&self, provider: AiProvider) -> String {
        match &self.base_url {
            Some(base) => format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            None => provider.endpoint().to_string(),
        }
    }

    /// Rewrites a CV field.
    pub async fn enhance(&self, config: &AiConfig, text: &str) -> Result<String, EnhanceError> {
        self.complete(config, prompts::CV_SYSTEM, text).await
    }

    /// Rewrites a cover letter body. HTML markup is stripped first.
    pub async fn enhance_letter(
        &self,
        config: &AiConfig,
        html: &str,
    ) -> Result<String, EnhanceError> {
        let text = prompts::plain_text(html);
        self.complete(config, prompts::LETTER_SYSTEM, &text).await
    }

    async fn complete(
        &self,
        config: &AiConfig,
        system: &str,
        text: &str,
    ) -> Result<String, EnhanceError> {
        if text.trim().is_empty() {
            return Err(EnhanceError::NothingToEnhance);
        }
        if !config.has_api_key() {
            return Err(EnhanceError::MissingApiKey(config.model.display_name()));
        }

        let provider = config.model;
        let request_body = CompletionRequest {
            model: provider.model_name(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        debug!(
            "Enhancement request to {:?} ({} chars)",
            provider,
            text.chars().count()
        );

        let response = self
            .client
            .post(self.url_for(provider))
            .bearer_auth(config.api_key.trim())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("AI provider returned {status}");
            let message = serde_json::from_str::<ProviderError>(&body)
                .ok()
                .and_then(ProviderError::into_message)
                .unwrap_or(body);
            return Err(EnhanceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| EnhanceError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(EnhanceError::EmptyContent)
    }
}

use crate::error::{AskDbError, Result};
use crate::llm::model::{LanguageModel, Message};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OllamaConfig {
    /// resolve settings, falling back to environment variables and then defaults
    pub fn resolve(base_url: Option<String>, model: Option<String>) -> Self {
        let base_url = base_url
            .or_else(|| env::var("OLLAMA_HOST").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = model
            .or_else(|| env::var("ASKDB_MODEL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            base_url,
            model,
            ..Self::default()
        }
    }

    fn chat_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        // OLLAMA_HOST is commonly set without a scheme
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{}/api/chat", base)
        } else {
            format!("http://{}/api/chat", base)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// language model served by a local ollama instance
pub struct OllamaModel {
    config: OllamaConfig,
    client: Client,
}

impl OllamaModel {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        tracing::info!(
            model = %config.model,
            base_url = %config.base_url,
            "ollama client initialized"
        );

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    #[tracing::instrument(skip(self, messages), fields(llm.model = %self.config.model, message_count = messages.len()))]
    async fn generate(&self, messages: Vec<Message>) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(self.config.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AskDbError::Model(format!("ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AskDbError::Model(format!(
                "ollama returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AskDbError::Model(format!("failed to parse ollama response: {}", e)))?;

        tracing::debug!("generated {} chars", chat.message.content.len());

        Ok(chat.message.content)
    }
}

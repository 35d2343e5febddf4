//! HTTP client for OpenAI-compatible chat completion endpoints (Groq by
//! default).

use super::Generator;
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Settings for the generation service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Environment variable the key was read from, for error messages.
    pub api_key_env: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            model_name: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completions request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Chat completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GenerationError::new(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Generator for ChatClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            GenerationError::new(format!("{} is not set", self.config.api_key_env))
        })?;

        let request = ChatRequest {
            model: &self.config.model_name,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        debug!(
            "Sending chat request to {} with model {}",
            self.config.api_url, self.config.model_name
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::new(format!(
                        "Request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    GenerationError::new(format!(
                        "Cannot connect to generation service at {}",
                        self.config.api_url
                    ))
                } else {
                    GenerationError::new(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::with_status(
                format!("API error {}: {}", status, body),
                status.as_u16(),
            ));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            GenerationError::with_status(
                format!("Failed to parse API response: {}", e),
                status.as_u16(),
            )
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                GenerationError::with_status("API response contained no message", status.as_u16())
            })
    }
}

//! Dobby chat-completion client
//!
//! Cache first, then a retried POST to the Fireworks chat endpoint.
//! Exhausted retries come back as report text, never as an error.

use crate::cache::ResponseCache;
use crate::error::WatcherError;
use crate::retry::RetryPolicy;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

pub const DOBBY_MODEL: &str = "accounts/sentientfoundation/models/dobby-unhinged-llama-3-3-70b-new";
pub const DEFAULT_DOBBY_API_URL: &str = "https://api.fireworks.ai/inference/v1/chat/completions";

/// Transport for a single chat completion request
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Single-turn request with the fixed Dobby sampling parameters
    pub fn dobby(prompt: &str) -> Self {
        Self {
            model: DOBBY_MODEL.to_string(),
            max_tokens: 100,
            top_p: 1.0,
            top_k: 40,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            temperature: 0.6,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Reusable Fireworks client (connection-pooled)
pub struct FireworksBackend {
    client: Client,
    api_key: String,
    url: String,
}

impl FireworksBackend {
    pub fn new(client: Client, api_key: String, url: String) -> Self {
        Self {
            client,
            api_key,
            url,
        }
    }
}

#[async_trait]
impl CompletionBackend for FireworksBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Dobby API error response: {}", error_text);
            return Err(WatcherError::api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response.json().await?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| WatcherError::parse("Dobby response contained no choices"))
    }
}

/// Completion client owning its own response cache
pub struct CompletionClient {
    backend: Box<dyn CompletionBackend>,
    cache: RwLock<ResponseCache>,
    retry: RetryPolicy,
}

impl CompletionClient {
    pub fn new(backend: Box<dyn CompletionBackend>, cache_ttl: Duration, retry: RetryPolicy) -> Self {
        Self {
            backend,
            cache: RwLock::new(ResponseCache::new(cache_ttl)),
            retry,
        }
    }

    /// Complete `prompt`. Identical prompts inside the TTL hit the cache.
    pub async fn complete(&self, prompt: &str) -> String {
        if let Some(cached) = self.cache.read().await.get(prompt) {
            info!("Dobby cache hit: {}", prompt);
            return cached;
        }

        let request = &ChatRequest::dobby(prompt);
        let backend = self.backend.as_ref();

        match self
            .retry
            .run("Dobby", || backend.complete(request))
            .await
        {
            Ok(answer) => {
                self.cache.write().await.put(prompt, answer.clone());
                info!("Dobby call successful: {}", prompt);
                answer
            }
            Err(exhausted) => format!(
                "Error calling Dobby after {} attempts: {}",
                exhausted.attempts, exhausted.last_error
            ),
        }
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }
}

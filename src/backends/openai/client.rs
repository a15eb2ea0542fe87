use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;

use super::types::{ChatMessage, ChatRequest, ChatResponse};
use crate::backend::Backend;
use crate::backends::snippet;
use crate::decoder::{ChunkStreamExt, Framing};
use crate::generation::Generation;
use crate::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the hosted chat-completions API.
///
/// Streamed replies arrive as server-sent events; buffered ones as a single
/// JSON document. Either way the prompt goes out as a one-message chat.
pub struct OpenAIBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIBackend {
    /// Build a client against the public API. An empty model name selects
    /// [`DEFAULT_MODEL`].
    pub fn new(api_key: String, model: String) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(
        api_key: String,
        model: String,
        base_url: String,
    ) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(GENERATION_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {e}")))?;
        let model = if model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            model
        };
        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    fn chat_request(&self, prompt: &str, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.7,
            stream,
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, Error> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Failed requests carry the error envelope in the body. Surface its
        // message when present, the status line otherwise.
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ChatResponse>(&body)
            .ok()
            .and_then(|reply| reply.error)
        {
            Some(api_error) => Err(Error::upstream(api_error.message)),
            None => Err(Error::upstream(format!("status {status}: {}", snippet(&body)))),
        }
    }
}

#[async_trait]
impl Backend for OpenAIBackend {
    async fn complete(&self, prompt: &str) -> Result<String, Error> {
        let response = self.send(&self.chat_request(prompt, false)).await?;

        let body = response.text().await?;
        let reply: ChatResponse = serde_json::from_str(&body)
            .map_err(|_| Error::malformed(format!("failed to parse chat reply: {}", snippet(&body))))?;

        if let Some(content) = reply.content() {
            return Ok(content.trim().to_string());
        }
        if let Some(api_error) = reply.error {
            return Err(Error::upstream(api_error.message));
        }
        Err(Error::malformed(format!(
            "no message content in chat reply: {}",
            snippet(&body)
        )))
    }

    async fn stream(&self, prompt: &str) -> Result<Generation, Error> {
        let response = self.send(&self.chat_request(prompt, true)).await?;

        let chunks = response
            .bytes_stream()
            .map_err(Error::from)
            .text_chunks(Framing::EventStream);
        Ok(Generation::from_stream(chunks))
    }
}

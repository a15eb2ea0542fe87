use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;

use super::types::{GenerateRequest, GenerateResponse, ModelInfo, TagsResponse};
use crate::backend::Backend;
use crate::backends::snippet;
use crate::decoder::{ChunkStreamExt, Framing};
use crate::generation::Generation;
use crate::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";

const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);
const LISTING_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a local Ollama-style generation server.
///
/// Talks newline-delimited JSON to `POST /api/generate` and lists installed
/// models through `GET /api/tags`.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Build a client against the default local server address. An empty
    /// model name selects [`DEFAULT_MODEL`].
    pub fn new(model: String) -> Result<Self, Error> {
        Self::new_with_base_url(model, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(model: String, base_url: String) -> Result<Self, Error> {
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
            base_url,
            model,
        })
    }

    /// List installed models. Degrades to an empty list when the server is
    /// unreachable, slow, or replies with something unexpected.
    pub async fn models(&self) -> Vec<ModelInfo> {
        match self.fetch_models().await {
            Ok(models) => models,
            Err(e) => {
                tracing::debug!("model listing unavailable: {e}");
                Vec::new()
            }
        }
    }

    async fn fetch_models(&self) -> Result<Vec<ModelInfo>, Error> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(LISTING_TIMEOUT)
            .send()
            .await?;
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models)
    }

    /// Whether the server is up and has at least one model installed.
    pub async fn available(&self) -> bool {
        !self.models().await.is_empty()
    }

    fn generate_request(&self, prompt: &str, stream: bool) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream,
        }
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn complete(&self, prompt: &str) -> Result<String, Error> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.generate_request(prompt, false))
            .send()
            .await?;

        let body = response.text().await?;
        let reply: GenerateResponse = serde_json::from_str(&body)
            .map_err(|_| Error::malformed(format!("failed to parse generation reply: {}", snippet(&body))))?;
        match reply.response {
            Some(text) => Ok(text.trim().to_string()),
            None => Err(Error::malformed(format!(
                "no response field in generation reply: {}",
                snippet(&body)
            ))),
        }
    }

    async fn stream(&self, prompt: &str) -> Result<Generation, Error> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.generate_request(prompt, true))
            .send()
            .await?;

        let chunks = response
            .bytes_stream()
            .map_err(Error::from)
            .text_chunks(Framing::JsonLines);
        Ok(Generation::from_stream(chunks))
    }
}

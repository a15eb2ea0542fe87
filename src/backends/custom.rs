use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

use crate::backend::Backend;
use crate::generation::Generation;
use crate::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Reply fields probed for generated text, in order.
const TEXT_FIELDS: [&str; 4] = ["response", "text", "content", "message"];

#[derive(Debug, Clone, Serialize)]
struct CustomRequest {
    prompt: String,
}

/// Client for a user-supplied generation endpoint with an unknown reply
/// shape.
///
/// Sends `{"prompt": ...}` and takes whatever comes back: the first common
/// text field of a JSON reply, or failing that the raw body. Extraction
/// never fails, so a misconfigured endpoint shows up as strange draft text
/// rather than an error.
pub struct CustomBackend {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl CustomBackend {
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self, Error> {
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::config(format!("invalid endpoint URL '{endpoint}': {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn extract_text(body: &str) -> String {
        if let Ok(reply) = serde_json::from_str::<Value>(body) {
            for field in TEXT_FIELDS {
                if let Some(text) = reply.get(field).and_then(Value::as_str) {
                    if !text.is_empty() {
                        return text.trim().to_string();
                    }
                }
            }
        }
        body.trim().to_string()
    }
}

#[async_trait]
impl Backend for CustomBackend {
    async fn complete(&self, prompt: &str) -> Result<String, Error> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&CustomRequest {
                prompt: prompt.to_string(),
            });
        if let Some(key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let body = response.text().await?;
        Ok(Self::extract_text(&body))
    }

    async fn stream(&self, _prompt: &str) -> Result<Generation, Error> {
        Err(Error::config("custom endpoints do not support streaming"))
    }
}

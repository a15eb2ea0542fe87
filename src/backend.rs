use async_trait::async_trait;

use crate::generation::Generation;
use crate::Error;

/// A text-generation backend reachable over HTTP.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run a generation to completion and return the trimmed text.
    async fn complete(&self, prompt: &str) -> Result<String, Error>;

    /// Start a streamed generation.
    async fn stream(&self, prompt: &str) -> Result<Generation, Error>;
}

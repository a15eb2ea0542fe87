//! LLM-backed drafting of git commit messages.
//!
//! This library turns a staged diff into a commit command through one of
//! three HTTP backends: a local Ollama-style generation server, the hosted
//! OpenAI chat-completions API, or a user-supplied custom endpoint. Streamed
//! replies are decoded incrementally so drafts can render as they generate.

pub mod backend;
pub mod backends;
pub mod decoder;
pub mod error;
pub mod factory;
pub mod generation;
pub mod prompt;

// Re-export core types for easy usage
pub use backend::Backend;
pub use backends::ollama::ModelInfo;
pub use backends::{CustomBackend, OllamaBackend, OpenAIBackend};
pub use decoder::{ChunkStream, ChunkStreamExt, Framing, StreamDecoder};
pub use error::Error;
pub use factory::{BackendConfig, BackendFactory, BackendType};
pub use generation::Generation;
pub use prompt::CommitPrompt;

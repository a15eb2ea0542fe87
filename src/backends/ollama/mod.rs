pub mod client;
pub mod types;

pub use client::{OllamaBackend, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use types::ModelInfo;

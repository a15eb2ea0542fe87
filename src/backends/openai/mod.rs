pub mod client;
pub mod types;

pub use client::{OpenAIBackend, DEFAULT_BASE_URL, DEFAULT_MODEL};

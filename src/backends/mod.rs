pub mod custom;
pub mod ollama;
pub mod openai;

pub use custom::CustomBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAIBackend;

/// First 200 characters of a reply body, for error messages that quote
/// what the backend actually sent.
pub(crate) fn snippet(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

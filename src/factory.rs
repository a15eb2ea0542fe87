use std::env;

use crate::backends::{CustomBackend, OllamaBackend, OpenAIBackend};
use crate::{Backend, Error};

/// Supported generation backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendType {
    Ollama,
    OpenAI,
    Custom,
}

/// Configuration for creating backends.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub backend_type: BackendType,
    /// Model name; empty selects the backend's default.
    pub model: String,
    pub api_key: Option<String>,
    /// Base URL override for the local backend, full endpoint URL for the
    /// custom one.
    pub endpoint: Option<String>,
}

impl BackendConfig {
    /// Create configuration for the local generation server.
    pub fn ollama(model: String) -> Self {
        Self {
            backend_type: BackendType::Ollama,
            model,
            api_key: None,
            endpoint: None,
        }
    }

    /// Create configuration for the hosted chat-completions API.
    pub fn openai(api_key: String, model: String) -> Self {
        Self {
            backend_type: BackendType::OpenAI,
            model,
            api_key: Some(api_key),
            endpoint: None,
        }
    }

    /// Create configuration for a user-supplied endpoint.
    pub fn custom(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            backend_type: BackendType::Custom,
            model: String::new(),
            api_key,
            endpoint: Some(endpoint),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// `COMMIT_LLM_BACKEND` selects the backend explicitly (`ollama`,
    /// `openai` or `custom`). Without it, a non-empty `OPENAI_API_KEY`
    /// selects the hosted backend and anything else falls back to the
    /// local server.
    pub fn from_env() -> Result<Self, Error> {
        let model = env::var("COMMIT_LLM_MODEL").unwrap_or_default();

        if let Ok(backend) = env::var("COMMIT_LLM_BACKEND") {
            return match backend.to_lowercase().as_str() {
                "ollama" => {
                    let mut config = Self::ollama(model);
                    config.endpoint = env::var("OLLAMA_HOST").ok();
                    Ok(config)
                }
                "openai" => {
                    let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
                        Error::config(
                            "OPENAI_API_KEY environment variable is required for the openai backend",
                        )
                    })?;
                    Ok(Self::openai(api_key, model))
                }
                "custom" => {
                    let endpoint = env::var("COMMIT_LLM_ENDPOINT").map_err(|_| {
                        Error::config(
                            "COMMIT_LLM_ENDPOINT environment variable is required for the custom backend",
                        )
                    })?;
                    Ok(Self::custom(endpoint, env::var("COMMIT_LLM_API_KEY").ok()))
                }
                _ => Err(Error::config(format!(
                    "Invalid COMMIT_LLM_BACKEND '{backend}'. Valid values are: ollama, openai, custom"
                ))),
            };
        }

        // Fall back to credential sniffing.
        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            if !api_key.is_empty() {
                return Ok(Self::openai(api_key, model));
            }
        }

        let mut config = Self::ollama(model);
        config.endpoint = env::var("OLLAMA_HOST").ok();
        Ok(config)
    }
}

/// Factory for creating generation backends.
pub struct BackendFactory;

impl BackendFactory {
    /// Create a backend from configuration.
    pub fn create(config: &BackendConfig) -> Result<Box<dyn Backend>, Error> {
        match config.backend_type {
            BackendType::Ollama => {
                let backend = match &config.endpoint {
                    Some(host) if !host.is_empty() => {
                        OllamaBackend::new_with_base_url(config.model.clone(), host.clone())?
                    }
                    _ => OllamaBackend::new(config.model.clone())?,
                };
                Ok(Box::new(backend))
            }
            BackendType::OpenAI => {
                let api_key = config
                    .api_key
                    .as_ref()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| Error::config("API key required for the openai backend"))?;
                let backend = OpenAIBackend::new(api_key.clone(), config.model.clone())?;
                Ok(Box::new(backend))
            }
            BackendType::Custom => {
                let endpoint = config
                    .endpoint
                    .as_ref()
                    .ok_or_else(|| Error::config("Endpoint URL required for the custom backend"))?;
                let backend = CustomBackend::new(endpoint.clone(), config.api_key.clone())?;
                Ok(Box::new(backend))
            }
        }
    }

    /// Create a backend from environment variables.
    pub fn from_env() -> Result<Box<dyn Backend>, Error> {
        let config = BackendConfig::from_env()?;
        Self::create(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_config() {
        let config = BackendConfig::ollama("llama3.2".to_string());
        assert!(matches!(config.backend_type, BackendType::Ollama));
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.api_key, None);
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn test_openai_config() {
        let config = BackendConfig::openai("sk-test".to_string(), String::new());
        assert!(matches!(config.backend_type, BackendType::OpenAI));
        assert_eq!(config.api_key, Some("sk-test".to_string()));
    }

    #[test]
    fn test_custom_config() {
        let config = BackendConfig::custom("http://localhost:9000/generate".to_string(), None);
        assert!(matches!(config.backend_type, BackendType::Custom));
        assert_eq!(
            config.endpoint,
            Some("http://localhost:9000/generate".to_string())
        );
    }

    #[test]
    fn test_create_each_backend() {
        assert!(BackendFactory::create(&BackendConfig::ollama(String::new())).is_ok());
        assert!(BackendFactory::create(&BackendConfig::openai(
            "sk-test".to_string(),
            String::new()
        ))
        .is_ok());
        assert!(BackendFactory::create(&BackendConfig::custom(
            "http://localhost:9000/generate".to_string(),
            Some("key".to_string())
        ))
        .is_ok());
    }

    #[test]
    fn test_create_requires_api_key_for_openai() {
        let config = BackendConfig::openai(String::new(), String::new());
        assert!(matches!(
            BackendFactory::create(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_create_requires_endpoint_for_custom() {
        let config = BackendConfig {
            backend_type: BackendType::Custom,
            model: String::new(),
            api_key: None,
            endpoint: None,
        };
        assert!(matches!(
            BackendFactory::create(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_create_rejects_invalid_custom_endpoint() {
        let config = BackendConfig::custom("not a url".to_string(), None);
        assert!(matches!(
            BackendFactory::create(&config),
            Err(Error::Config(_))
        ));
    }

    /// Exercises every `from_env` branch in one sequential test. No other
    /// test reads these variables, so set-and-restore cannot race.
    #[test]
    fn test_from_env_backend_selection() {
        const KEYS: [&str; 6] = [
            "COMMIT_LLM_BACKEND",
            "COMMIT_LLM_MODEL",
            "COMMIT_LLM_ENDPOINT",
            "COMMIT_LLM_API_KEY",
            "OPENAI_API_KEY",
            "OLLAMA_HOST",
        ];
        let saved: Vec<(&str, Option<String>)> =
            KEYS.iter().map(|key| (*key, env::var(key).ok())).collect();
        for key in KEYS {
            env::remove_var(key);
        }

        // Nothing set: the local backend with its default address.
        let config = BackendConfig::from_env().unwrap();
        assert!(matches!(config.backend_type, BackendType::Ollama));
        assert_eq!(config.endpoint, None);
        assert_eq!(config.model, "");

        // Credential sniffing: a non-empty hosted key selects the hosted
        // backend, and the model variable flows through.
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("COMMIT_LLM_MODEL", "gpt-4o");
        let config = BackendConfig::from_env().unwrap();
        assert!(matches!(config.backend_type, BackendType::OpenAI));
        assert_eq!(config.api_key, Some("sk-test".to_string()));
        assert_eq!(config.model, "gpt-4o");

        // A set-but-empty key falls through to the local backend, picking
        // up any host override.
        env::set_var("OPENAI_API_KEY", "");
        env::set_var("OLLAMA_HOST", "http://10.0.0.5:11434");
        let config = BackendConfig::from_env().unwrap();
        assert!(matches!(config.backend_type, BackendType::Ollama));
        assert_eq!(config.endpoint, Some("http://10.0.0.5:11434".to_string()));

        // An explicit selector beats sniffing and is case-insensitive.
        env::set_var("COMMIT_LLM_BACKEND", "OLLAMA");
        env::set_var("OPENAI_API_KEY", "sk-test");
        let config = BackendConfig::from_env().unwrap();
        assert!(matches!(config.backend_type, BackendType::Ollama));
        assert_eq!(config.endpoint, Some("http://10.0.0.5:11434".to_string()));

        // Explicit openai requires the key variable to exist but accepts it
        // empty; the empty key is only rejected later, by `create`.
        env::set_var("COMMIT_LLM_BACKEND", "openai");
        env::remove_var("OPENAI_API_KEY");
        assert!(matches!(
            BackendConfig::from_env(),
            Err(Error::Config(_))
        ));
        env::set_var("OPENAI_API_KEY", "");
        let config = BackendConfig::from_env().unwrap();
        assert!(matches!(config.backend_type, BackendType::OpenAI));
        assert_eq!(config.api_key, Some(String::new()));
        assert!(matches!(
            BackendFactory::create(&config),
            Err(Error::Config(_))
        ));

        // Explicit custom requires the endpoint and forwards the key.
        env::set_var("COMMIT_LLM_BACKEND", "custom");
        assert!(matches!(
            BackendConfig::from_env(),
            Err(Error::Config(_))
        ));
        env::set_var("COMMIT_LLM_ENDPOINT", "http://localhost:9000/generate");
        env::set_var("COMMIT_LLM_API_KEY", "secret");
        let config = BackendConfig::from_env().unwrap();
        assert!(matches!(config.backend_type, BackendType::Custom));
        assert_eq!(
            config.endpoint,
            Some("http://localhost:9000/generate".to_string())
        );
        assert_eq!(config.api_key, Some("secret".to_string()));

        // An unknown selector names itself in the error.
        env::set_var("COMMIT_LLM_BACKEND", "gemini");
        let err = BackendConfig::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("gemini"));

        for (key, value) in saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

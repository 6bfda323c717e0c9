//! Text-generation providers.
//!
//! Each provider module owns its wire types; [`GenerationClient`] is the one
//! request/response boundary the rest of the crate talks to.

pub mod claude;
pub mod gemini;
pub mod ollama;
pub mod openai;

use std::time::Duration;

use anyhow::{anyhow, Result};

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use crate::config::Config;
use crate::provider::Provider;

/// Upper bound for model discovery; listing is a quick metadata call.
pub const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub enum GenerationClient {
    Gemini(GeminiClient),
    Ollama(OllamaClient),
    Claude(ClaudeClient),
    OpenAI(OpenAIClient),
}

impl GenerationClient {
    /// Builds the client for `provider`, failing when it needs a key and none is configured.
    pub fn from_config(provider: Provider, config: &Config) -> Result<Self> {
        let key = || config.api_key(provider).ok_or_else(|| missing_key(provider));

        Ok(match provider {
            Provider::Ollama => GenerationClient::Ollama(OllamaClient::new(&config.ollama_url())),
            Provider::Gemini => {
                let client = GeminiClient::new(&key()?);
                GenerationClient::Gemini(match config.gemini_base_url.as_deref() {
                    Some(url) => client.with_base_url(url),
                    None => client,
                })
            }
            Provider::Claude => GenerationClient::Claude(ClaudeClient::new(&key()?)),
            Provider::OpenAI => {
                let client = OpenAIClient::new(&key()?);
                GenerationClient::OpenAI(match config.openai_base_url.as_deref() {
                    Some(url) => client.with_base_url(url),
                    None => client,
                })
            }
        })
    }

    pub fn provider(&self) -> Provider {
        match self {
            GenerationClient::Gemini(_) => Provider::Gemini,
            GenerationClient::Ollama(_) => Provider::Ollama,
            GenerationClient::Claude(_) => Provider::Claude,
            GenerationClient::OpenAI(_) => Provider::OpenAI,
        }
    }

    /// Issues one generation request and returns the raw response text.
    pub async fn generate(&self, model: &str, prompt: &str, timeout: Duration) -> Result<String> {
        match self {
            GenerationClient::Gemini(c) => c.query(model, prompt, timeout).await,
            GenerationClient::Ollama(c) => c.query(model, prompt, timeout).await,
            GenerationClient::Claude(c) => c.query(model, prompt, timeout).await,
            GenerationClient::OpenAI(c) => c.query(model, prompt, timeout).await,
        }
    }

    pub async fn list_models(&self, timeout: Duration) -> Result<Vec<String>> {
        match self {
            GenerationClient::Ollama(c) => c.list_models(timeout).await,
            other => Ok(static_models(other.provider())),
        }
    }
}

fn missing_key(provider: Provider) -> anyhow::Error {
    anyhow!(
        "{} API key not configured. Set {} or add it to {}",
        provider.display_name(),
        provider.api_key_env().unwrap_or_default(),
        Config::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "the config file".to_string())
    )
}

/// Models offered for hosted providers. Ollama models are discovered at runtime.
pub fn static_models(provider: Provider) -> Vec<String> {
    match provider {
        Provider::Gemini => GeminiClient::list_models(),
        Provider::Claude => ClaudeClient::list_models(),
        Provider::OpenAI => OpenAIClient::list_models(),
        Provider::Ollama => Vec::new(),
    }
}

pub fn default_model(provider: Provider) -> String {
    static_models(provider)
        .into_iter()
        .next()
        .unwrap_or_else(|| "qwen2.5-coder:latest".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_needs_no_key() {
        let client = GenerationClient::from_config(Provider::Ollama, &Config::new()).unwrap();
        assert_eq!(client.provider(), Provider::Ollama);
    }

    #[test]
    fn test_stored_key_builds_client() {
        let mut config = Config::new();
        config.set_api_key(Provider::OpenAI, "sk-stored");
        config.openai_base_url = Some("http://localhost:1234/v1".to_string());
        let client = GenerationClient::from_config(Provider::OpenAI, &config).unwrap();
        assert_eq!(client.provider(), Provider::OpenAI);
    }

    #[test]
    fn test_default_models() {
        assert_eq!(default_model(Provider::Gemini), "gemini-2.5-flash");
        assert_eq!(default_model(Provider::Ollama), "qwen2.5-coder:latest");
    }

    #[tokio::test]
    async fn test_hosted_models_are_static() {
        let mut config = Config::new();
        config.set_api_key(Provider::Claude, "k");
        let client = GenerationClient::from_config(Provider::Claude, &config).unwrap();
        assert_eq!(
            client.list_models(LIST_MODELS_TIMEOUT).await.unwrap(),
            ClaudeClient::list_models()
        );
    }

    #[test]
    fn test_gemini_base_url_from_config() {
        let mut config = Config::new();
        config.set_api_key(Provider::Gemini, "g-key");
        config.gemini_base_url = Some("http://localhost:8089/v1beta/".to_string());
        match GenerationClient::from_config(Provider::Gemini, &config).unwrap() {
            GenerationClient::Gemini(client) => {
                assert_eq!(client.base_url, "http://localhost:8089/v1beta")
            }
            _ => panic!("expected a Gemini client"),
        }
    }
}

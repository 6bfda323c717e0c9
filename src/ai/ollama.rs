use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn query(&self, model: &str, prompt: &str, timeout: Duration) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama request failed with status: {}. Make sure Ollama is running with: ollama serve",
                response.status()
            ));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.response)
    }

    pub async fn list_models(&self, timeout: Duration) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| anyhow!("Cannot list Ollama models at {}: {}", self.base_url, e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to list models: {}", response.status()));
        }

        let models_response: OllamaModelsResponse = response.json().await?;
        Ok(model_names(models_response))
    }
}

fn model_names(response: OllamaModelsResponse) -> Vec<String> {
    response.models.into_iter().map(|model| model.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_disables_streaming() {
        let request = OllamaRequest {
            model: "qwen2.5-coder".to_string(),
            prompt: "p".to_string(),
            stream: false,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["model"], "qwen2.5-coder");
    }

    #[test]
    fn test_model_names_from_tags() {
        let json = r#"{"models":[{"name":"llama3.2:latest","size":1},{"name":"qwen2.5-coder:7b"}]}"#;
        let response: OllamaModelsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(model_names(response), vec!["llama3.2:latest", "qwen2.5-coder:7b"]);
    }

    #[tokio::test]
    async fn test_list_models_gives_up_on_silent_server() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = OllamaClient::new(&format!("http://{}", addr));
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            client.list_models(Duration::from_millis(300)),
        )
        .await
        .expect("list_models should time out on its own");
        assert!(outcome.is_err());
    }

    #[test]
    fn test_generate_response_parses() {
        let json = r#"{"model":"m","response":"<div></div>","done":true}"#;
        let response: OllamaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.response, "<div></div>");
    }
}

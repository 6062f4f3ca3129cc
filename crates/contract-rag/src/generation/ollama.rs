//! Ollama HTTP client for embeddings and completions, with retry logic

use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::llm::{CompletionOptions, TextStream};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Base URL, e.g. http://localhost:11434
    base_url: String,
    /// Maximum retries
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Ollama request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm("Unknown error")))
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        self.retry_request(|| {
            let client = self.client.clone();
            let url = url.clone();
            let request = EmbedRequest {
                model: model.to_string(),
                prompt: text.to_string(),
            };

            async move {
                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::indexing(format!("Embedding request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::indexing(format!(
                        "Embedding failed: HTTP {}",
                        response.status()
                    )));
                }

                let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                    Error::indexing(format!("Failed to parse embedding response: {}", e))
                })?;

                Ok(embed_response.embedding)
            }
        })
        .await
    }

    /// Single-shot completion with retry
    pub async fn generate(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        tracing::debug!("Generating with model {} (json_mode: {})", model, options.json_mode);

        self.retry_request(|| {
            let client = self.client.clone();
            let url = url.clone();
            let request = GenerateRequest {
                model: model.to_string(),
                system: system.to_string(),
                prompt: prompt.to_string(),
                stream: false,
                format: options.json_mode.then_some("json"),
                options: GenerateOptions {
                    temperature: options.temperature,
                },
            };

            async move {
                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::llm(format!(
                        "Generation failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                    Error::llm(format!("Failed to parse generation response: {}", e))
                })?;

                Ok(generate_response.response)
            }
        })
        .await
    }

    /// Streaming completion. Fragments are yielded as Ollama emits them;
    /// dropping the stream closes the connection.
    pub async fn generate_stream(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<TextStream> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: model.to_string(),
            system: system.to_string(),
            prompt: prompt.to_string(),
            stream: true,
            format: options.json_mode.then_some("json"),
            options: GenerateOptions {
                temperature: options.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Stream request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::llm(format!(
                "Stream failed: HTTP {}",
                response.status()
            )));
        }

        let stream = response
            .bytes_stream()
            .scan(Vec::<u8>::new(), |buffer, chunk| {
                let fragments = match chunk {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);
                        drain_ndjson_fragments(buffer)
                    }
                    Err(e) => vec![Err(Error::llm(format!("Stream error: {}", e)))],
                };
                futures::future::ready(Some(futures::stream::iter(fragments)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }
}

/// Pop every complete NDJSON line from `buffer` and return its text fragment.
/// A trailing partial line stays buffered until more bytes arrive.
fn drain_ndjson_fragments(buffer: &mut Vec<u8>) -> Vec<Result<String>> {
    let mut fragments = Vec::new();

    while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=newline).collect();
        let line = String::from_utf8_lossy(&line);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<StreamChunk>(line) {
            Ok(chunk) if !chunk.response.is_empty() => fragments.push(Ok(chunk.response)),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping malformed stream line: {}", e),
        }
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndjson_split_across_chunks() {
        let mut buffer = Vec::new();

        buffer.extend_from_slice(b"{\"response\":\"Hel\",\"done\":false}\n{\"respo");
        let first: Vec<String> = drain_ndjson_fragments(&mut buffer)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(first, vec!["Hel".to_string()]);

        buffer.extend_from_slice("nse\":\"lo ✓\",\"done\":false}\n{\"response\":\"\",\"done\":true}\n".as_bytes());
        let second: Vec<String> = drain_ndjson_fragments(&mut buffer)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(second, vec!["lo ✓".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = LlmConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..LlmConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }
}

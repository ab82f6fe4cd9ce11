use crate::error::ExtractError;
use crate::extractors::{decode_graph_response, prompt, retry_backoff, DEFAULT_MAX_RETRIES};
use crate::graph::KnowledgeGraph;
use crate::models::ExtractionRequest;
use crate::traits::GraphExtractor;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub struct OllamaExtractor {
    client: Client,
    endpoint: Url,
    model: String,
    max_retries: u32,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaExtractor {
    pub fn new(endpoint: impl AsRef<str>, model: impl Into<String>) -> Result<Self, ExtractError> {
        let endpoint = Url::parse(endpoint.as_ref())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_payload(&self, request: &ExtractionRequest) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt::compose_prompt(&request.segment_text, &request.ontology_description),
            stream: false,
            format: "json",
        }
    }

    async fn request_completion(&self, request: &ExtractionRequest) -> Result<String, ExtractError> {
        let url = format!(
            "{}/api/generate",
            self.endpoint.as_str().trim_end_matches('/')
        );
        let payload = self.build_payload(request);
        let mut attempt = 0u32;

        loop {
            let sent = self.client.post(&url).json(&payload).send().await;

            match sent {
                Ok(response) if response.status().is_success() => {
                    let completion: GenerateResponse = response.json().await?;
                    if completion.response.trim().is_empty() {
                        return Err(ExtractError::EmptyCompletion {
                            model: self.model.clone(),
                        });
                    }
                    return Ok(completion.response);
                }
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(ExtractError::ModelNotAvailable {
                            model: self.model.clone(),
                        });
                    }
                    if attempt >= self.max_retries || !status.is_server_error() {
                        return Err(ExtractError::Backend {
                            backend: "ollama".to_string(),
                            status: status.to_string(),
                        });
                    }
                }
                Err(error) => {
                    if attempt >= self.max_retries {
                        return Err(ExtractError::Http(error));
                    }
                }
            }

            attempt += 1;
            tokio::time::sleep(retry_backoff(attempt)).await;
        }
    }
}

#[async_trait]
impl GraphExtractor for OllamaExtractor {
    async fn extract_graph(
        &self,
        request: &ExtractionRequest,
    ) -> Result<KnowledgeGraph, ExtractError> {
        let completion = self.request_completion(request).await?;
        decode_graph_response(&completion)
    }
}

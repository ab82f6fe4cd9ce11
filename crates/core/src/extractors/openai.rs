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

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

const REQUEST_TIMEOUT_SECS: u64 = 30;
// Low temperature keeps the structured output stable across retries.
const EXTRACTION_TEMPERATURE: f32 = 0.1;

#[derive(Debug)]
pub struct OpenAiExtractor {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    max_retries: u32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiExtractor {
    pub fn new(
        endpoint: impl AsRef<str>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ExtractError> {
        let endpoint = Url::parse(endpoint.as_ref())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
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

    fn build_payload(&self, request: &ExtractionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            temperature: EXTRACTION_TEMPERATURE,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt::system_instructions(&request.ontology_description),
                },
                ChatMessage {
                    role: "user",
                    content: request.segment_text.clone(),
                },
            ],
        }
    }

    async fn request_completion(&self, request: &ExtractionRequest) -> Result<String, ExtractError> {
        let url = format!(
            "{}/chat/completions",
            self.endpoint.as_str().trim_end_matches('/')
        );
        let payload = self.build_payload(request);
        let mut attempt = 0u32;

        loop {
            let sent = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await;

            match sent {
                Ok(response) if response.status().is_success() => {
                    let completion: ChatCompletionResponse = response.json().await?;
                    let content = completion
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.message.content)
                        .unwrap_or_default();

                    if content.trim().is_empty() {
                        return Err(ExtractError::EmptyCompletion {
                            model: self.model.clone(),
                        });
                    }
                    return Ok(content);
                }
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(ExtractError::ModelNotAvailable {
                            model: self.model.clone(),
                        });
                    }
                    if attempt >= self.max_retries || !is_retryable(status) {
                        return Err(ExtractError::Backend {
                            backend: "openai".to_string(),
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

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl GraphExtractor for OpenAiExtractor {
    async fn extract_graph(
        &self,
        request: &ExtractionRequest,
    ) -> Result<KnowledgeGraph, ExtractError> {
        let completion = self.request_completion(request).await?;
        decode_graph_response(&completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_backend() {
        let extractor =
            OpenAiExtractor::new(DEFAULT_OPENAI_ENDPOINT, "key", DEFAULT_OPENAI_MODEL).unwrap();
        assert_eq!(extractor.model(), "gpt-4o");
        assert_eq!(extractor.max_retries, 2);
    }

    #[test]
    fn invalid_endpoint_is_rejected_at_construction() {
        let error = OpenAiExtractor::new("not a url", "key", "gpt-4o").unwrap_err();
        assert!(matches!(error, ExtractError::Url(_)));
    }

    #[test]
    fn retry_budget_is_configurable() {
        let extractor = OpenAiExtractor::new(DEFAULT_OPENAI_ENDPOINT, "key", "gpt-4o")
            .unwrap()
            .with_max_retries(0);
        assert_eq!(extractor.max_retries, 0);
    }

    #[test]
    fn payload_requests_structured_json_output() {
        let extractor =
            OpenAiExtractor::new(DEFAULT_OPENAI_ENDPOINT, "key", DEFAULT_OPENAI_MODEL).unwrap();
        let request = ExtractionRequest::new("Singapore is in Asia.", "places only");

        let payload = serde_json::to_value(extractor.build_payload(&request)).unwrap();

        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["response_format"]["type"], "json_object");
        let temperature = payload["temperature"].as_f64().unwrap();
        assert!((temperature - 0.1).abs() < 1e-6);

        assert_eq!(payload["messages"][0]["role"], "system");
        let system = payload["messages"][0]["content"].as_str().unwrap();
        assert!(system.contains("places only"));

        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][1]["content"], "Singapore is in Asia.");
    }

    #[test]
    fn retry_classification_covers_throttling_and_server_errors() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }
}

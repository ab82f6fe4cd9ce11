use crate::error::ExtractError;
use crate::graph::KnowledgeGraph;
use std::time::Duration;

mod ollama;
mod openai;
pub mod prompt;

pub use ollama::{OllamaExtractor, DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL};
pub use openai::{OpenAiExtractor, DEFAULT_OPENAI_ENDPOINT, DEFAULT_OPENAI_MODEL};

pub const DEFAULT_MAX_RETRIES: u32 = 2;

// Exponential backoff capped at 64 seconds; the cap also keeps the shift
// in range for arbitrary retry budgets.
pub(crate) fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.saturating_sub(1).min(6))
}

pub fn decode_graph_response(completion: &str) -> Result<KnowledgeGraph, ExtractError> {
    let body = strip_code_fence(completion);
    serde_json::from_str(body).map_err(|error| ExtractError::Decode(error.to_string()))
}

fn strip_code_fence(completion: &str) -> &str {
    let trimmed = completion.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => return trimmed,
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_GRAPH: &str = r#"{"entities": [{"name": "Singapore"}, {"name": "Asia"}], "relationships": [{"source": "Singapore", "target": "Asia", "relation": "located_in"}]}"#;

    #[test]
    fn plain_json_decodes() {
        let graph = decode_graph_response(PLAIN_GRAPH).unwrap();
        assert_eq!(graph.entities.len(), 2);
        assert_eq!(graph.relationships[0].relation, "located_in");
    }

    #[test]
    fn fenced_json_decodes() {
        let fenced = format!("```json\n{PLAIN_GRAPH}\n```");
        let graph = decode_graph_response(&fenced).unwrap();
        assert_eq!(graph.entities.len(), 2);
    }

    #[test]
    fn fence_without_info_string_decodes() {
        let fenced = format!("```\n{PLAIN_GRAPH}\n```");
        assert!(decode_graph_response(&fenced).is_ok());
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let padded = format!("\n\n  {PLAIN_GRAPH}  \n");
        assert!(decode_graph_response(&padded).is_ok());
    }

    #[test]
    fn prose_is_rejected_as_decode_failure() {
        let error = decode_graph_response("Here are the entities I found: Singapore.").unwrap_err();
        assert!(matches!(error, ExtractError::Decode(_)));
    }

    #[test]
    fn wrong_shape_is_rejected_as_decode_failure() {
        let error = decode_graph_response(r#"{"entities": "Singapore"}"#).unwrap_err();
        assert!(matches!(error, ExtractError::Decode(_)));
    }

    #[test]
    fn empty_object_is_rejected_as_decode_failure() {
        let error = decode_graph_response("{}").unwrap_err();
        assert!(matches!(error, ExtractError::Decode(ref detail) if detail.contains("entities")));

        let error = decode_graph_response(r#"{"entities": []}"#).unwrap_err();
        assert!(
            matches!(error, ExtractError::Decode(ref detail) if detail.contains("relationships"))
        );
    }

    #[test]
    fn retry_backoff_grows_then_caps() {
        assert_eq!(retry_backoff(1), Duration::from_secs(1));
        assert_eq!(retry_backoff(2), Duration::from_secs(2));
        assert_eq!(retry_backoff(3), Duration::from_secs(4));
        assert_eq!(retry_backoff(7), Duration::from_secs(64));
        assert_eq!(retry_backoff(100), Duration::from_secs(64));
    }

    #[test]
    fn foreign_property_type_is_rejected_as_decode_failure() {
        let completion = r#"{"entities": [{"name": "X", "properties": [{"key": "k", "value": {"nested": 1}}]}], "relationships": []}"#;
        let error = decode_graph_response(completion).unwrap_err();
        assert!(matches!(error, ExtractError::Decode(ref detail) if detail.contains("object")));
    }
}

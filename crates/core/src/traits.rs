use crate::error::ExtractError;
use crate::graph::KnowledgeGraph;
use crate::models::ExtractionRequest;
use async_trait::async_trait;

// One request for one text segment yields one candidate graph or one
// failure. Implementations own their prompting, transport, and retries.
#[async_trait]
pub trait GraphExtractor {
    async fn extract_graph(
        &self,
        request: &ExtractionRequest,
    ) -> Result<KnowledgeGraph, ExtractError>;
}

#[async_trait]
impl<E> GraphExtractor for Box<E>
where
    E: GraphExtractor + ?Sized + Send + Sync,
{
    async fn extract_graph(
        &self,
        request: &ExtractionRequest,
    ) -> Result<KnowledgeGraph, ExtractError> {
        (**self).extract_graph(request).await
    }
}

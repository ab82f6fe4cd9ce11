use crate::chunking::{ChunkingConfig, TextChunker};
use crate::error::{ChunkError, PipelineError, Result};
use crate::graph::KnowledgeGraph;
use crate::models::ExtractionRequest;
use crate::traits::GraphExtractor;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug)]
pub struct ChunkGraph {
    pub ordinal: usize,
    pub graph: KnowledgeGraph,
}

#[derive(Debug)]
pub struct ChunkFailure {
    pub ordinal: usize,
    pub error: PipelineError,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub chunk_count: usize,
    pub graphs: Vec<ChunkGraph>,
    pub failures: Vec<ChunkFailure>,
}

impl PipelineReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct GraphPipeline<E>
where
    E: GraphExtractor,
{
    chunker: TextChunker,
    extractor: E,
}

impl<E> GraphPipeline<E>
where
    E: GraphExtractor + Send + Sync,
{
    pub fn new(config: ChunkingConfig, extractor: E) -> Result<Self, ChunkError> {
        Ok(Self {
            chunker: TextChunker::new(config)?,
            extractor,
        })
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    // No graph leaves the pipeline unvalidated.
    pub async fn extract_segment(
        &self,
        segment_text: &str,
        ontology_description: &str,
    ) -> Result<KnowledgeGraph> {
        let request = ExtractionRequest::new(segment_text, ontology_description);
        let graph = self.extractor.extract_graph(&request).await?;
        graph.validate()?;
        Ok(graph)
    }

    // Best effort per chunk: a failing chunk lands in the report while the
    // remaining chunks are still processed.
    pub async fn run(
        &self,
        document: &str,
        ontology_description: &str,
    ) -> Result<PipelineReport, ChunkError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let chunks = self.chunker.chunk(document)?;

        let mut graphs = Vec::new();
        let mut failures = Vec::new();

        for chunk in &chunks {
            match self.extract_segment(&chunk.text, ontology_description).await {
                Ok(graph) => graphs.push(ChunkGraph {
                    ordinal: chunk.ordinal,
                    graph,
                }),
                Err(error) => failures.push(ChunkFailure {
                    ordinal: chunk.ordinal,
                    error,
                }),
            }
        }

        Ok(PipelineReport {
            run_id,
            started_at,
            chunk_count: chunks.len(),
            graphs,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::graph::{Entity, Relationship};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const TWO_PARAGRAPHS: &str =
        "first paragraph about alpha\n\nsecond paragraph about ghost";

    fn small_config() -> ChunkingConfig {
        ChunkingConfig {
            max_chars: 30,
            overlap_chars: 0,
        }
    }

    fn valid_graph() -> KnowledgeGraph {
        KnowledgeGraph {
            entities: vec![Entity::new("Singapore"), Entity::new("Asia")],
            relationships: vec![Relationship::new("Singapore", "Asia", "located_in")],
        }
    }

    fn dangling_graph() -> KnowledgeGraph {
        KnowledgeGraph {
            entities: vec![Entity::new("Singapore")],
            relationships: vec![Relationship::new("Singapore", "Ghost", "haunted_by")],
        }
    }

    struct FixedExtractor {
        graph: KnowledgeGraph,
    }

    #[async_trait]
    impl GraphExtractor for FixedExtractor {
        async fn extract_graph(
            &self,
            _request: &ExtractionRequest,
        ) -> Result<KnowledgeGraph, ExtractError> {
            Ok(self.graph.clone())
        }
    }

    struct RecordingExtractor {
        requests: Mutex<Vec<ExtractionRequest>>,
    }

    #[async_trait]
    impl GraphExtractor for RecordingExtractor {
        async fn extract_graph(
            &self,
            request: &ExtractionRequest,
        ) -> Result<KnowledgeGraph, ExtractError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(valid_graph())
        }
    }

    // Returns a dangling graph for segments mentioning "ghost" and a valid
    // one for everything else.
    struct HauntedExtractor;

    #[async_trait]
    impl GraphExtractor for HauntedExtractor {
        async fn extract_graph(
            &self,
            request: &ExtractionRequest,
        ) -> Result<KnowledgeGraph, ExtractError> {
            if request.segment_text.contains("ghost") {
                Ok(dangling_graph())
            } else {
                Ok(valid_graph())
            }
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl GraphExtractor for FailingExtractor {
        async fn extract_graph(
            &self,
            _request: &ExtractionRequest,
        ) -> Result<KnowledgeGraph, ExtractError> {
            Err(ExtractError::EmptyCompletion {
                model: "fake".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn every_chunk_yields_a_validated_graph() {
        let pipeline = GraphPipeline::new(
            small_config(),
            FixedExtractor {
                graph: valid_graph(),
            },
        )
        .unwrap();

        let report = pipeline.run(TWO_PARAGRAPHS, "").await.unwrap();

        assert_eq!(report.chunk_count, 2);
        assert_eq!(report.graphs.len(), 2);
        assert!(report.failures.is_empty());
        assert!(report.is_complete());
        assert_eq!(
            report
                .graphs
                .iter()
                .map(|chunk_graph| chunk_graph.ordinal)
                .collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[tokio::test]
    async fn requests_carry_chunk_text_and_ontology_verbatim() {
        let pipeline = GraphPipeline::new(
            small_config(),
            RecordingExtractor {
                requests: Mutex::new(Vec::new()),
            },
        )
        .unwrap();

        let ontology = "Person, Place, located_in";
        pipeline.run(TWO_PARAGRAPHS, ontology).await.unwrap();

        let chunks = pipeline.chunker().chunk(TWO_PARAGRAPHS).unwrap();
        let requests = pipeline.extractor.requests.lock().unwrap();

        assert_eq!(requests.len(), chunks.len());
        for (request, chunk) in requests.iter().zip(&chunks) {
            assert_eq!(request.segment_text, chunk.text);
            assert_eq!(request.ontology_description, ontology);
        }
    }

    #[tokio::test]
    async fn an_invalid_graph_fails_only_its_own_chunk() {
        let pipeline = GraphPipeline::new(small_config(), HauntedExtractor).unwrap();

        let report = pipeline.run(TWO_PARAGRAPHS, "").await.unwrap();

        assert_eq!(report.chunk_count, 2);
        assert_eq!(report.graphs.len(), 1);
        assert_eq!(report.graphs[0].ordinal, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ordinal, 1);
        assert_eq!(report.failures[0].error.stage(), "validation");
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn extraction_failures_are_reported_with_their_stage() {
        let pipeline = GraphPipeline::new(small_config(), FailingExtractor).unwrap();

        let report = pipeline.run(TWO_PARAGRAPHS, "").await.unwrap();

        assert!(report.graphs.is_empty());
        assert_eq!(report.failures.len(), 2);
        for failure in &report.failures {
            assert_eq!(failure.error.stage(), "extraction");
        }
    }

    #[tokio::test]
    async fn extract_segment_rejects_invalid_graphs() {
        let pipeline = GraphPipeline::new(
            small_config(),
            FixedExtractor {
                graph: dangling_graph(),
            },
        )
        .unwrap();

        let error = pipeline.extract_segment("some text", "").await.unwrap_err();
        assert_eq!(error.stage(), "validation");
    }

    #[tokio::test]
    async fn an_empty_document_produces_an_empty_report() {
        let pipeline = GraphPipeline::new(
            small_config(),
            FixedExtractor {
                graph: valid_graph(),
            },
        )
        .unwrap();

        let report = pipeline.run("", "").await.unwrap();

        assert_eq!(report.chunk_count, 0);
        assert!(report.graphs.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn an_invalid_config_is_rejected_at_construction() {
        let result = GraphPipeline::new(
            ChunkingConfig {
                max_chars: 10,
                overlap_chars: 10,
            },
            FailingExtractor,
        );

        assert!(matches!(result, Err(ChunkError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn boxed_extractors_work_through_the_blanket_impl() {
        let extractor: Box<dyn GraphExtractor + Send + Sync> = Box::new(FixedExtractor {
            graph: valid_graph(),
        });
        let pipeline = GraphPipeline::new(small_config(), extractor).unwrap();

        let report = pipeline.run(TWO_PARAGRAPHS, "").await.unwrap();
        assert_eq!(report.graphs.len(), 2);
    }
}

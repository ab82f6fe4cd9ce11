pub mod chunking;
pub mod error;
pub mod extractors;
pub mod graph;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod traits;

pub use chunking::{ChunkingConfig, TextChunker, DEFAULT_MAX_CHARS, DEFAULT_OVERLAP_CHARS};
pub use error::{ChunkError, ExtractError, IngestError, PipelineError, SchemaError};
pub use extractors::{
    decode_graph_response, OllamaExtractor, OpenAiExtractor, DEFAULT_MAX_RETRIES,
    DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL, DEFAULT_OPENAI_ENDPOINT, DEFAULT_OPENAI_MODEL,
};
pub use graph::{Entity, KnowledgeGraph, Property, PropertyValue, Relationship};
pub use ingest::{discover_text_documents, load_document, read_document, resolve_documents};
pub use models::{Chunk, DocumentFingerprint, ExtractionRequest};
pub use pipeline::{ChunkFailure, ChunkGraph, GraphPipeline, PipelineReport};
pub use traits::GraphExtractor;

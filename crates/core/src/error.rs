use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("invalid chunking config: {0}")]
    InvalidConfig(String),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("chunking invariant violated: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("entity at index {index} has an empty name")]
    EmptyEntityName { index: usize },

    #[error("duplicate entity name: {name:?}")]
    DuplicateEntity { name: String },

    #[error("property on {owner} has an empty key")]
    EmptyPropertyKey { owner: String },

    #[error("relationship from {source_name:?} to {target_name:?} has an empty relation label")]
    EmptyRelation {
        source_name: String,
        target_name: String,
    },

    #[error("relationship {relation:?} references unknown source entity {name:?}")]
    UnknownSource { relation: String, name: String },

    #[error("relationship {relation:?} references unknown target entity {name:?}")]
    UnknownTarget { relation: String, name: String },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("extraction backend {backend} returned {status}")]
    Backend { backend: String, status: String },

    #[error("model {model:?} is not available on the extraction backend")]
    ModelNotAvailable { model: String },

    #[error("model {model:?} returned an empty completion")]
    EmptyCompletion { model: String },

    #[error("response is not a knowledge graph: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("no text documents found in {0}")]
    NoDocuments(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("chunking failed: {0}")]
    Chunking(#[from] ChunkError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("schema validation failed: {0}")]
    Validation(#[from] SchemaError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Chunking(_) => "chunking",
            PipelineError::Extraction(_) => "extraction",
            PipelineError::Validation(_) => "validation",
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub ordinal: usize,
    pub text: String,
    // Leading characters carried over from the previous chunk's tail.
    pub overlap: usize,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    // Concatenating fresh_text across a document's chunks reproduces the
    // document exactly.
    pub fn fresh_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((offset, _)) => &self.text[offset..],
            None => "",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub document_title: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub segment_text: String,
    pub ontology_description: String,
}

impl ExtractionRequest {
    pub fn new(
        segment_text: impl Into<String>,
        ontology_description: impl Into<String>,
    ) -> Self {
        Self {
            segment_text: segment_text.into(),
            ontology_description: ontology_description.into(),
        }
    }
}

use crate::error::IngestError;
use crate::models::DocumentFingerprint;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

pub fn discover_text_documents(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_text = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                TEXT_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });

        if is_text {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

// A file stands for itself, a folder for every text document under it.
pub fn resolve_documents(path: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let files = discover_text_documents(path);
    if files.is_empty() {
        return Err(IngestError::NoDocuments(path.display().to_string()));
    }
    Ok(files)
}

pub fn read_document(path: &Path) -> Result<String, IngestError> {
    Ok(fs::read_to_string(path)?)
}

pub fn load_document(path: &Path) -> Result<(DocumentFingerprint, String), IngestError> {
    let content = read_document(path)?;
    let fingerprint = build_document_fingerprint(path, &content)?;
    Ok((fingerprint, content))
}

fn build_document_fingerprint(
    path: &Path,
    content: &str,
) -> Result<DocumentFingerprint, IngestError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(DocumentFingerprint {
        document_id: generate_document_id(path),
        document_title: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum: digest_content(content),
        ingested_at: Utc::now(),
    })
}

fn digest_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

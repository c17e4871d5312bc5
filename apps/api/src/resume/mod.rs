//! Résumé ingestion: uploaded PDFs → plain text used as prompt context.
//!
//! Each file is handled on its own; one bad file never sinks the others.

pub mod scratch;
#[cfg(test)]
pub mod testing;

use std::path::PathBuf;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use self::scratch::ScratchDir;

const PDF_SIGNATURE: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file is not a PDF document")]
    NotPdf,

    #[error("could not store upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("PDF extractor crashed on this document")]
    Crashed,

    #[error("PDF contains no extractable text")]
    NoText,
}

/// One file taken from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// Per-file result reported back to the user.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Text gathered from one upload request.
#[derive(Debug, Default)]
pub struct IngestResult {
    /// Joined text of every file that extracted cleanly, `None` if none did.
    pub text: Option<String>,
    pub source_files: Vec<String>,
    pub outcomes: Vec<FileOutcome>,
}

/// Extracts the text of a stored PDF, pages in document order.
///
/// Runs on the blocking pool; a panic inside the extractor is reported as
/// `ExtractError::Crashed` instead of tearing down the request.
pub async fn extract_pdf_text(path: PathBuf) -> Result<String, ExtractError> {
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text(&path).map_err(|e| e.to_string())
    })
    .await
    .map_err(|_| ExtractError::Crashed)?
    .map_err(ExtractError::Pdf)?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text.to_string())
}

async fn ingest_file(
    scratch: &ScratchDir,
    session_id: Uuid,
    file: &UploadedFile,
) -> Result<String, ExtractError> {
    if !file.data.starts_with(PDF_SIGNATURE) {
        return Err(ExtractError::NotPdf);
    }
    let path = scratch.store(session_id, &file.data).await?;
    extract_pdf_text(path).await
}

/// Stores and extracts every uploaded file, collecting per-file outcomes.
pub async fn ingest_uploads(
    scratch: &ScratchDir,
    session_id: Uuid,
    files: &[UploadedFile],
) -> IngestResult {
    let mut texts = Vec::new();
    let mut result = IngestResult::default();

    for file in files {
        match ingest_file(scratch, session_id, file).await {
            Ok(text) => {
                info!(
                    "Extracted {} characters from {} for session {session_id}",
                    text.len(),
                    file.file_name
                );
                result.outcomes.push(FileOutcome {
                    file_name: file.file_name.clone(),
                    ok: true,
                    characters: Some(text.chars().count()),
                    error: None,
                });
                result.source_files.push(file.file_name.clone());
                texts.push(text);
            }
            Err(e) => {
                warn!("Failed to process {} for session {session_id}: {e}", file.file_name);
                result.outcomes.push(FileOutcome {
                    file_name: file.file_name.clone(),
                    ok: false,
                    characters: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if !texts.is_empty() {
        result.text = Some(texts.join("\n\n"));
    }
    result
}

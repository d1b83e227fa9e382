//! Text Extractor: turns validated document bytes into normalized plain text.
//!
//! PDF parsing is CPU-bound and runs inside `tokio::task::spawn_blocking`.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytes::Bytes;

use crate::intake::error::IntakeError;

/// Converts raw document bytes into text. Errors only on malformed input;
/// a well-formed document without text yields an empty string.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<String>;
}

/// `pdf-extract` backed parser for `application/pdf` uploads.
pub struct PdfTextParser;

impl DocumentParser for PdfTextParser {
    fn parse(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| anyhow!("{e}"))
    }
}

/// Parses `bytes` on the blocking pool and normalizes the result.
/// A parser panic is reported as an extraction failure, not propagated.
pub async fn extract_text(
    parser: Arc<dyn DocumentParser>,
    bytes: Bytes,
) -> Result<String, IntakeError> {
    let parsed = tokio::task::spawn_blocking(move || parser.parse(&bytes)).await;

    match parsed {
        Ok(Ok(text)) => Ok(normalize_whitespace(&text)),
        Ok(Err(e)) => Err(unreadable(&e.to_string())),
        Err(join_error) => Err(unreadable(&join_error.to_string())),
    }
}

/// Collapses every whitespace run to a single space and trims both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unreadable(detail: &str) -> IntakeError {
    IntakeError::Extraction(format!(
        "The uploaded file could not be read as a PDF ({detail}). Try re-exporting it and uploading again."
    ))
}

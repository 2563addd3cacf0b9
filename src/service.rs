//! OCR and text-to-Markdown processing against an injected provider.
//!
//! Every path returns an [`OcrResult`]; provider and I/O errors are captured
//! here and never escape as `Err`.

use crate::document::{DocumentKind, ExtractInput, UploadedDocument};
use crate::error::ApiError;
use crate::markdown::combine_pages;
use crate::ocr::{DocumentSource, Message, OcrBackend, OcrOutput, SIGNED_URL_EXPIRY_HOURS};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{error, info};

const CONVERT_INSTRUCTION: &str = "Convert the following text to well-formatted markdown, \
preserving structure like headings, lists, and tables:";

/// Outcome of a processing request, serialized as the API response body.
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResult {
    pub fn ok(markdown: String, original_response: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            markdown: Some(markdown),
            original_response,
            error: None,
        }
    }

    pub fn failed(err: &anyhow::Error) -> Self {
        Self {
            success: false,
            markdown: None,
            original_response: None,
            error: Some(format!("{:#}", err)),
        }
    }

    /// Turn a failed result into a processing error for the HTTP layer.
    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.success {
            Ok(self)
        } else {
            Err(ApiError::Processing(
                self.error.unwrap_or_else(|| "Processing failed".to_string()),
            ))
        }
    }
}

/// Dispatches inputs to the provider and assembles the Markdown.
#[derive(Clone)]
pub struct OcrService {
    backend: Arc<dyn OcrBackend>,
    scratch_dir: PathBuf,
}

impl OcrService {
    pub fn new(backend: Arc<dyn OcrBackend>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub async fn process(&self, input: ExtractInput) -> OcrResult {
        match input {
            ExtractInput::File(doc, DocumentKind::Pdf) => self.process_pdf(&doc).await,
            ExtractInput::File(doc, DocumentKind::Image { mime }) => {
                self.process_image(&doc, mime).await
            }
            ExtractInput::Text(text) => self.process_text(&text).await,
        }
    }

    /// Upload the PDF, sign a URL for it, and OCR it by URL.
    pub async fn process_pdf(&self, doc: &UploadedDocument) -> OcrResult {
        info!("Processing PDF {} ({} bytes)", doc.filename, doc.size());
        file_result(&doc.filename, self.ocr_pdf(doc).await)
    }

    /// OCR an image passed inline as a base64 data URL.
    pub async fn process_image(&self, doc: &UploadedDocument, mime: &str) -> OcrResult {
        info!(
            "Processing image {} ({} bytes, {})",
            doc.filename,
            doc.size(),
            mime
        );
        file_result(&doc.filename, self.ocr_image(doc, mime).await)
    }

    /// Reformat raw text into Markdown with the chat model.
    pub async fn process_text(&self, text: &str) -> OcrResult {
        info!("Converting {} chars of text to markdown", text.len());
        let prompt = format!("{}\n\n{}", CONVERT_INSTRUCTION, text);

        match self.backend.chat(vec![Message::user_text(prompt)], 0.0).await {
            Ok(markdown) => OcrResult::ok(markdown, None),
            Err(e) => {
                error!("Text conversion failed: {:#}", e);
                OcrResult::failed(&e)
            }
        }
    }

    async fn ocr_pdf(&self, doc: &UploadedDocument) -> Result<OcrOutput> {
        let scratch = self.persist(&doc.data)?;
        let bytes = tokio::fs::read(scratch.path())
            .await
            .context("Failed to read temporary file")?;

        let uploaded = self.backend.upload_file(&doc.filename, &bytes).await?;
        let url = self
            .backend
            .signed_url(&uploaded.id, SIGNED_URL_EXPIRY_HOURS)
            .await?;

        self.backend
            .ocr(DocumentSource::DocumentUrl { document_url: url })
            .await
    }

    async fn ocr_image(&self, doc: &UploadedDocument, mime: &str) -> Result<OcrOutput> {
        let scratch = self.persist(&doc.data)?;
        let bytes = tokio::fs::read(scratch.path())
            .await
            .context("Failed to read temporary file")?;

        let data_url = format!("data:{};base64,{}", mime, BASE64.encode(&bytes));

        self.backend
            .ocr(DocumentSource::ImageUrl {
                image_url: data_url,
            })
            .await
    }

    /// Write bytes to a fresh temp file, removed when the handle drops.
    fn persist(&self, data: &[u8]) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("ocr-")
            .tempfile_in(&self.scratch_dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", self.scratch_dir))?;
        file.write_all(data)
            .context("Failed to write temporary file")?;
        file.flush()?;
        Ok(file)
    }
}

fn file_result(filename: &str, outcome: Result<OcrOutput>) -> OcrResult {
    match outcome {
        Ok(output) => {
            let markdown = combine_pages(&output.response.pages);
            info!(
                "OCR complete for {}: {} pages, {} chars",
                filename,
                output.response.pages.len(),
                markdown.len()
            );
            OcrResult::ok(markdown, Some(output.raw))
        }
        Err(e) => {
            error!("OCR failed for {}: {:#}", filename, e);
            OcrResult::failed(&e)
        }
    }
}

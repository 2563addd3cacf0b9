//! Request input model and dispatch by document kind.

use crate::error::ApiError;

/// A file received in a multipart request. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedDocument {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Declared content type, or the one guessed from the filename.
    pub fn effective_content_type(&self) -> Option<String> {
        self.content_type.clone().or_else(|| {
            mime_guess::from_path(&self.filename)
                .first_raw()
                .map(str::to_string)
        })
    }

    /// Decide which OCR path this file takes.
    pub fn kind(&self) -> Result<DocumentKind, ApiError> {
        let content_type = self.effective_content_type();
        let content_type = content_type.as_deref();
        let name = self.filename.to_lowercase();

        if content_type == Some("application/pdf") || name.ends_with(".pdf") {
            return Ok(DocumentKind::Pdf);
        }

        match content_type {
            Some("image/png") => return Ok(DocumentKind::Image { mime: "image/png" }),
            Some("image/jpeg") => return Ok(DocumentKind::Image { mime: "image/jpeg" }),
            _ => {}
        }

        if name.ends_with(".png") {
            Ok(DocumentKind::Image { mime: "image/png" })
        } else if name.ends_with(".jpg") || name.ends_with(".jpeg") {
            Ok(DocumentKind::Image { mime: "image/jpeg" })
        } else {
            Err(ApiError::UnsupportedMediaType)
        }
    }
}

/// The OCR path a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    /// `mime` is the type used in the data URL sent to the provider.
    Image { mime: &'static str },
}

/// What `/extract` was asked to process: exactly one of a file or text.
#[derive(Debug)]
pub enum ExtractInput {
    File(UploadedDocument, DocumentKind),
    Text(String),
}

impl ExtractInput {
    /// Resolve the optional form parts into one input, classifying files.
    pub fn from_parts(
        file: Option<UploadedDocument>,
        text: Option<String>,
    ) -> Result<Self, ApiError> {
        match (file, text) {
            (Some(file), None) => {
                let kind = file.kind()?;
                Ok(ExtractInput::File(file, kind))
            }
            (None, Some(text)) => Ok(ExtractInput::Text(text)),
            (None, None) => Err(ApiError::BadRequest(
                "Either file or text must be provided".to_string(),
            )),
            (Some(_), Some(_)) => Err(ApiError::BadRequest(
                "Provide either file or text, not both".to_string(),
            )),
        }
    }
}

//! Request body extractor for the `file` / `text` form fields.

use crate::document::UploadedDocument;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    async_trait,
    extract::{multipart::MultipartError, Form, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use std::collections::HashMap;
use tracing::debug;

/// Optional `file` and `text` fields from a multipart or urlencoded form.
#[derive(Debug, Default)]
pub struct FormInput {
    pub file: Option<UploadedDocument>,
    pub text: Option<String>,
}

#[async_trait]
impl FromRequest<AppState> for FormInput {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return Ok(FormInput {
                file: None,
                text: fields.get("text").cloned(),
            });
        }

        let max = state.settings.max_upload_size;
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let mut input = FormInput::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, max))?
                        .to_vec();

                    // Browsers send an empty, unnamed part for an untouched file input
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }

                    debug!("Received file part: {} ({} bytes)", filename, data.len());
                    input.file = Some(UploadedDocument {
                        filename,
                        content_type,
                        data,
                    });
                }
                Some("text") => {
                    input.text = Some(field.text().await.map_err(|e| multipart_error(e, max))?);
                }
                _ => {}
            }
        }

        Ok(input)
    }
}

fn multipart_error(err: MultipartError, max: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { max }
    } else {
        ApiError::BadRequest(format!("Multipart error: {}", err.body_text()))
    }
}

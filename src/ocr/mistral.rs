//! Mistral provider client (Files, OCR and Chat Completions APIs).

use super::{DocumentSource, Message, OcrBackend, OcrOutput, OcrResponse, UploadedFile};
use crate::config::Settings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Clone)]
pub struct MistralClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    ocr_model: String,
    chat_model: String,
}

impl MistralClient {
    pub fn new(client: reqwest::Client, settings: &Settings) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.api_url.clone(),
            ocr_model: settings.ocr_model.clone(),
            chat_model: settings.chat_model.clone(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("MISTRAL_API_KEY not set"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

// ── Mistral API request/response types ──────────────────────────────────────

#[derive(Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentSource,
    include_image_base64: bool,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Bail with the provider's status and body on a non-2xx response.
async fn check_status(resp: reqwest::Response, api: &str) -> Result<reqwest::Response> {
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("Mistral {} API error ({}): {}", api, status, text);
    }
    Ok(resp)
}

/// First non-empty choice content of a chat completion.
fn first_choice_content(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("Mistral chat response contained no content")
}

// ── Provider implementation ─────────────────────────────────────────────────

#[async_trait::async_trait]
impl OcrBackend for MistralClient {
    async fn upload_file(&self, filename: &str, data: &[u8]) -> Result<UploadedFile> {
        use reqwest::multipart::{Form, Part};

        info!(
            "MistralClient: uploading {} ({} bytes) to Files API",
            filename,
            data.len()
        );

        let part = Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;

        let form = Form::new().part("file", part).text("purpose", "ocr");

        let resp = self
            .client
            .post(self.url("files"))
            .bearer_auth(self.api_key()?)
            .multipart(form)
            .send()
            .await
            .context("Failed to send file to Mistral")?;

        let upload: UploadedFile = check_status(resp, "Files").await?.json().await?;
        info!(
            "MistralClient: uploaded {} as file_id={}",
            upload.filename.as_deref().unwrap_or(filename),
            upload.id
        );
        Ok(upload)
    }

    async fn signed_url(&self, file_id: &str, expiry_hours: u32) -> Result<String> {
        let resp = self
            .client
            .get(self.url(&format!("files/{}/url", file_id)))
            .query(&[("expiry", expiry_hours)])
            .bearer_auth(self.api_key()?)
            .send()
            .await
            .context("Failed to request signed URL from Mistral")?;

        let signed: SignedUrlResponse = check_status(resp, "Files").await?.json().await?;
        debug!("MistralClient: signed URL issued for file_id={}", file_id);
        Ok(signed.url)
    }

    async fn ocr(&self, document: DocumentSource) -> Result<OcrOutput> {
        let body = OcrRequest {
            model: &self.ocr_model,
            document,
            include_image_base64: true,
        };

        info!("MistralClient: calling OCR API (model={})", self.ocr_model);

        let resp = self
            .client
            .post(self.url("ocr"))
            .bearer_auth(self.api_key()?)
            .json(&body)
            .send()
            .await
            .context("Failed to send OCR request to Mistral")?;

        let raw_text = check_status(resp, "OCR").await?.text().await?;
        debug!("MistralClient: OCR response ({} bytes)", raw_text.len());

        let raw: serde_json::Value =
            serde_json::from_str(&raw_text).context("Failed to parse OCR response")?;
        let response: OcrResponse =
            serde_json::from_value(raw.clone()).context("Unexpected OCR response shape")?;

        info!("MistralClient: OCR returned {} pages", response.pages.len());
        Ok(OcrOutput { response, raw })
    }

    async fn chat(&self, messages: Vec<Message>, temperature: f32) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.chat_model,
            messages,
            temperature,
        };

        debug!("Sending chat request to Mistral: model={}", request.model);

        let resp = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(self.api_key()?)
            .json(&request)
            .send()
            .await
            .context("Failed to send chat request to Mistral")?;

        let response: ChatCompletionResponse = check_status(resp, "chat")
            .await?
            .json()
            .await
            .context("Failed to parse Mistral chat response")?;

        if let Some(usage) = &response.usage {
            info!(
                "Mistral chat response: {} tokens (prompt: {}, completion: {})",
                usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            );
        }

        first_choice_content(response)
    }
}

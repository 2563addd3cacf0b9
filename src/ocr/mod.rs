//! OCR/chat provider abstraction.
//!
//! Defines the [`OcrBackend`] trait and the wire types shared by the concrete
//! Mistral client and by test doubles. Handlers and the OCR service only ever
//! see `dyn OcrBackend`, injected through application state.

pub mod mistral;

use serde::{Deserialize, Serialize};

/// How long a signed retrieval URL stays valid, in hours.
pub const SIGNED_URL_EXPIRY_HOURS: u32 = 1;

/// An image embedded in an OCR page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrImage {
    pub id: String,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub top_left_x: Option<u32>,
    #[serde(default)]
    pub top_left_y: Option<u32>,
    #[serde(default)]
    pub bottom_right_x: Option<u32>,
    #[serde(default)]
    pub bottom_right_y: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDimensions {
    pub dpi: u32,
    pub height: u32,
    pub width: u32,
}

/// One page of OCR output (0-indexed, as the provider returns it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    pub index: u32,
    pub markdown: String,
    #[serde(default)]
    pub images: Vec<OcrImage>,
    #[serde(default)]
    pub dimensions: Option<PageDimensions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageInfo {
    pub pages_processed: u32,
    #[serde(default)]
    pub doc_size_bytes: Option<u64>,
}

/// Parsed OCR response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    pub pages: Vec<OcrPage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage_info: Option<UsageInfo>,
}

/// OCR response together with the exact JSON the provider sent.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub response: OcrResponse,
    pub raw: serde_json::Value,
}

/// Document reference handed to the OCR operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DocumentSource {
    #[serde(rename = "document_url")]
    DocumentUrl { document_url: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: String },
}

/// File object created by the provider's Files API.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

// ============================================================================
// Chat message types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
}

impl Message {
    /// A user message made of a single text chunk.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![ContentPart::Text { text: text.into() }]),
        }
    }
}

/// Async trait implemented by the provider client.
#[async_trait::async_trait]
pub trait OcrBackend: Send + Sync {
    /// Upload raw bytes as a file with purpose `ocr`.
    async fn upload_file(&self, filename: &str, data: &[u8]) -> anyhow::Result<UploadedFile>;

    /// Get a time-limited URL for a previously uploaded file.
    async fn signed_url(&self, file_id: &str, expiry_hours: u32) -> anyhow::Result<String>;

    /// Run OCR on a document, asking for inline base64 images.
    async fn ocr(&self, document: DocumentSource) -> anyhow::Result<OcrOutput>;

    /// Chat completion; returns the first choice's content.
    async fn chat(&self, messages: Vec<Message>, temperature: f32) -> anyhow::Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_source_wire_format() {
        let doc = DocumentSource::DocumentUrl {
            document_url: "https://files.example/signed".into(),
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"type": "document_url", "document_url": "https://files.example/signed"})
        );

        let img = DocumentSource::ImageUrl {
            image_url: "data:image/png;base64,AAAA".into(),
        };
        assert_eq!(
            serde_json::to_value(&img).unwrap(),
            json!({"type": "image_url", "image_url": "data:image/png;base64,AAAA"})
        );
    }

    #[test]
    fn test_user_text_message_shape() {
        let msg = Message::user_text("hello");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "content": [{"type": "text", "text": "hello"}]})
        );
    }

    #[test]
    fn test_parse_ocr_response() {
        let raw = json!({
            "pages": [
                {
                    "index": 0,
                    "markdown": "![img-0.jpeg](img-0.jpeg)",
                    "images": [{
                        "id": "img-0.jpeg",
                        "top_left_x": 10, "top_left_y": 20,
                        "bottom_right_x": 30, "bottom_right_y": 40,
                        "image_base64": "data:image/jpeg;base64,AAAA"
                    }],
                    "dimensions": {"dpi": 200, "height": 2200, "width": 1700}
                },
                {"index": 1, "markdown": "plain", "images": [], "dimensions": null}
            ],
            "model": "mistral-ocr-2503-completion",
            "usage_info": {"pages_processed": 2, "doc_size_bytes": 1234}
        });

        let parsed: OcrResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.pages.len(), 2);
        assert_eq!(parsed.pages[0].images[0].id, "img-0.jpeg");
        assert_eq!(parsed.pages[0].dimensions.as_ref().unwrap().dpi, 200);
        assert!(parsed.pages[1].dimensions.is_none());
        assert_eq!(parsed.usage_info.unwrap().pages_processed, 2);
    }
}

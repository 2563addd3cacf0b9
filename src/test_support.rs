//! Recording `OcrBackend` double shared by unit tests.

use crate::ocr::{
    DocumentSource, Message, OcrBackend, OcrOutput, OcrResponse, UploadedFile,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { filename: String, size: usize },
    SignedUrl { file_id: String, expiry_hours: u32 },
    Ocr(DocumentSource),
    Chat { messages: Vec<Message>, temperature: f32 },
}

pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    /// When set, every call fails with this message.
    pub fail_with: Option<String>,
    /// Directory whose entry count is sampled when `ocr` runs.
    pub watch_dir: Option<PathBuf>,
    pub files_seen_during_ocr: Mutex<Option<usize>>,
    pub ocr_raw: serde_json::Value,
    pub chat_reply: String,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: None,
            watch_dir: None,
            files_seen_during_ocr: Mutex::new(None),
            ocr_raw: json!({
                "pages": [
                    {
                        "index": 0,
                        "markdown": "# Page one\n\n![img-1.jpeg](img-1.jpeg)",
                        "images": [{"id": "img-1.jpeg", "image_base64": "AAAA"}]
                    },
                    {"index": 1, "markdown": "Page two", "images": []}
                ],
                "model": "mistral-ocr-latest",
                "usage_info": {"pages_processed": 2}
            }),
            chat_reply: "# Converted".to_string(),
        }
    }
}

impl MockBackend {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_with {
            Some(msg) => Err(anyhow::anyhow!("{}", msg)),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl OcrBackend for MockBackend {
    async fn upload_file(&self, filename: &str, data: &[u8]) -> anyhow::Result<UploadedFile> {
        self.record(Call::Upload {
            filename: filename.to_string(),
            size: data.len(),
        })?;
        Ok(UploadedFile {
            id: "file-123".to_string(),
            filename: Some(filename.to_string()),
        })
    }

    async fn signed_url(&self, file_id: &str, expiry_hours: u32) -> anyhow::Result<String> {
        self.record(Call::SignedUrl {
            file_id: file_id.to_string(),
            expiry_hours,
        })?;
        Ok(format!("https://files.example/{}?sig=abc", file_id))
    }

    async fn ocr(&self, document: DocumentSource) -> anyhow::Result<OcrOutput> {
        if let Some(dir) = &self.watch_dir {
            let count = std::fs::read_dir(dir)?.count();
            *self.files_seen_during_ocr.lock().unwrap() = Some(count);
        }
        self.record(Call::Ocr(document))?;
        let response: OcrResponse = serde_json::from_value(self.ocr_raw.clone())?;
        Ok(OcrOutput {
            response,
            raw: self.ocr_raw.clone(),
        })
    }

    async fn chat(&self, messages: Vec<Message>, temperature: f32) -> anyhow::Result<String> {
        self.record(Call::Chat {
            messages,
            temperature,
        })?;
        Ok(self.chat_reply.clone())
    }
}

//! Service configuration.
//!
//! Settings are read from the process environment (after `.env` has been
//! loaded in `main`). Every variable has a default, so the server boots with
//! no configuration at all; a missing API key only surfaces when the
//! provider is called.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_API_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_OCR_MODEL: &str = "mistral-ocr-latest";
pub const DEFAULT_CHAT_MODEL: &str = "ministral-8b-latest";
const DEFAULT_PORT: u16 = 7000;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost",
    "http://localhost:8000",
    "http://localhost:3000",
];

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub api_url: String,
    pub ocr_model: String,
    pub chat_model: String,
    pub upload_dir: PathBuf,
    /// Directory for per-request temp files.
    pub scratch_dir: PathBuf,
    pub max_upload_size: usize,
    /// Allowed CORS origins; `["*"]` means any.
    pub cors_origins: Vec<String>,
    pub bind_addr: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            scratch_dir: std::env::temp_dir(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        settings.api_key = get("MISTRAL_API_KEY");
        if settings.api_key.is_none() {
            warn!("MISTRAL_API_KEY is not set; OCR and conversion requests will fail");
        }

        if let Some(url) = get("MISTRAL_API_URL") {
            settings.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("OCR_MODEL") {
            settings.ocr_model = model;
        }
        if let Some(model) = get("CHAT_MODEL") {
            settings.chat_model = model;
        }
        if let Some(dir) = get("UPLOAD_DIR") {
            settings.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("SCRATCH_DIR") {
            settings.scratch_dir = PathBuf::from(dir);
        }
        if let Some(size) = get("MAX_UPLOAD_SIZE") {
            settings.max_upload_size = size
                .trim()
                .parse()
                .with_context(|| format!("Invalid MAX_UPLOAD_SIZE: {:?}", size))?;
        }
        if let Some(origins) = get("BACKEND_CORS_ORIGINS") {
            settings.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(addr) = get("BIND_ADDR") {
            settings.bind_addr = addr
                .trim()
                .parse()
                .with_context(|| format!("Invalid BIND_ADDR: {:?}", addr))?;
        }

        Ok(settings)
    }

    /// Create the upload directory if it does not exist yet.
    pub fn ensure_upload_dir(&self) -> Result<()> {
        ensure_dir(&self.upload_dir)
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
        info!("Created directory {:?}", dir);
    }
    Ok(())
}

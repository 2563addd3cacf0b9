//! Markdown OCR - HTTP service turning PDFs, images and raw text into Markdown.

mod config;
mod document;
mod error;
mod form;
mod markdown;
mod ocr;
mod service;
#[cfg(test)]
mod test_support;
mod validate;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method},
    response::Json,
    routing::{get, post},
    Router,
};
use config::Settings;
use document::ExtractInput;
use error::ApiError;
use form::FormInput;
use ocr::mistral::MistralClient;
use serde::Serialize;
use service::{OcrResult, OcrService};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Headroom above the upload limit so oversize files reach the validator.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    service: OcrService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "markdown_ocr=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    settings.ensure_upload_dir()?;
    info!(
        "Settings loaded: api_url={}, ocr_model={}, chat_model={}, max_upload_size={}",
        settings.api_url, settings.ocr_model, settings.chat_model, settings.max_upload_size
    );

    // Initialize Mistral client
    let mistral = MistralClient::new(reqwest::Client::new(), &settings);
    info!("Mistral client initialized");

    let service = OcrService::new(Arc::new(mistral), settings.scratch_dir.clone());
    let bind_addr = settings.bind_addr;
    let state = AppState {
        settings: Arc::new(settings),
        service,
    };

    let app = router(state);

    // Run server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router.
fn router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_size + BODY_LIMIT_SLACK;
    let cors = cors_layer(&state.settings.cors_origins);

    let api = Router::new()
        .route("/upload", post(upload_file))
        .route("/extract", post(extract_text))
        .route("/convert", post(convert_to_markdown));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins; `*` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::list([Method::GET, Method::POST, Method::OPTIONS]))
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
struct Welcome {
    message: &'static str,
}

async fn root() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to DoveAI OCR API",
    })
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct UploadReceipt {
    success: bool,
    filename: String,
    content_type: Option<String>,
    size: usize,
}

/// Validate an uploaded PDF or image without processing it.
async fn upload_file(
    State(state): State<AppState>,
    form: FormInput,
) -> Result<Json<UploadReceipt>, ApiError> {
    let file = form
        .file
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    validate::validate_upload(
        file.size(),
        &file.filename,
        file.content_type.as_deref(),
        state.settings.max_upload_size,
    )?;

    info!("Upload accepted: {} ({} bytes)", file.filename, file.size());
    let size = file.size();
    Ok(Json(UploadReceipt {
        success: true,
        filename: file.filename,
        content_type: file.content_type,
        size,
    }))
}

/// Extract Markdown from a file, or format raw text as Markdown.
async fn extract_text(
    State(state): State<AppState>,
    form: FormInput,
) -> Result<Json<OcrResult>, ApiError> {
    let input = ExtractInput::from_parts(form.file, form.text)?;
    if let ExtractInput::File(doc, kind) = &input {
        validate::check_size(doc.size(), state.settings.max_upload_size)?;
        info!("Extracting {} as {:?}", doc.filename, kind);
    }

    state.service.process(input).await.into_result().map(Json)
}

/// Convert raw text to Markdown.
async fn convert_to_markdown(
    State(state): State<AppState>,
    form: FormInput,
) -> Result<Json<OcrResult>, ApiError> {
    let text = form
        .text
        .ok_or_else(|| ApiError::BadRequest("Field 'text' is required".to_string()))?;

    state
        .service
        .process_text(&text)
        .await
        .into_result()
        .map(Json)
}

use axum::{
    extract::{DefaultBodyLimit, Json, Path, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use base64::Engine;
use hotspot_core::{
    load_hotspots, new_session_id, save_hotspots, DetectionOutcome, Hotspot, HotspotDetector,
    HotspotError, HotspotStore, DEFAULT_PROMPT,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Uploaded panoramas can be large
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Server settings, from HOTSPOT_* environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("HOTSPOT_DATA_DIR")
                .unwrap_or_else(|_| "data/processed".to_string())
                .into(),
            upload_dir: std::env::var("HOTSPOT_UPLOAD_DIR")
                .unwrap_or_else(|_| "data/uploads".to_string())
                .into(),
            addr: std::env::var("HOTSPOT_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HotspotStore>,
    /// None when no model credentials are configured; detection is then refused
    pub detector: Option<Arc<HotspotDetector>>,
    pub upload_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct DetectRequest {
    /// Base64 image, optionally as a data URL
    image: String,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Debug, Serialize)]
struct DetectResponse {
    id: String,
    hotspots: Vec<Hotspot>,
    total_hotspots: usize,
    outcome: DetectionOutcome,
}

#[derive(Debug, Serialize)]
struct SaveResponse {
    status: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    detection_enabled: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

fn store_error(e: HotspotError) -> ApiError {
    match e {
        HotspotError::InvalidSessionId(_) => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_SESSION_ID", e.to_string())
        }
        other => {
            warn!("Storage failure: {}", other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILED", other.to_string())
        }
    }
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        detection_enabled: state.detector.is_some(),
    })
}

/// Upload extension kept on disk, reduced to a safe lowercase suffix
fn upload_extension(filename: Option<&str>) -> String {
    filename
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string())
}

fn decode_image_payload(image: &str) -> Result<Vec<u8>, base64::DecodeError> {
    // Accept data URLs as sent by browsers
    let payload = match image.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => image,
    };
    base64::engine::general_purpose::STANDARD.decode(payload.trim())
}

async fn detect_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    let detector = state.detector.clone().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "DETECTION_DISABLED",
            "No vision model configured (set OPENAI_API_KEY)",
        )
    })?;

    let image_bytes = decode_image_payload(&request.image).map_err(|e| {
        warn!("Failed to decode base64 image: {}", e);
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_IMAGE",
            format!("Failed to decode base64 image: {}", e),
        )
    })?;

    let session_id = new_session_id();
    info!("Received panorama for session {} ({} bytes)", session_id, image_bytes.len());

    let upload_path = state.upload_dir.join(format!(
        "{}.{}",
        session_id,
        upload_extension(request.filename.as_deref())
    ));
    let stored = async {
        tokio::fs::create_dir_all(&state.upload_dir).await?;
        tokio::fs::write(&upload_path, &image_bytes).await
    }
    .await;
    stored.map_err(|e| {
        warn!("Failed to store upload {}: {}", upload_path.display(), e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "UPLOAD_FAILED", e.to_string())
    })?;

    let prompt = request.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
    let report = detector
        .detect_and_store(Arc::clone(&state.store), &session_id, &image_bytes, prompt)
        .await
        .map_err(store_error)?;

    info!(
        "Session {}: {:?}, {} hotspots in {}ms",
        session_id,
        report.outcome,
        report.hotspots.len(),
        report.execution_time_ms
    );

    Ok(Json(DetectResponse {
        id: session_id,
        total_hotspots: report.hotspots.len(),
        hotspots: report.hotspots,
        outcome: report.outcome,
    }))
}

async fn get_data_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Hotspot>>, ApiError> {
    let store = Arc::clone(&state.store);
    let hotspots = tokio::task::spawn_blocking(move || load_hotspots(store.as_ref(), &id))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILED", e.to_string()))?
        .map_err(store_error)?;

    Ok(Json(hotspots))
}

async fn save_data_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(hotspots): Json<Vec<Hotspot>>,
) -> Result<Json<SaveResponse>, ApiError> {
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || save_hotspots(store.as_ref(), &id, &hotspots))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILED", e.to_string()))?
        .map_err(store_error)?;

    Ok(Json(SaveResponse {
        status: "success".to_string(),
    }))
}

/// Create the Axum app with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5000,http://127.0.0.1:5000,http://localhost:8080,http://127.0.0.1:8080".to_string());

    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    };

    let uploads = ServeDir::new(&state.upload_dir);

    Router::new()
        .route("/health", get(health_check))
        .route("/detect", post(detect_handler))
        .route("/api/data/:id", get(get_data_handler))
        .route("/api/save/:id", post(save_data_handler))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

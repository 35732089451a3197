//! HTTP and WebSocket front end for the AgriScan analysis pipeline.
//!
//! Uploads are kept in a bounded FIFO cache keyed by image id; analyses either run
//! inline (`POST /analyze`) or through the background [`AnalysisQueue`], whose
//! progress can be polled over REST or streamed over a WebSocket.

pub mod config;
pub mod error;
mod handlers;

pub use config::ServerConfig;
pub use error::ApiError;

use agriscan_vision::{AnalysisPipeline, AnalysisQueue, ConfigError, FifoCache, ImageUpload, QueueConfig};
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Slack on top of the file limit for multipart framing and other form fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const DEV_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: Arc<AnalysisPipeline>,
    pub queue: AnalysisQueue,
    pub uploads: Mutex<FifoCache<Uuid, ImageUpload>>,
}

impl AppState {
    /// Builds the pipeline and starts the analysis workers. Must be called inside a Tokio runtime.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let pipeline = Arc::new(AnalysisPipeline::new(config.pipeline.clone())?);
        let mut queue_config = QueueConfig::default();
        if let Some(workers) = config.workers {
            queue_config.workers = workers;
        }
        let queue = AnalysisQueue::new(pipeline.clone(), queue_config);
        let uploads = Mutex::new(FifoCache::new(config.max_stored_images));
        Ok(Self {
            config,
            pipeline,
            queue,
            uploads,
        })
    }

    pub async fn store_upload(&self, upload: ImageUpload) {
        let image_id = upload.image_id;
        let evicted = self.uploads.lock().await.put(image_id, upload);
        tracing::info!(%image_id, "image stored");
        for old in evicted {
            tracing::debug!(image_id = %old, "evicted stored image");
        }
    }

    pub async fn stored_upload(&self, image_id: &Uuid) -> Result<ImageUpload, ApiError> {
        self.uploads
            .lock()
            .await
            .get(image_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("image {image_id}")))
    }

    pub fn next_seed(&self) -> u64 {
        self.config.seed.unwrap_or_else(|| {
            let now = chrono::Utc::now();
            now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros()) as u64
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = DEV_ORIGINS.into_iter().map(HeaderValue::from_static).collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/upload-image", post(handlers::upload_image))
        .route("/analyze", post(handlers::analyze))
        .route("/api/analysis", post(handlers::start_analysis))
        .route("/api/analysis/:id", get(handlers::analysis_status))
        .route("/api/analyze/pests", post(handlers::analyze_pests))
        .route("/api/analyze/nutrients", post(handlers::analyze_nutrients))
        .route("/api/analyze/yield", post(handlers::analyze_yield))
        .route("/api/analyze/full", get(handlers::analyze_full))
        .route("/api/demo-data", get(handlers::demo_data))
        .route("/ws/analysis/:id", get(handlers::analysis_ws))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(cfg: ServerConfig) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let bind_addr = cfg.bind_addr.clone();
    let state = Arc::new(AppState::new(cfg)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "AgriScan server listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server stopped");
        }
    });
    Ok(server)
}

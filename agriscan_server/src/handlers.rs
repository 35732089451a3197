use crate::AppState;
use crate::error::ApiError;
use agriscan_vision::core_modules::field_zones::{self, FieldZone};
use agriscan_vision::core_modules::pest_detection::PestReport;
use agriscan_vision::core_modules::utils::image_helper::image_helper;
use agriscan_vision::core_modules::yield_prediction::YieldPrediction;
use agriscan_vision::pipeline::NutrientOutcome;
use agriscan_vision::{AnalysisPipeline, AnalysisReport, DecodeError, ImageUpload, JobStatus, Pixel, PixelImage};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

const FILE_FIELD: &str = "file";
/// Synthetic canopy analysed for the demo dashboard.
const DEMO_CANOPY: Pixel = Pixel {
    red: 90,
    green: 140,
    blue: 60,
};
const DEMO_SIDE: u32 = 64;
const DEMO_HECTARES_ANALYZED: u32 = 250;
const DEMO_PROCESSING_HOURS: u32 = 2;
const DEMO_ACCURACY_PERCENT: u32 = 94;
const DEMO_COST_SAVINGS_PERCENT: u32 = 40;

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "AgriScan Analysis API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": [
            "GET /health",
            "POST /api/upload-image",
            "POST /analyze",
            "POST /api/analysis",
            "POST /api/analyze/pests?image_id=",
            "POST /api/analyze/nutrients?image_id=",
            "POST /api/analyze/yield?image_id=",
            "GET /api/analyze/full?image_id=",
            "GET /api/demo-data",
            "GET /api/analysis/:id",
            "GET /ws/analysis/:id",
        ],
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}

pub async fn upload_image(State(state): State<Arc<AppState>>, multipart: Multipart) -> Result<Json<Value>, ApiError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    let body = json!({
        "status": "success",
        "image_id": upload.image_id,
        "filename": upload.filename,
        "size": upload.size(),
        "message": "Image uploaded successfully",
    });
    state.store_upload(upload).await;
    Ok(Json(body))
}

/// Runs the full pipeline inline and returns the report.
pub async fn analyze(State(state): State<Arc<AppState>>, multipart: Multipart) -> Result<Json<AnalysisReport>, ApiError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    state.store_upload(upload.clone()).await;
    let seed = state.next_seed();
    let pipeline = state.pipeline.clone();
    let report = tokio::task::spawn_blocking(move || {
        pipeline.analyze_bytes(upload.image_id, &upload.bytes, &upload.content_type, seed)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub image_id: Uuid,
}

pub async fn start_analysis(
    State(state): State<Arc<AppState>>,
    request: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let upload = state.stored_upload(&request.image_id).await?;

    let analysis_id = state.queue.submit(upload, state.next_seed()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "analysis_id": analysis_id, "status": "queued" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub image_id: Uuid,
}

pub async fn analyze_pests(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Result<Json<PestReport>, ApiError> {
    let report = run_stored(&state, query, |pipeline, _, image, seed| pipeline.detect_pests(image, seed)).await?;
    Ok(Json(report))
}

pub async fn analyze_nutrients(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Result<Json<NutrientOutcome>, ApiError> {
    let outcome = run_stored(&state, query, |pipeline, id, image, seed| {
        pipeline.assess_nutrients(id, image, seed)
    })
    .await?;
    Ok(Json(outcome))
}

pub async fn analyze_yield(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Result<Json<YieldPrediction>, ApiError> {
    let prediction = run_stored(&state, query, |pipeline, id, image, seed| {
        pipeline.predict_yield(id, image, seed)
    })
    .await?;
    Ok(Json(prediction))
}

pub async fn analyze_full(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let report = run_stored(&state, query, |pipeline, id, image, seed| {
        pipeline.analyze_image(id, image, seed)
    })
    .await?;
    Ok(Json(report))
}

/// Decodes a stored upload off the async runtime and runs one pipeline entry point on it.
async fn run_stored<T, F>(
    state: &Arc<AppState>,
    query: Result<Query<ImageQuery>, QueryRejection>,
    stage: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AnalysisPipeline, Uuid, &PixelImage, u64) -> T + Send + 'static,
{
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let upload = state.stored_upload(&query.image_id).await?;
    let pipeline = state.pipeline.clone();
    let seed = state.next_seed();
    let result = tokio::task::spawn_blocking(move || {
        let image = image_helper::decode(&upload.bytes, &upload.content_type)?;
        Ok::<T, DecodeError>(stage(&pipeline, upload.image_id, &image, seed))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(result)
}

#[derive(Debug, Serialize)]
pub struct DemoStats {
    pub hectares_analyzed: u32,
    pub processing_hours: u32,
    pub accuracy: u32,
    pub cost_savings: u32,
}

#[derive(Debug, Serialize)]
pub struct DemoData {
    pub pest_detection: PestReport,
    pub nutrient_analysis: NutrientOutcome,
    pub yield_prediction: YieldPrediction,
    pub field_zones: Vec<FieldZone>,
    pub stats: DemoStats,
}

/// Sample dashboard payload: a synthetic canopy run through the stages, over the fixed zone grid.
pub async fn demo_data(State(state): State<Arc<AppState>>) -> Result<Json<DemoData>, ApiError> {
    let sample =
        PixelImage::filled(DEMO_SIDE, DEMO_SIDE, DEMO_CANOPY).map_err(|e| ApiError::Internal(e.to_string()))?;
    let report = state.pipeline.analyze_image(Uuid::nil(), &sample, state.next_seed());
    Ok(Json(DemoData {
        pest_detection: report.pest_detection,
        nutrient_analysis: report.nutrient_analysis,
        yield_prediction: report.yield_prediction,
        field_zones: field_zones::static_grid(),
        stats: DemoStats {
            hectares_analyzed: DEMO_HECTARES_ANALYZED,
            processing_hours: DEMO_PROCESSING_HOURS,
            accuracy: DEMO_ACCURACY_PERCENT,
            cost_savings: DEMO_COST_SAVINGS_PERCENT,
        },
    }))
}

pub async fn analysis_status(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let status = state
        .queue
        .status(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("analysis {id}")))?;
    let mut body = serde_json::to_value(&status).map_err(|e| ApiError::Internal(e.to_string()))?;
    if let Value::Object(map) = &mut body {
        map.insert("analysis_id".to_string(), json!(id));
    }
    Ok(Json(body))
}

pub async fn analysis_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_progress(socket, state, id))
}

async fn stream_progress(mut socket: WebSocket, state: Arc<AppState>, job_id: Uuid) {
    let mut ticker = tokio::time::interval(state.config.ws_poll_interval);
    loop {
        ticker.tick().await;
        let (message, done) = progress_message(state.queue.status(&job_id).await);
        if socket.send(Message::Text(message.to_string())).await.is_err() {
            tracing::debug!(%job_id, "progress socket closed by client");
            return;
        }
        if done {
            break;
        }
    }
    let _ = socket.close().await;
}

/// One progress frame for the socket, and whether it is the last one.
pub(crate) fn progress_message(status: Option<JobStatus>) -> (Value, bool) {
    match status {
        None => (json!({ "status": "error", "message": "Analysis not found" }), true),
        Some(JobStatus::Queued) => (json!({ "status": "processing", "stage": "queued" }), false),
        Some(JobStatus::Processing) => (json!({ "status": "processing", "stage": "analyzing" }), false),
        Some(JobStatus::Completed { report }) => (json!({ "status": "complete", "data": report }), true),
        Some(JobStatus::Failed { message }) => (json!({ "status": "error", "message": message }), true),
    }
}

/// Pulls the `file` field out of a multipart body and checks it is a plausible image upload.
async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, max_bytes))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !image_helper::is_image_content_type(&content_type) {
            return Err(ApiError::UnsupportedMediaType("File must be an image".to_string()));
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(|e| multipart_error(e, max_bytes))?;
        return into_upload(filename, content_type, data, max_bytes);
    }
    Err(ApiError::BadRequest(format!("missing multipart field `{FILE_FIELD}`")))
}

fn into_upload(filename: String, content_type: String, data: Bytes, max_bytes: usize) -> Result<ImageUpload, ApiError> {
    if data.len() > max_bytes {
        tracing::warn!(filename = %filename, size = data.len(), limit = max_bytes, "upload rejected");
        return Err(ApiError::PayloadTooLarge { limit: max_bytes });
    }
    if data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }
    Ok(ImageUpload::new(filename, content_type, data.to_vec()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError, max_bytes: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit: max_bytes }
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

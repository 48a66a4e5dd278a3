// Axum API Server Module
//
// Purpose: REST surface over the analysis service (engine + recommendation)
// and the chat assistant. Engine-only routes never touch the model.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::analysis::{AnalysisService, AnalyzeRequest, BiasRequest, BillReport, build_model};
use crate::chat::{ChatAssistant, ChatError, ChatRequest};
use crate::config::ServiceConfig;
use crate::error::EngineError;
use crate::scenarios::ScenarioComparison;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub chat: Arc<ChatAssistant>,
}

impl AppState {
    pub fn new(service: AnalysisService, chat: ChatAssistant) -> Self {
        Self {
            service: Arc::new(service),
            chat: Arc::new(chat),
        }
    }

    /// Load catalog, build the model client and wire both services
    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        tracing::info!("Initializing generative model...");
        let model = build_model(config)?;

        tracing::info!("Initializing analysis service...");
        let service = AnalysisService::from_config(config, model.clone())?;

        Ok(Self::new(service, ChatAssistant::new(model)))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Full analysis: baseline bill + recommendation (once per session)
        .route("/api/analyze", post(analyze))

        // Engine-only endpoints (no model call)
        .route("/api/bill", post(compute_bill))
        .route("/api/scenarios", post(compare_scenarios))

        // Assistant
        .route("/api/chat", post(chat))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive()) // Allow all origins (adjust for production)
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Response, AppError> {
    tracing::info!(
        "Analyzing {} ({} area, {} floors, session: {:?})",
        payload.spec.building_type,
        payload.spec.area,
        payload.spec.floors,
        payload.session_id
    );

    let response = state.service.analyze(&payload).await?;
    Ok(Json(response).into_response())
}

async fn compute_bill(
    State(state): State<AppState>,
    Json(payload): Json<BiasRequest>,
) -> Result<Json<BillReport>, AppError> {
    // CPU-bound work: run in blocking thread pool
    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || service.bill(&payload.spec, payload.bias()))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    Ok(Json(report))
}

async fn compare_scenarios(
    State(state): State<AppState>,
    Json(payload): Json<BiasRequest>,
) -> Result<Json<ScenarioComparison>, AppError> {
    let service = state.service.clone();
    let comparison = tokio::task::spawn_blocking(move || service.scenarios(&payload.spec, payload.bias()))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    Ok(Json(comparison))
}

async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let reply = state.chat.reply(&payload).await?;
    let status = if reply.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(reply)).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unprocessable(String),
    Internal(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidSpec(_) => AppError::BadRequest(err.to_string()),
            EngineError::Configuration(_) => AppError::Unprocessable(err.to_string()),
            EngineError::CatalogIntegrity { .. } => {
                tracing::error!("{}", err);
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

use crate::error::ApiError;
use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use nexavest_core::domain::analysis::{AnalysisRequest, AnalysisResult};
use nexavest_core::QuoteAnalyzer;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: QuoteAnalyzer,
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/analyze", post(analyze))
        .route("/api/analyze", get(analyze_query))
        .route("/ai_recommend", post(ai_recommend))
        .with_state(state)
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// `*` opens the API to any origin without credentials; an explicit list allows credentials.
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin: {o}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

#[derive(Debug, Serialize)]
struct Status {
    status: &'static str,
    message: &'static str,
}

async fn root() -> Json<Status> {
    Json(Status {
        status: "ok",
        message: "NexaVest backend running",
    })
}

async fn healthz() -> &'static str {
    "ok"
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(state.analyzer.analyze(&req).await?))
}

async fn ai_recommend(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(state.analyzer.recommend(&req).await?))
}

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    symbol: Option<String>,
    amount: Option<f64>,
}

async fn analyze_query(
    State(state): State<AppState>,
    params: Result<Query<AnalyzeParams>, QueryRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let (Some(symbol), Some(amount)) = (params.symbol, params.amount) else {
        return Err(ApiError::bad_request("symbol and amount are required"));
    };

    let req = AnalysisRequest::new(symbol, Some(amount));
    Ok(Json(state.analyzer.analyze(&req).await?))
}

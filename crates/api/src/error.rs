use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nexavest_core::AnalyzeError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Every failure leaves the API as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        let status = match &err {
            AnalyzeError::NotFound { .. } => StatusCode::NOT_FOUND,
            AnalyzeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::Configuration(_) => {
                sentry_anyhow::capture_anyhow(&anyhow::anyhow!("{err}"));
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

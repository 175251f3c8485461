//! HTTP surface: liveness and prediction routes.
//!
//! Two routes only: `GET /` reports liveness, `POST /predict` runs one
//! record through the inference chain. Every failure anywhere in the
//! chain is caught at this boundary and reported as `{"error": ...}` with
//! a server-error status; no partial results are ever returned.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::application::InferenceService;
use crate::domain::HeartRecord;

/// Immutable state shared by all requests.
///
/// Constructed once at startup; read-only for the process lifetime, so no
/// locking is needed across concurrent requests.
pub struct ServiceContext {
    inference: InferenceService,
}

impl ServiceContext {
    /// Wrap an inference service for request handling.
    #[must_use]
    pub fn new(inference: InferenceService) -> Self {
        Self { inference }
    }
}

/// Liveness response body.
#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
}

/// Error response body for any failed prediction.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Build the axum router with all routes.
pub fn build_router(context: Arc<ServiceContext>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/predict", post(predict_handler))
        .with_state(context)
}

/// `GET /` - liveness only.
async fn home_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "up",
        message: "Heart disease risk service is running",
    })
}

/// `POST /predict` - classify one raw record.
///
/// The body is parsed manually so that every failure mode (malformed
/// JSON, missing field, pipeline error) funnels through the same generic
/// error response.
async fn predict_handler(State(context): State<Arc<ServiceContext>>, body: Bytes) -> Response {
    let record: HeartRecord = match serde_json::from_slice(&body) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed prediction request");
            return error_response(format!("invalid request body: {e}"));
        }
    };

    match context.inference.predict(&record) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Prediction failed");
            error_response(e.to_string())
        }
    }
}

fn error_response(error: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error }),
    )
        .into_response()
}

//! Advisor handler
//!
//! `POST /api/advisor` runs the full pipeline: period resolution, ledger
//! aggregation, prompt assembly, and the completion call. Advisor failures
//! are mapped to the response shape the client expects; provider detail is
//! only included outside production.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use tracing::error;

use ledgerly_core::AdvisorError;

use crate::{AppState, AuthUser};

/// Request body for advice
#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    #[serde(default)]
    pub question: String,
}

/// POST /api/advisor - Answer a financial question over the user's ledger
pub async fn get_advice(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AdviceRequest>,
) -> Response {
    match state.advisor.get_advice(user.0, &body.question).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "question": body.question.trim(),
                "advice": result.advice,
                "period": result.period,
                "stats": result.stats,
            })),
        )
            .into_response(),
        Err(err) => advisor_error_response(err, state.config.expose_error_detail),
    }
}

/// Convert an advisor failure into the client-facing response
///
/// Every category carries a fixed message; the underlying detail is only
/// exposed when the server is not running in production.
fn advisor_error_response(err: AdvisorError, expose_detail: bool) -> Response {
    let status = match err {
        AdvisorError::Validation => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, detail = ?err.detail(), "Advisor request failed");
    }

    let mut body = serde_json::json!({ "message": err.to_string() });
    if expose_detail {
        if let Some(detail) = err.detail() {
            body["error"] = serde_json::Value::String(detail);
        }
    }

    (status, Json(body)).into_response()
}

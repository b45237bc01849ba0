//! Identity and health handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::{AppState, AuthUser};

/// Identity of the authenticated caller
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: i64,
}

/// GET /api/me - Who the server thinks the caller is
pub async fn get_me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse { user_id: user.0 })
}

/// GET /api/health - Liveness probe
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    // A pool checkout doubles as a database liveness check
    let db_ok = state.db.conn().is_ok();
    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
    }))
}

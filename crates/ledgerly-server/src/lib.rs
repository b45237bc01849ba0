//! Ledgerly Web Server
//!
//! Axum-based REST API for the Ledgerly personal finance advisor.
//!
//! - Bearer-token authentication (secure by default, `--no-auth` for local dev)
//! - Restrictive CORS policy when origins are configured
//! - Sanitized error responses: provider detail only outside production

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use ledgerly_core::ai::CompletionBackend;
use ledgerly_core::{Advisor, CompletionClient, Database};

mod handlers;


/// Environment variable holding the HS256 secret for bearer tokens
pub const TOKEN_SECRET_ENV: &str = "LEDGERLY_TOKEN_SECRET";

/// User id injected when authentication is disabled (local development)
const DEV_USER_ID: i64 = 1;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// HS256 secret for validating bearer tokens
    pub token_secret: String,
    /// Allowed CORS origins (empty = permissive, for local dev)
    pub allowed_origins: Vec<String>,
    /// Include provider error detail in 500 bodies (never in production)
    pub expose_error_detail: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            token_secret: String::new(),
            allowed_origins: vec![],
            expose_error_detail: false,
        }
    }
}

impl ServerConfig {
    /// Build configuration from the environment
    ///
    /// `LEDGERLY_ENV=production` hides error detail from clients.
    pub fn from_env() -> Self {
        let production = std::env::var("LEDGERLY_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        Self {
            require_auth: true,
            token_secret: std::env::var(TOKEN_SECRET_ENV).unwrap_or_default(),
            allowed_origins: std::env::var("LEDGERLY_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            expose_error_detail: !production,
        }
    }
}

/// Verified identity for the current request
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Bearer-token claims
#[derive(Debug, serde::Deserialize)]
struct Claims {
    /// User id
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub advisor: Advisor,
    pub config: ServerConfig,
}

/// Authentication middleware - validates the bearer token and attaches the
/// verified user id to the request
///
/// With `require_auth` disabled (local dev, tests) a fixed dev user is
/// injected instead.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        request.extensions_mut().insert(AuthUser(DEV_USER_ID));
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    let Some(token) = token else {
        warn!(path = %request.uri().path(), "Unauthorized request - no bearer token");
        return unauthorized();
    };

    match validate_token(token, &state.config.token_secret) {
        Ok(user_id) => {
            request.extensions_mut().insert(AuthUser(user_id));
            next.run(request).await
        }
        Err(reason) => {
            warn!(path = %request.uri().path(), %reason, "Unauthorized request - invalid token");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "message": "User not authenticated" })),
    )
        .into_response()
}

/// Validate an HS256 bearer token and extract the user id from `sub`
fn validate_token(token: &str, secret: &str) -> Result<i64, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    if secret.is_empty() {
        return Err(format!("{} not configured", TOKEN_SECRET_ENV));
    }

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| format!("token validation failed: {}", e))?;

    data.claims
        .sub
        .parse()
        .map_err(|_| format!("invalid subject claim: {}", data.claims.sub))
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    // Create the completion client if configured
    let completion = CompletionClient::from_env();
    match &completion {
        Some(client) => {
            info!(host = client.host(), model = client.model(), "Completion backend configured")
        }
        None => {
            info!("Completion backend not configured (set GEMINI_API_KEY to enable the advisor)")
        }
    }

    let advisor = Advisor::new(db.clone(), completion);
    create_router_with_advisor(db, config, advisor)
}

/// Create the application router with an explicit advisor (for testing)
pub fn create_router_with_advisor(db: Database, config: ServerConfig, advisor: Advisor) -> Router {
    let cors = build_cors(&config.allowed_origins);

    let state = Arc::new(AppState {
        db,
        advisor,
        config,
    });

    let api_routes = Router::new()
        // Identity
        .route("/me", get(handlers::get_me))
        // Advisor
        .route("/advisor", post(handlers::get_advice))
        // Ledger records
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/expenses/:id", axum::routing::delete(handlers::delete_expense))
        .route(
            "/income",
            get(handlers::list_income).post(handlers::create_income),
        )
        .route("/income/:id", axum::routing::delete(handlers::delete_income))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ))
        // Health check stays unauthenticated
        .route("/health", get(handlers::health))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        // Local development default
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// Run the server
pub async fn run(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "message": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

use crate::config::{AppState, ServerConfig};
use anyhow::Result;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;
mod mcp;

#[cfg(test)]
mod tests;

/// Start the API server
pub async fn serve(addr: &str, config: ServerConfig) -> Result<()> {
    let state = Arc::new(AppState::new(&config)?);

    if let Some(secs) = config.server.session_idle_timeout_secs {
        spawn_session_sweeper(state.clone(), secs);
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop sessions idle for longer than `idle_secs`
fn spawn_session_sweeper(state: Arc<AppState>, idle_secs: u64) {
    let max_idle =
        chrono::Duration::from_std(Duration::from_secs(idle_secs)).unwrap_or(chrono::Duration::MAX);
    let period = Duration::from_secs(idle_secs.clamp(1, 60));
    tracing::info!(idle_secs, "Session idle expiry enabled");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = state.sessions.sweep_idle(max_idle);
            if removed > 0 {
                tracing::info!(removed, remaining = state.sessions.len(), "Expired idle sessions");
            }
        }
    });
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // REST tool endpoints
        .route("/tools", get(handlers::list_tools))
        .route("/call_tool", post(handlers::call_tool))
        .route("/tools/{name}", post(handlers::call_tool_by_name))
        // Streamable HTTP MCP endpoint
        .route(
            "/mcp",
            post(mcp::handle_post)
                .get(mcp::handle_get)
                .delete(mcp::handle_delete),
        )
        // Middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "employee-mcp-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed or rejected bearer token
    Unauthorized,
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(ErrorResponse::new("Invalid or missing token")),
            )
                .into_response(),
            ApiError::BadRequest(details) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details("Bad request", details)),
            )
                .into_response(),
            ApiError::Internal(err) => {
                // Details stay in the logs
                tracing::error!(error = ?err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        ApiError::Internal(err.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

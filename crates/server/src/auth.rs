use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use service::storage::engine::Engine;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub auth_token: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub auth: ServerAuthConfig,
}

/// Middleware: require the `Authorization` header to equal the configured
/// shared-secret token exactly. No scheme prefix, no sessions.
pub async fn require_token(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(token) if token == state.auth.auth_token => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

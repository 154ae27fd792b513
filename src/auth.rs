use crate::llm_client::LlmClient;
use crate::models::ErrorResponse;
use crate::pipeline::ResponsePipeline;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<ResponsePipeline<LlmClient>>,
    pub token: Option<String>,
}

fn unauthorized(message: &str, code: &str) -> Response {
    let error_response = ErrorResponse::new(message, "invalid_request_error", code);
    (StatusCode::UNAUTHORIZED, Json(error_response)).into_response()
}

pub async fn require_authorization(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    // Health checks stay open
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    // No token configured: the service is open
    let Some(expected) = app_state.token.as_deref() else {
        return Ok(next.run(request).await);
    };

    // Accept either "Authorization: Bearer <token>" or "x-api-key: <token>"
    let provided = request
        .headers()
        .get("Authorization")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(|t| t.trim()))
        .or_else(|| request.headers().get("x-api-key").and_then(|hv| hv.to_str().ok()));

    match provided {
        None => {
            info!("Missing Authorization header");
            Err(unauthorized("Authorization header is required", "missing_auth_header"))
        }
        Some(token) if token != expected => {
            info!("Invalid token provided");
            Err(unauthorized("Invalid authentication token", "invalid_token"))
        }
        Some(_) => {
            debug!("Token validation successful");
            Ok(next.run(request).await)
        }
    }
}

use crate::auth::{self, AppState};
use crate::error::LlmError;
use crate::models::{ErrorResponse, RespondRequest, RespondResponse};
use crate::request_id;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

pub fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/respond", post(chat_respond))
        .route("/health", get(|| async { "OK" }))
        // Middleware order: CORS → request id → auth → handler
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_authorization,
        ))
        .layer(axum::middleware::from_fn(request_id::inject_request_id))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[axum_macros::debug_handler]
pub async fn chat_respond(
    State(state): State<AppState>,
    Json(request): Json<RespondRequest>,
) -> Response {
    // Fall back to the configured model when the caller names none
    let model = request
        .model
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.pipeline.default_model().to_string());
    let format = request.format;
    let history = request.into_history();

    if history.is_empty() {
        info!("Rejecting respond request without messages");
        let error_response =
            ErrorResponse::new("messages or message is required", "invalid_request_error", "empty_conversation");
        return (StatusCode::BAD_REQUEST, Json(error_response)).into_response();
    }

    debug!("Generating response for {} turns with model {}", history.len(), model);
    match state.pipeline.get_response(&history, &model).await {
        Ok(response) => Json(RespondResponse { response: format.render(response), model }).into_response(),
        Err(e) => error_response(e),
    }
}

/// Maps a pipeline failure to the HTTP status and JSON error body for the caller.
fn error_response(err: LlmError) -> Response {
    let (status, r#type, code) = match &err {
        LlmError::MissingCredential => {
            (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", "missing_credential")
        }
        LlmError::InvalidModel(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", "invalid_model"),
        LlmError::Transport(_) => (StatusCode::BAD_GATEWAY, "api_error", "request_failed"),
        LlmError::Backend { .. } => (StatusCode::BAD_GATEWAY, "api_error", "backend_error"),
        LlmError::Decode(_) => (StatusCode::BAD_GATEWAY, "api_error", "decode_error"),
        LlmError::StreamClosed => (StatusCode::BAD_GATEWAY, "api_error", "stream_closed"),
    };
    if err.is_configuration() {
        error!("Response generation misconfigured: {}", err);
    } else {
        warn!("Response generation failed: {}", err);
    }
    (status, Json(ErrorResponse::new(err.to_string(), r#type, code))).into_response()
}

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use sagechat_llm_api::{ChatMessage, LlmClient};
use sagechat_types::{ChatRequest, ErrorReply, RequestMessage, Role, WireMessage, CHAT_API_PATH};
use std::sync::Arc;
use tracing::{error, info};

use crate::web::sanitize::strip_markdown;

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,
    pub system_prompt: Arc<str>,
}

impl AppState {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<Arc<str>>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }
}

/// Create router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(CHAT_API_PATH, post(chat).options(chat_preflight))
        .route("/api/health", get(health))
        .with_state(state)
}

/// Provider conversation: system prompt first, then the sanitized history
pub fn build_provider_messages(
    system_prompt: &str,
    messages: &[RequestMessage],
) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(system_prompt))
        .chain(
            messages
                .iter()
                .map(|msg| ChatMessage::new(msg.role.as_str(), strip_markdown(&msg.content))),
        )
        .collect()
}

/// POST /api/chat - Forward a conversation to the provider
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<WireMessage>, AppError> {
    let Json(request) = payload?;
    info!(messages = request.messages.len(), "received chat request");

    let messages = build_provider_messages(&state.system_prompt, &request.messages);
    let content = state.llm.complete(&messages).await?;

    Ok(Json(WireMessage {
        role: Role::Assistant,
        content: strip_markdown(&content),
    }))
}

/// OPTIONS /api/chat - Explicit CORS answer for browsers
async fn chat_preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
        ],
    )
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Every failure surfaces as `500 {error, details}`
#[derive(Debug)]
pub enum AppError {
    Upstream(anyhow::Error),
    BadRequest(JsonRejection),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Upstream(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = match self {
            AppError::Upstream(err) => {
                error!(error = %err, "chat completion failed");
                err.to_string()
            }
            AppError::BadRequest(rejection) => {
                error!(error = %rejection.body_text(), "malformed chat request");
                rejection.body_text()
            }
        };

        let body = Json(ErrorReply {
            error: "Internal server error".to_string(),
            details,
        });

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

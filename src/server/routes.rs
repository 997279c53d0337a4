//! HTTP route handlers for the chat API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::core::errors::BotError;
use crate::engine::BotRequest;
use crate::intent::{Handler, Intent};
use crate::profile::Tone;

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.static_dir.clone();
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/stats", get(stats))
        .route("/api/profiles/{name}", get(profile))
        .route("/api/session/clear", post(clear_session))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "storebot",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatApiRequest {
    /// The user's message.
    pub message: String,
    /// Caller-supplied user identifier; defaults to `anonymous`.
    pub user_id: Option<String>,
    /// Session identifier; generated when omitted.
    pub session_id: Option<String>,
    /// Behavior profile override.
    pub profile: Option<String>,
}

/// Chat response body.
#[derive(Debug, Serialize)]
pub struct ChatApiResponse {
    /// The assistant's reply.
    pub response: String,
    /// Classified intent.
    pub intent: Intent,
    /// Classifier confidence.
    pub confidence: f64,
    /// Handler that produced the reply.
    pub handler: Handler,
    /// Session identifier to send with the next message.
    pub session_id: String,
}

/// Handle one chat turn.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatApiRequest>,
) -> Result<Json<ChatApiResponse>, (StatusCode, String)> {
    let user_id = request.user_id.unwrap_or_else(|| "anonymous".to_string());
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let bot_request = BotRequest {
        message: request.message,
        user_id,
        session_id: session_id.clone(),
        profile: request.profile,
    };

    match state.orchestrator.process(&bot_request).await {
        Ok(response) => Ok(Json(ChatApiResponse {
            response: response.response,
            intent: response.intent,
            confidence: response.confidence,
            handler: response.handler,
            session_id,
        })),
        Err(err @ BotError::InvalidInput(_)) => Err((StatusCode::BAD_REQUEST, err.to_string())),
        Err(err @ BotError::ProfileDisabled(_)) => Err((StatusCode::FORBIDDEN, err.to_string())),
        Err(err) => Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    }
}

/// Session store statistics.
async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.stats())
}

/// Public view of a behavior profile (system prompt withheld).
#[derive(Debug, Serialize)]
pub struct ProfileDto {
    /// Profile name.
    pub name: String,
    /// Whether the profile accepts requests.
    pub enabled: bool,
    /// Conversational tone.
    pub tone: Tone,
    /// Greeting shown when the chat opens.
    pub greeting: String,
    /// Suggested questions for the widget.
    pub suggested_questions: Vec<String>,
    /// Conversation starters for the widget.
    pub conversation_starters: Vec<String>,
}

/// Fetch widget-facing profile data.
async fn profile(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ProfileDto>, StatusCode> {
    let profile = state.profiles.get(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ProfileDto {
        name: profile.name.clone(),
        enabled: profile.enabled,
        tone: profile.tone,
        greeting: profile.greeting.clone(),
        suggested_questions: profile.suggested_questions.clone(),
        conversation_starters: profile.conversation_starters.clone(),
    }))
}

/// Session clear request body.
#[derive(Debug, Deserialize)]
pub struct ClearSessionRequest {
    /// User identifier.
    pub user_id: String,
    /// Session identifier.
    pub session_id: String,
    /// When false, only the message history is emptied and the context
    /// survives. Defaults to removing the whole session.
    #[serde(default = "default_true")]
    pub entire: bool,
}

const fn default_true() -> bool {
    true
}

/// Drop a session or its history.
async fn clear_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClearSessionRequest>,
) -> impl IntoResponse {
    if request.entire {
        state.store.clear_session(&request.user_id, &request.session_id);
    } else {
        state.store.clear_history(&request.user_id, &request.session_id);
    }
    Json(serde_json::json!({ "success": true }))
}

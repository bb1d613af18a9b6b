//! HTTP routes for chat sessions.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use super::error::ApiError;
use super::types::{
    HealthResponse, HistoryResponse, SendMessageRequest, SendMessageResponse, ToolsResponse,
};
use crate::session::{SessionInfo, SessionStore};

/// Shared application state.
pub struct AppState {
    pub sessions: SessionStore,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tools", get(list_tools))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", delete(delete_session))
        .route(
            "/api/sessions/:id/messages",
            get(get_history).post(send_message),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.sessions.tools().specs(),
    })
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionInfo>) {
    let info = state.sessions.create().await;
    (StatusCode::CREATED, Json(info))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// Return the session's history.
///
/// Takes the same lock as `send_message`, so a read during an in-flight turn
/// waits for that turn to finish and never sees half of it.
async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = state
        .sessions
        .get(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))?;
    let mut session = session.lock().await;
    session.touch();

    Ok(Json(HistoryResponse {
        id,
        messages: session.agent.history().to_vec(),
    }))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Message content must not be empty".to_string()));
    }

    let session = state
        .sessions
        .get(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))?;

    // Held for the whole turn so a session never runs two turns at once.
    let mut session = session.lock().await;
    session.touch();
    tracing::info!(session = %id, "Processing user message");

    let report = session.agent.run_turn(content).await;
    session.touch();
    let report = report?;

    Ok(Json(SendMessageResponse {
        reply: report.answer,
        outcome: report.outcome,
        model_calls: report.model_calls,
        tool_calls: report.tool_calls,
    }))
}

//! HTTP API for the chat front end.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/tools` - Tools the agent can call
//! - `POST /api/sessions` - Start a chat session
//! - `GET /api/sessions/:id/messages` - Session history
//! - `POST /api/sessions/:id/messages` - Send a user message, get the agent's reply
//! - `DELETE /api/sessions/:id` - End a session and discard its history

mod error;
mod routes;
pub mod types;

use std::sync::Arc;

pub use error::ApiError;
pub use routes::{router, AppState};

use crate::config::Config;
use crate::llm::OpenAiCompatibleClient;
use crate::session::SessionStore;
use crate::tools::default_registry;

/// Start the HTTP server and run until it fails.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let llm = Arc::new(OpenAiCompatibleClient::from_config(&config)?);
    let tools = Arc::new(default_registry(&config)?);
    tracing::info!("Registered {} tools", tools.len());

    let addr = format!("{}:{}", config.host, config.port);
    let sessions = SessionStore::new(config, llm, tools);
    sessions.spawn_sweeper();
    let state = Arc::new(AppState { sessions });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

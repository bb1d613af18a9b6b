//! Per-session chat state.
//!
//! Each session owns one [`Agent`] and therefore one conversation history.
//! Sessions start empty, live in memory only, and are discarded on removal
//! or once they sit idle longer than the configured TTL.
//! A session's agent sits behind an async mutex so turns within a session
//! never overlap, while different sessions proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::agent::Agent;
use crate::config::Config;
use crate::llm::CompletionClient;
use crate::tools::ToolRegistry;

/// One user's chat: identity plus the agent holding its history.
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub agent: Agent,
    last_active: Instant,
}

impl ChatSession {
    /// Mark the session as used now.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }
}

/// Public summary of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

pub type SharedSession = Arc<Mutex<ChatSession>>;

/// In-memory session map (non-persistent).
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
    config: Arc<Config>,
    llm: Arc<dyn CompletionClient>,
    tools: Arc<ToolRegistry>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(config: Config, llm: Arc<dyn CompletionClient>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl: config.session_idle_ttl,
            config: Arc::new(config),
            llm,
            tools,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Start a session with an empty history.
    ///
    /// Idle sessions are pruned first so abandoned ones do not pile up
    /// between sweeps.
    pub async fn create(&self) -> SessionInfo {
        self.prune_idle().await;

        let agent = Agent::from_config(
            &self.config,
            Arc::clone(&self.llm),
            Arc::clone(&self.tools),
        );
        let session = ChatSession {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            agent,
            last_active: Instant::now(),
        };
        let info = SessionInfo {
            id: session.id,
            created_at: session.created_at,
        };

        self.sessions
            .write()
            .await
            .insert(info.id, Arc::new(Mutex::new(session)));
        tracing::info!(session = %info.id, "Session created");
        info
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// End a session, discarding its history. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "Session removed");
        }
        removed
    }

    /// Drop every session idle for at least the TTL and return how many went.
    ///
    /// A session whose lock is held is mid-turn and always survives.
    pub async fn prune_idle(&self) -> usize {
        let ttl = self.idle_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session
                .try_lock()
                .map_or(true, |session| session.idle_for() < ttl);
            if !keep {
                tracing::info!(session = %id, "Session expired after idling");
            }
            keep
        });
        before - sessions.len()
    }

    /// Run [`prune_idle`](Self::prune_idle) in the background for the life
    /// of the process.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        let period = (self.idle_ttl / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let evicted = store.prune_idle().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Swept idle sessions");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

//! HTTP surface: a JSON API over sessions plus one static page.
//!
//! Every browser tab creates its own session (`POST /api/sessions`) and
//! drives it through the batch → review → finalize → download flow. Each
//! session sits behind its own async mutex, so a long model call blocks
//! only that session.

mod handlers;

use crate::assistant::ArchiveAssistant;
use crate::config::ServerConfig;
use crate::session::Session;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

pub use handlers::*;

/// Live sessions by id, each with the time it was last used.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, (Arc<Mutex<Session>>, Instant)>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session and return a handle to it.
    pub async fn create(&self) -> Arc<Mutex<Session>> {
        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .await
            .insert(id, (Arc::clone(&handle), Instant::now()));
        info!("Session {} started", id);
        handle
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        let mut sessions = self.sessions.write().await;
        let (handle, last_seen) = sessions.get_mut(&id)?;
        *last_seen = Instant::now();
        Some(Arc::clone(handle))
    }

    /// End a session, dropping its records, document, and cache.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {} ended", id);
        }
        removed
    }

    /// End every session unused for at least `max_idle`. Sessions in the
    /// middle of an action are kept. Returns how many were ended.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, (handle, last_seen)| {
            let keep = last_seen.elapsed() < max_idle || handle.try_lock().is_err();
            if !keep {
                debug!("Session {} idle, ending it", id);
            }
            keep
        });
        let ended = before - sessions.len();
        if ended > 0 {
            info!("Ended {} idle sessions, {} remain", ended, sessions.len());
        }
        ended
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Periodically end sessions idle for longer than `max_idle`.
pub fn spawn_idle_sweeper(store: Arc<SessionStore>, max_idle: Duration) -> JoinHandle<()> {
    let period = (max_idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            store.sweep_idle(max_idle).await;
        }
    })
}

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<ArchiveAssistant>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(assistant: ArchiveAssistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

/// Build the router with all endpoints.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health_check))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/batch", post(submit_batch))
        .route("/api/sessions/{id}/records/{record_id}", patch(update_record))
        .route("/api/sessions/{id}/finalize", post(finalize_session))
        .route("/api/sessions/{id}/document", get(download_document))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start_server(state: AppState, config: &ServerConfig) -> Result<(), std::io::Error> {
    info!("Starting archive assistant on http://{}", config.bind_addr);

    let sweeper = spawn_idle_sweeper(
        Arc::clone(&state.sessions),
        Duration::from_secs(config.session_idle_secs),
    );
    let app = build_router(state, config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    let served = axum::serve(listener, app).await;
    sweeper.abort();
    served
}

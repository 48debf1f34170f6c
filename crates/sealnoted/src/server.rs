//! HTTP server assembly: shared state, router, listener

use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use sealnote_crypto::HashParams;
use sealnote_store::Store;

use crate::{auth, notes};

/// Read-only shared state: the store (which owns the body cipher), the
/// token-signing secret, and the password work factor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub token_secret: Arc<Vec<u8>>,
    pub hash_params: HashParams,
}

impl AppState {
    pub fn new(store: Store, token_secret: Vec<u8>, hash_params: HashParams) -> Self {
        Self {
            store: Arc::new(store),
            token_secret: Arc::new(token_secret),
            hash_params,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/notes", get(notes::list_handler).post(notes::create_handler))
        .route(
            "/notes/{id}",
            put(notes::update_handler).delete(notes::delete_handler),
        )
        .route("/tags", get(notes::tags_handler))
        .with_state(state)
}

/// Serve the API on `addr` (e.g. "127.0.0.1:5000") until the process exits.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {addr}: {e}"))?;

    tracing::info!(addr = %addr, "api: listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("api server: {e}"))
}

/// Liveness: 200 whenever the process is up, no auth.
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

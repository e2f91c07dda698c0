pub mod cards;
pub mod error;
pub mod users;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use pinka_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Shared bot secret: keys the initData HMAC derivation and
    /// authenticates the bot channel's x-bot-token header.
    pub bot_token: String,
}

/// All API routes. Cross-cutting layers (CORS, tracing) are applied by the
/// server binary; tests drive this router directly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/users/ensure", post(users::ensure))
        .route("/api/users/ensure-bot", post(users::ensure_bot))
        .route("/api/users", get(users::list))
        .route("/api/cards", post(cards::create).get(cards::list))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

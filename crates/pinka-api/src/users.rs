use axum::{Json, extract::State, http::HeaderMap};
use chrono::Utc;
use pinka_auth::verify_init_data;
use pinka_types::api::{EnsureBotRequest, EnsureRequest, UserListResponse, UserResponse};
use pinka_types::models::{Channel, UserProfile};
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;

const LIST_LIMIT: u32 = 5000;

/// Mini-App channel: the signed initData payload is the authentication.
pub async fn ensure(
    State(state): State<AppState>,
    Json(req): Json<EnsureRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if req.init_data.is_empty() {
        return Err(ApiError::MissingField("initData"));
    }

    let verified = verify_init_data(&req.init_data, &state.bot_token)?;
    if verified.id < 1 {
        return Err(ApiError::OutOfRange("user id"));
    }

    let profile = UserProfile {
        username: verified.username,
        first_name: verified.first_name,
        last_name: verified.last_name,
        language_code: verified.language_code,
    };
    let row = state
        .db
        .touch_user(Channel::MiniApp, verified.id, &profile, Utc::now())?;
    debug!(tg_id = verified.id, "miniapp launch recorded");

    Ok(Json(UserResponse {
        ok: true,
        user: row.into_user(),
    }))
}

/// Bot channel: server-to-server, authenticated by the shared secret
/// header. An exact match is required.
pub async fn ensure_bot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EnsureBotRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let token = headers
        .get("x-bot-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if token.is_empty() || token != state.bot_token {
        return Err(ApiError::Unauthorized);
    }

    // tgId arrives as a raw JSON value; anything but a positive integer
    // (strings, fractions, null) is a 400.
    let tg_id = match &req.tg_id {
        None | Some(serde_json::Value::Null) => return Err(ApiError::MissingField("tgId")),
        Some(v) => v.as_i64().ok_or(ApiError::OutOfRange("tgId"))?,
    };
    if tg_id < 1 {
        return Err(ApiError::OutOfRange("tgId"));
    }

    let profile = UserProfile {
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        language_code: req.language_code,
    };
    let row = state.db.touch_user(Channel::Bot, tg_id, &profile, Utc::now())?;
    debug!(tg_id, "bot start recorded");

    Ok(Json(UserResponse {
        ok: true,
        user: row.into_user(),
    }))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<UserListResponse>, ApiError> {
    let users = state
        .db
        .list_users(LIST_LIMIT)?
        .into_iter()
        .map(|row| row.into_user())
        .collect();
    Ok(Json(UserListResponse { ok: true, users }))
}

use serde::{Deserialize, Serialize};

use crate::models::{Card, RemoteUser};

// -- Users --

#[derive(Debug, Deserialize)]
pub struct EnsureRequest {
    /// Opaque signed payload handed to the Mini-App by the platform.
    #[serde(rename = "initData", default)]
    pub init_data: String,
}

/// Bot-channel presence event, authenticated by the x-bot-token header.
/// `tg_id` stays a raw JSON value at the wire level so that a missing,
/// non-numeric, or fractional id maps to a 400 in the handler instead of
/// a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureBotRequest {
    #[serde(default)]
    pub tg_id: Option<serde_json::Value>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub language_code: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub ok: bool,
    pub user: RemoteUser,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub ok: bool,
    pub users: Vec<RemoteUser>,
}

// -- Cards --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    #[serde(default)]
    pub card_no: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub card_type: String,
    #[serde(default)]
    pub series: String,
    #[serde(default)]
    pub collection_name: String,
    pub owner_tg_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub ok: bool,
    pub card: Card,
}

#[derive(Debug, Serialize)]
pub struct CardListResponse {
    pub ok: bool,
    pub cards: Vec<Card>,
}

// -- Errors --

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use pinka_db::StoreError;
use pinka_db::models::CardRow;
use pinka_types::api::{CardListResponse, CardResponse, CreateCardRequest};
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;

const LIST_LIMIT: u32 = 5000;

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), ApiError> {
    let issuer = req.issuer.trim();
    let card_type = req.card_type.trim();
    let series = req.series.trim();
    let collection_name = req.collection_name.trim();
    if issuer.is_empty() {
        return Err(ApiError::MissingField("issuer"));
    }
    if card_type.is_empty() {
        return Err(ApiError::MissingField("cardType"));
    }
    if series.is_empty() {
        return Err(ApiError::MissingField("series"));
    }
    if collection_name.is_empty() {
        return Err(ApiError::MissingField("collectionName"));
    }
    let owner_tg_id = req.owner_tg_id.ok_or(ApiError::MissingField("ownerTgId"))?;
    if owner_tg_id < 1 {
        return Err(ApiError::OutOfRange("ownerTgId"));
    }

    let now = Utc::now();
    let utc_date = now.format("%Y-%m-%d").to_string();
    let utc_time = now.format("%H:%M:%S").to_string();

    // A duplicate here means another writer persisted the same kid between
    // our probe and this insert. One fresh allocation covers that race.
    let mut attempt = 0;
    let row = loop {
        let kid = state.db.allocate_kid()?;
        let row = CardRow {
            kid,
            card_no: req.card_no.trim().to_string(),
            issuer: issuer.to_string(),
            card_type: card_type.to_string(),
            series: series.to_string(),
            collection_name: collection_name.to_string(),
            owner_tg_id,
            utc_date: utc_date.clone(),
            utc_time: utc_time.clone(),
        };
        match state.db.insert_card(&row) {
            Ok(()) => break row,
            Err(StoreError::DuplicateIdentifier(kid)) if attempt == 0 => {
                warn!(%kid, "kid lost the allocation race, reallocating");
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    info!(kid = %row.kid, owner_tg_id, "card created");
    Ok((
        StatusCode::CREATED,
        Json(CardResponse {
            ok: true,
            card: row.into_card(),
        }),
    ))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<CardListResponse>, ApiError> {
    let cards = state
        .db
        .list_cards(LIST_LIMIT)?
        .into_iter()
        .map(|row| row.into_card())
        .collect();
    Ok(Json(CardListResponse { ok: true, cards }))
}

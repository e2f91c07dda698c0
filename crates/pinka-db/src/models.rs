//! Database row types — these map directly to SQLite rows.
//! Distinct from the pinka-types API models so the DB layer stays
//! independent of wire concerns like `presence_source`.

use chrono::{DateTime, Utc};
use pinka_types::models::{Card, PresenceSource, RemoteUser};

pub struct UserRow {
    pub tg_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub language_code: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub launch_count: i64,
    pub bot_start_count: i64,
    pub bot_started_at: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Attach the derived presence classification on the way out.
    pub fn into_user(self) -> RemoteUser {
        let presence_source =
            PresenceSource::from_counts(self.bot_start_count, self.launch_count);
        RemoteUser {
            tg_id: self.tg_id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            language_code: self.language_code,
            created_at: self.created_at,
            last_seen_at: self.last_seen_at,
            launch_count: self.launch_count,
            bot_start_count: self.bot_start_count,
            bot_started_at: self.bot_started_at,
            presence_source,
        }
    }
}

pub struct CardRow {
    pub kid: String,
    pub card_no: String,
    pub issuer: String,
    pub card_type: String,
    pub series: String,
    pub collection_name: String,
    pub owner_tg_id: i64,
    pub utc_date: String,
    pub utc_time: String,
}

impl CardRow {
    pub fn into_card(self) -> Card {
        Card {
            kid: self.kid,
            card_no: self.card_no,
            issuer: self.issuer,
            card_type: self.card_type,
            series: self.series,
            collection_name: self.collection_name,
            owner_tg_id: self.owner_tg_id,
            utc_date: self.utc_date,
            utc_time: self.utc_time,
        }
    }
}

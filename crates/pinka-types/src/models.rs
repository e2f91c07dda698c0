use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two independent write paths feeding the presence ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    MiniApp,
    Bot,
}

/// How a user has been observed so far. Derived from the two presence
/// counters on read — never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceSource {
    #[serde(rename = "BOT")]
    Bot,
    #[serde(rename = "MINIAPP")]
    MiniApp,
    #[serde(rename = "BOT+MINIAPP")]
    BotAndMiniApp,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl PresenceSource {
    pub fn from_counts(bot_start_count: i64, launch_count: i64) -> Self {
        match (bot_start_count > 0, launch_count > 0) {
            (true, true) => Self::BotAndMiniApp,
            (true, false) => Self::Bot,
            (false, true) => Self::MiniApp,
            (false, false) => Self::Unknown,
        }
    }
}

/// Last-known profile fields for a Telegram identity. Full overwrite on
/// every contact — the latest writer wins, per field set, not per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub language_code: String,
}

/// One record per Telegram user, fed by both the bot and the Mini-App.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUser {
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
    pub presence_source: PresenceSource,
}

/// A catalog card. The `kid` is its permanent public identity, allocated
/// once at creation and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
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

use chrono::{DateTime, Utc};
use pinka_types::models::{Channel, UserProfile};
use rand_core::{OsRng, RngCore};
use rusqlite::{OptionalExtension, Row, params};

use crate::models::{CardRow, UserRow};
use crate::{Database, StoreError};

/// The allocator's probe loop is a likelihood optimization; the PRIMARY KEY
/// on cards.kid is the actual guarantee. Six attempts mirrors the original
/// deployment and is unreachable in practice with 128-bit identifiers.
const KID_ATTEMPTS: u32 = 6;
const KID_BYTES: usize = 16;

// Presence upsert, one statement per channel. Each branch touches a
// disjoint field set: the calling channel's counter is seeded to 1 on
// insert and incremented on conflict, the other counter appears only as a
// 0 seed, and created_at never appears in the conflict branch. Keeping the
// statements as fixed per-channel text is what enforces that structurally.
const TOUCH_MINIAPP_SQL: &str = "
    INSERT INTO users (tg_id, username, first_name, last_name, language_code,
                       created_at, last_seen_at,
                       launch_count, bot_start_count, bot_started_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 1, 0, NULL)
    ON CONFLICT(tg_id) DO UPDATE SET
        username      = excluded.username,
        first_name    = excluded.first_name,
        last_name     = excluded.last_name,
        language_code = excluded.language_code,
        last_seen_at  = excluded.last_seen_at,
        launch_count  = launch_count + 1
    RETURNING tg_id, username, first_name, last_name, language_code,
              created_at, last_seen_at,
              launch_count, bot_start_count, bot_started_at";

const TOUCH_BOT_SQL: &str = "
    INSERT INTO users (tg_id, username, first_name, last_name, language_code,
                       created_at, last_seen_at,
                       launch_count, bot_start_count, bot_started_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 0, 1, ?6)
    ON CONFLICT(tg_id) DO UPDATE SET
        username        = excluded.username,
        first_name      = excluded.first_name,
        last_name       = excluded.last_name,
        language_code   = excluded.language_code,
        last_seen_at    = excluded.last_seen_at,
        bot_start_count = bot_start_count + 1,
        bot_started_at  = excluded.bot_started_at
    RETURNING tg_id, username, first_name, last_name, language_code,
              created_at, last_seen_at,
              launch_count, bot_start_count, bot_started_at";

impl Database {
    // -- Presence ledger --

    /// Record one contact from `channel` for `tg_id` and return the row as
    /// it stands afterwards. A single conditional upsert: no read before
    /// the write, so concurrent calls can never drop a count.
    pub fn touch_user(
        &self,
        channel: Channel,
        tg_id: i64,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<UserRow, StoreError> {
        let sql = match channel {
            Channel::MiniApp => TOUCH_MINIAPP_SQL,
            Channel::Bot => TOUCH_BOT_SQL,
        };

        self.with_conn(|conn| {
            let row = conn.query_row(
                sql,
                params![
                    tg_id,
                    profile.username,
                    profile.first_name,
                    profile.last_name,
                    profile.language_code,
                    now,
                ],
                map_user_row,
            )?;
            Ok(row)
        })
    }

    pub fn get_user(&self, tg_id: i64) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT tg_id, username, first_name, last_name, language_code,
                            created_at, last_seen_at,
                            launch_count, bot_start_count, bot_started_at
                     FROM users WHERE tg_id = ?1",
                    [tg_id],
                    map_user_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Most recently seen first.
    pub fn list_users(&self, limit: u32) -> Result<Vec<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT tg_id, username, first_name, last_name, language_code,
                        created_at, last_seen_at,
                        launch_count, bot_start_count, bot_started_at
                 FROM users ORDER BY last_seen_at DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], map_user_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Kid allocation --

    /// Allocate a kid no currently stored card uses. The probe keeps the
    /// happy path collision-free; losing the race to another writer is
    /// still rejected later by the cards.kid constraint.
    pub fn allocate_kid(&self) -> Result<String, StoreError> {
        self.with_conn(|conn| {
            for _ in 0..KID_ATTEMPTS {
                let kid = gen_kid();
                let taken = conn
                    .query_row("SELECT 1 FROM cards WHERE kid = ?1", [&kid], |_| Ok(()))
                    .optional()?;
                if taken.is_none() {
                    return Ok(kid);
                }
            }
            Err(StoreError::AllocationExhausted(KID_ATTEMPTS))
        })
    }

    // -- Cards --

    pub fn insert_card(&self, card: &CardRow) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cards (kid, card_no, issuer, card_type, series,
                                    collection_name, owner_tg_id, utc_date, utc_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    card.kid,
                    card.card_no,
                    card.issuer,
                    card.card_type,
                    card.series,
                    card.collection_name,
                    card.owner_tg_id,
                    card.utc_date,
                    card.utc_time,
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(f, ref msg)
                    if f.code == rusqlite::ErrorCode::ConstraintViolation
                        && msg.as_deref().is_some_and(|m| m.contains("cards.kid")) =>
                {
                    StoreError::DuplicateIdentifier(card.kid.clone())
                }
                other => StoreError::Unavailable(other),
            })?;
            Ok(())
        })
    }

    /// Newest first, matching the original admin listing order.
    pub fn list_cards(&self, limit: u32) -> Result<Vec<CardRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT kid, card_no, issuer, card_type, series,
                        collection_name, owner_tg_id, utc_date, utc_time
                 FROM cards ORDER BY utc_date DESC, utc_time DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], map_card_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn gen_kid() -> String {
    let mut bytes = [0u8; KID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        tg_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        language_code: row.get(4)?,
        created_at: row.get(5)?,
        last_seen_at: row.get(6)?,
        launch_count: row.get(7)?,
        bot_start_count: row.get(8)?,
        bot_started_at: row.get(9)?,
    })
}

fn map_card_row(row: &Row<'_>) -> rusqlite::Result<CardRow> {
    Ok(CardRow {
        kid: row.get(0)?,
        card_no: row.get(1)?,
        issuer: row.get(2)?,
        card_type: row.get(3)?,
        series: row.get(4)?,
        collection_name: row.get(5)?,
        owner_tg_id: row.get(6)?,
        utc_date: row.get(7)?,
        utc_time: row.get(8)?,
    })
}

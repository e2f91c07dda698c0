use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            tg_id           INTEGER PRIMARY KEY CHECK (tg_id > 0),
            username        TEXT NOT NULL DEFAULT '',
            first_name      TEXT NOT NULL DEFAULT '',
            last_name       TEXT NOT NULL DEFAULT '',
            language_code   TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL,
            last_seen_at    TEXT NOT NULL,
            launch_count    INTEGER NOT NULL DEFAULT 0 CHECK (launch_count >= 0),
            bot_start_count INTEGER NOT NULL DEFAULT 0 CHECK (bot_start_count >= 0),
            bot_started_at  TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_users_last_seen
            ON users(last_seen_at DESC);

        -- kid uniqueness lives here, not in the allocator: two allocations
        -- that both pass the probe race down to this constraint.
        CREATE TABLE IF NOT EXISTS cards (
            kid             TEXT PRIMARY KEY,
            card_no         TEXT NOT NULL DEFAULT '',
            issuer          TEXT NOT NULL,
            card_type       TEXT NOT NULL,
            series          TEXT NOT NULL,
            collection_name TEXT NOT NULL,
            owner_tg_id     INTEGER NOT NULL,
            utc_date        TEXT NOT NULL,
            utc_time        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cards_owner
            ON cards(owner_tg_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

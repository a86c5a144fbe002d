use rusqlite::Connection;

use crate::error::Result;

/// Initialise the cache schema in `conn`. Safe to call on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cache_lists (
            key         TEXT    NOT NULL,
            position    INTEGER NOT NULL,
            value       TEXT    NOT NULL,   -- JSON-encoded element
            PRIMARY KEY (key, position)
        ) STRICT;

        -- One row per list that has been written at least once.
        CREATE TABLE IF NOT EXISTS cache_list_meta (
            key         TEXT    NOT NULL PRIMARY KEY,
            expires_at  INTEGER,            -- unix millis or NULL
            updated_at  TEXT    NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS cache_scalars (
            key         TEXT    NOT NULL PRIMARY KEY,
            value       TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        ) STRICT;
        ",
    )?;
    Ok(())
}

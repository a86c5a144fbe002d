use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Utc};
use matchwatch_core::{Fixture, Player};
use rusqlite::{Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::{
    db::init_db,
    error::{CacheError, Result},
};

/// Ordered list of today's and upcoming fixtures.
pub const FIXTURES_KEY: &str = "fixtures";
/// Scalar holding the active competition round.
pub const ROUND_KEY: &str = "current_round";
pub const ROSTER_TTL_DAYS: i64 = 7;

pub fn roster_key(team_id: u64) -> String {
    format!("team:{team_id}:players")
}

/// Fixture, roster and scalar state backed by SQLite.
///
/// Thread-safe: the connection sits behind a Mutex so every operation is a
/// single writer at a time, and multi-row writes run inside one transaction so
/// readers only ever see a whole list. No lock is held outside a method call.
pub struct FixtureCache {
    conn: Mutex<Connection>,
}

impl FixtureCache {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// All cached fixtures in order; empty if the list was never populated.
    pub fn list_fixtures(&self) -> Result<Vec<Fixture>> {
        match self.try_list_fixtures() {
            Err(CacheError::Uninitialized { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Like [`list_fixtures`](Self::list_fixtures) but reports a list that was
    /// never written as [`CacheError::Uninitialized`].
    pub fn try_list_fixtures(&self) -> Result<Vec<Fixture>> {
        let conn = self.lock()?;
        read_list(&conn, FIXTURES_KEY, now_millis())?.ok_or_else(|| CacheError::Uninitialized {
            key: FIXTURES_KEY.to_string(),
        })
    }

    /// Swap the whole fixture list. Readers see either the old or the new list.
    pub fn replace_fixture_list(&self, fixtures: &[Fixture]) -> Result<()> {
        check_unique(fixtures)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_list(&tx, FIXTURES_KEY, fixtures, None)?;
        tx.commit()?;

        info!(count = fixtures.len(), "fixture list replaced");
        Ok(())
    }

    /// Read, rebuild and swap the fixture list under one lock and transaction.
    ///
    /// `rebuild` gets the cached list (`None` if never written) and returns the
    /// replacement, or `None` to leave the cache as it is. No other write can
    /// land between the read and the swap, so enrichment merged from the
    /// cached list is never stale. `rebuild` must not call back into the cache.
    /// Returns whether the list was replaced.
    pub fn reconcile_fixture_list<F>(&self, rebuild: F) -> Result<bool>
    where
        F: FnOnce(Option<Vec<Fixture>>) -> Option<Vec<Fixture>>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let cached = read_list(&tx, FIXTURES_KEY, now_millis())?;

        let Some(fixtures) = rebuild(cached) else {
            return Ok(false);
        };
        check_unique(&fixtures)?;
        write_list(&tx, FIXTURES_KEY, &fixtures, None)?;
        tx.commit()?;

        info!(count = fixtures.len(), "fixture list reconciled");
        Ok(true)
    }

    /// Read-modify-write a single cached fixture.
    ///
    /// `apply` returns whether it changed anything; nothing is written when it
    /// returns `false`. Returns the fixture as it now stands, or `None` if no
    /// fixture with `id` is cached.
    pub fn update_fixture<F>(&self, id: u64, apply: F) -> Result<Option<Fixture>>
    where
        F: FnOnce(&mut Fixture) -> bool,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Collect eagerly so `stmt` is dropped before the UPDATE below.
        let rows: Vec<(i64, String)> = {
            let mut stmt = tx.prepare_cached(
                "SELECT position, value FROM cache_lists WHERE key = ?1 ORDER BY position",
            )?;
            let rows = stmt
                .query_map([FIXTURES_KEY], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut found = None;
        for (position, value) in rows {
            let fixture: Fixture = serde_json::from_str(&value)?;
            if fixture.id == id {
                found = Some((position, fixture));
                break;
            }
        }
        let Some((position, mut fixture)) = found else {
            return Ok(None);
        };

        if apply(&mut fixture) {
            let json = serde_json::to_string(&fixture)?;
            tx.execute(
                "UPDATE cache_lists SET value = ?1 WHERE key = ?2 AND position = ?3",
                rusqlite::params![json, FIXTURES_KEY, position],
            )?;
            tx.execute(
                "UPDATE cache_list_meta SET updated_at = ?1 WHERE key = ?2",
                rusqlite::params![Utc::now().to_rfc3339(), FIXTURES_KEY],
            )?;
            tx.commit()?;
            debug!(fixture_id = id, "cached fixture updated");
        }
        Ok(Some(fixture))
    }

    /// Cached roster for `team_id`; `None` on a miss or after expiry.
    pub fn get_roster(&self, team_id: u64) -> Result<Option<Vec<Player>>> {
        let conn = self.lock()?;
        read_list(&conn, &roster_key(team_id), now_millis())
    }

    pub fn put_roster(&self, team_id: u64, players: &[Player], ttl: Duration) -> Result<()> {
        let expires_at = now_millis() + ttl.num_milliseconds();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_list(&tx, &roster_key(team_id), players, Some(expires_at))?;
        tx.commit()?;
        debug!(team_id, count = players.len(), "roster cached");
        Ok(())
    }

    pub fn get_scalar(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM cache_scalars WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_scalar(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO cache_scalars (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

fn check_unique(fixtures: &[Fixture]) -> Result<()> {
    let mut seen = HashSet::new();
    match fixtures.iter().find(|f| !seen.insert(f.id)) {
        Some(dup) => Err(CacheError::DuplicateFixture { id: dup.id }),
        None => Ok(()),
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `None` when the list was never written or has expired.
fn read_list<T: DeserializeOwned>(conn: &Connection, key: &str, now: i64) -> Result<Option<Vec<T>>> {
    let meta: Option<Option<i64>> = conn
        .query_row(
            "SELECT expires_at FROM cache_list_meta WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;

    match meta {
        None => return Ok(None),
        Some(Some(expires_at)) if expires_at <= now => {
            debug!(key, "cache list expired");
            return Ok(None);
        }
        Some(_) => {}
    }

    let mut stmt =
        conn.prepare_cached("SELECT value FROM cache_lists WHERE key = ?1 ORDER BY position")?;
    let values = stmt
        .query_map([key], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let items = values
        .iter()
        .map(|v| serde_json::from_str(v))
        .collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(Some(items))
}

/// Delete-then-bulk-write. Callers run this inside a transaction.
fn write_list<T: Serialize>(
    conn: &Connection,
    key: &str,
    items: &[T],
    expires_at: Option<i64>,
) -> Result<()> {
    conn.execute("DELETE FROM cache_lists WHERE key = ?1", [key])?;
    {
        let mut insert = conn.prepare_cached(
            "INSERT INTO cache_lists (key, position, value) VALUES (?1, ?2, ?3)",
        )?;
        for (position, item) in items.iter().enumerate() {
            let json = serde_json::to_string(item)?;
            insert.execute(rusqlite::params![key, position as i64, json])?;
        }
    }
    conn.execute(
        "INSERT INTO cache_list_meta (key, expires_at, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET expires_at = excluded.expires_at,
                                        updated_at = excluded.updated_at",
        rusqlite::params![key, expires_at, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

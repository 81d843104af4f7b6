mod db;

use std::{
    fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::types::LeaderboardEntry;
use db::{entry_from_row, ENTRY_COLUMNS, RANK_ORDER};

/// SQLite-backed leaderboard, one board per track.
///
/// The top-N read and the write on the client side are not atomic, so the
/// capacity cut happens here: every insert trims its track back to capacity
/// inside the same transaction and reports where the new entry landed.
pub struct LeaderboardStore {
    conn: Mutex<Connection>,
}

impl LeaderboardStore {
    /// Open (or create) `leaderboard.db` under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, String> {
        fs::create_dir_all(data_dir)
            .map_err(|e| format!("failed to create data dir {}: {e}", data_dir.display()))?;

        let db_path = data_dir.join("leaderboard.db");
        let conn = Connection::open(&db_path)
            .map_err(|e| format!("failed to open SQLite at {}: {e}", db_path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;
             PRAGMA synchronous=NORMAL;",
        )
        .map_err(|e| format!("failed to set pragmas: {e}"))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                entry_id    TEXT PRIMARY KEY,
                track_id    TEXT NOT NULL,
                name        TEXT NOT NULL,
                time_ms     INTEGER NOT NULL,
                blob        TEXT NOT NULL,
                checksum    TEXT NOT NULL,
                created_at  INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_entries_track_time
                ON entries(track_id, time_ms, created_at);",
        )
        .map_err(|e| format!("failed to create schema: {e}"))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.conn
            .lock()
            .map_err(|_| "leaderboard store lock poisoned".to_string())
    }

    /// Inserts `entry` and trims its track to `capacity`. Returns the
    /// 1-based rank, or `None` if the entry was trimmed straight away.
    pub fn insert_ranked(
        &self,
        entry: &LeaderboardEntry,
        capacity: usize,
    ) -> Result<Option<u32>, String> {
        let entry_id = Uuid::new_v4().to_string();
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| format!("failed to begin insert: {e}"))?;

        Self::insert_row(&tx, &entry_id, entry)?;

        tx.execute(
            &format!(
                "DELETE FROM entries
                 WHERE track_id = ?1 AND entry_id NOT IN (
                     SELECT entry_id FROM entries WHERE track_id = ?1
                     ORDER BY {RANK_ORDER} LIMIT ?2
                 )"
            ),
            params![entry.track_id, capacity as i64],
        )
        .map_err(|e| format!("trim failed: {e}"))?;

        let rank = {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT entry_id FROM entries WHERE track_id = ?1 ORDER BY {RANK_ORDER}"
                ))
                .map_err(|e| format!("rank query failed: {e}"))?;
            let ids = stmt
                .query_map(params![entry.track_id], |row| row.get::<_, String>(0))
                .map_err(|e| format!("rank query failed: {e}"))?;

            let mut rank = None;
            for (index, id) in ids.enumerate() {
                if id.map_err(|e| format!("rank row failed: {e}"))? == entry_id {
                    rank = Some(index as u32 + 1);
                    break;
                }
            }
            rank
        };

        tx.commit()
            .map_err(|e| format!("failed to commit insert: {e}"))?;
        Ok(rank)
    }

    /// Up to `limit` entries for `track_id`, fastest first.
    pub fn top(&self, track_id: &str, limit: usize) -> Result<Vec<LeaderboardEntry>, String> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM entries WHERE track_id = ?1
                 ORDER BY {RANK_ORDER} LIMIT ?2"
            ))
            .map_err(|e| format!("top query failed: {e}"))?;
        let rows = stmt
            .query_map(params![track_id, limit as i64], entry_from_row)
            .map_err(|e| format!("top query failed: {e}"))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| format!("failed to read entry: {e}"))?);
        }
        Ok(entries)
    }

    /// Removes every entry for `track_id`.
    pub fn clear_track(&self, track_id: &str) -> Result<usize, String> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM entries WHERE track_id = ?1", params![track_id])
            .map_err(|e| format!("clear failed: {e}"))
    }

    pub fn count(&self) -> Result<usize, String> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .map_err(|e| format!("count failed: {e}"))?;
        Ok(count as usize)
    }
}

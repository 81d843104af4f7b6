use rusqlite::{params, Connection, Row};

use super::*;

pub(super) const ENTRY_COLUMNS: &str = "name, time_ms, blob, checksum, track_id, created_at";

/// Fastest first; on equal times the earlier submission keeps its place.
pub(super) const RANK_ORDER: &str = "time_ms ASC, created_at ASC, rowid ASC";

impl LeaderboardStore {
    /// Insert one entry row.
    pub(super) fn insert_row(
        conn: &Connection,
        entry_id: &str,
        entry: &LeaderboardEntry,
    ) -> Result<(), String> {
        conn.execute(
            "INSERT INTO entries (
                entry_id, track_id, name, time_ms, blob, checksum, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                entry_id,
                entry.track_id,
                entry.name,
                entry.time as i64,
                entry.blob,
                entry.checksum,
                entry.created_at_unix_s as i64,
            ],
        )
        .map_err(|e| format!("insert entry failed: {e}"))?;
        Ok(())
    }
}

pub(super) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LeaderboardEntry> {
    let time_ms: i64 = row.get(1)?;
    let created_at: i64 = row.get(5)?;
    Ok(LeaderboardEntry {
        name: row.get(0)?,
        time: time_ms as u32,
        blob: row.get(2)?,
        checksum: row.get(3)?,
        track_id: row.get(4)?,
        created_at_unix_s: created_at as u64,
    })
}

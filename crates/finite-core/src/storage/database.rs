//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - The countdown-event catalog, kept in display order
//! - "Already notified" flags for expiry notifications

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::data_dir;
use crate::countdown::{CountdownEvent, EventKind, NewEvent};
use crate::error::{DatabaseError, Result};
use crate::notify::NotificationLedger;

/// Current schema version. Increment when adding a migration.
const SCHEMA_VERSION: i32 = 1;

const EVENT_COLUMNS: &str = "id, name, kind, target_at, created_at, motto, description, \
                             birth_date, expected_lifespan, position";

/// SQLite database for countdown events and notification flags.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/finite.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("finite.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and throwaway hosts).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn schema_version(&self) -> Result<i32, rusqlite::Error> {
        self.conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .optional()
            .map(|v| v.unwrap_or(0))
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );",
        )?;

        if self.schema_version()? < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS events (
                    id                TEXT PRIMARY KEY,
                    name              TEXT NOT NULL,
                    kind              TEXT NOT NULL,
                    target_at         TEXT NOT NULL,
                    created_at        TEXT NOT NULL,
                    motto             TEXT,
                    description       TEXT,
                    birth_date        TEXT,
                    expected_lifespan REAL,
                    position          INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS notified_events (
                    event_id    TEXT PRIMARY KEY,
                    notified_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_events_position ON events(position);

                DELETE FROM schema_version;",
            )?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
        }
        Ok(())
    }

    // ── Countdown events ─────────────────────────────────────────────

    /// Add an event at the end of the list.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn create_event(&self, new: NewEvent) -> Result<CountdownEvent> {
        let position: u32 =
            self.conn
                .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        let event = new.into_event(Utc::now(), position);
        self.insert_event(&event)?;
        Ok(event)
    }

    fn insert_event(&self, event: &CountdownEvent) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            &format!("INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                event.id,
                event.name,
                event.kind.as_str(),
                event.target_at.to_rfc3339(),
                event.created_at.to_rfc3339(),
                event.motto,
                event.description,
                event.birth_date.map(|d| d.to_rfc3339()),
                event.expected_lifespan,
                event.position,
            ],
        )?;
        Ok(())
    }

    /// All events in display order.
    pub fn list_events(&self) -> Result<Vec<CountdownEvent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY position, created_at"))?;
        let rows = stmt.query_map([], event_from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    pub fn get_event(&self, id: &str) -> Result<Option<CountdownEvent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"))?;
        Ok(stmt.query_row(params![id], event_from_row).optional()?)
    }

    fn require_event(&self, id: &str) -> Result<CountdownEvent> {
        self.get_event(id)?
            .ok_or_else(|| DatabaseError::NotFound { id: id.to_string() }.into())
    }

    /// Overwrite the stored fields of an existing event. Position is not
    /// changed here; use [`Database::move_event`].
    pub fn update_event(&self, event: &CountdownEvent) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE events SET name = ?2, kind = ?3, target_at = ?4, motto = ?5,
                description = ?6, birth_date = ?7, expected_lifespan = ?8
             WHERE id = ?1",
            params![
                event.id,
                event.name,
                event.kind.as_str(),
                event.target_at.to_rfc3339(),
                event.motto,
                event.description,
                event.birth_date.map(|d| d.to_rfc3339()),
                event.expected_lifespan,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                id: event.id.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Remove an event and close the gap in positions.
    pub fn delete_event(&self, id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { id: id.to_string() }.into());
        }
        let ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM events ORDER BY position, created_at")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        for (position, id) in ids.iter().enumerate() {
            tx.execute(
                "UPDATE events SET position = ?1 WHERE id = ?2",
                params![position as u32, id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Move an event to `new_position`, shifting the events in between by
    /// one. Positions past the end are clamped to the last slot.
    pub fn move_event(&self, id: &str, new_position: u32) -> Result<()> {
        let event = self.require_event(id)?;
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        let new_position = new_position.min(count.saturating_sub(1));
        let old_position = event.position;
        if old_position == new_position {
            return Ok(());
        }

        let tx = self.conn.unchecked_transaction()?;
        if old_position < new_position {
            tx.execute(
                "UPDATE events SET position = position - 1
                 WHERE position > ?1 AND position <= ?2",
                params![old_position, new_position],
            )?;
        } else {
            tx.execute(
                "UPDATE events SET position = position + 1
                 WHERE position >= ?1 AND position < ?2",
                params![new_position, old_position],
            )?;
        }
        tx.execute(
            "UPDATE events SET position = ?1 WHERE id = ?2",
            params![new_position, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ── Notification flags ───────────────────────────────────────────

    pub fn is_notified(&self, event_id: &str) -> Result<bool, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT 1 FROM notified_events WHERE event_id = ?1",
                params![event_id],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
    }

    /// Record that `event_id` was announced. Returns `true` if this call
    /// inserted the flag, `false` if it was already set.
    pub fn set_notified(&self, event_id: &str) -> Result<bool, rusqlite::Error> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO notified_events (event_id, notified_at) VALUES (?1, ?2)",
            params![event_id, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted == 1)
    }
}

fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<CountdownEvent> {
    let kind: String = row.get(2)?;
    let kind = EventKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown event kind '{kind}'").into(),
        )
    })?;
    let birth_date = match row.get::<_, Option<String>>(7)? {
        Some(raw) => Some(parse_ts(7, raw)?),
        None => None,
    };
    Ok(CountdownEvent {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        target_at: parse_ts(3, row.get(3)?)?,
        created_at: parse_ts(4, row.get(4)?)?,
        motto: row.get(5)?,
        description: row.get(6)?,
        birth_date,
        expected_lifespan: row.get(8)?,
        position: row.get(9)?,
    })
}

/// The connection is not shareable across threads on its own, so the
/// ledger lives behind a mutex. Storage errors count as "not notified" on
/// read and are logged on write.
impl NotificationLedger for Mutex<Database> {
    fn has_notified(&self, event_id: &str) -> bool {
        let Ok(db) = self.lock() else { return false };
        db.is_notified(event_id).unwrap_or_else(|e| {
            tracing::warn!(event_id, error = %e, "could not read notification flag");
            false
        })
    }

    fn mark_notified(&self, event_id: &str) {
        if let Ok(db) = self.lock() {
            if let Err(e) = db.set_notified(event_id) {
                tracing::warn!(event_id, error = %e, "could not store notification flag");
            }
        }
    }

    fn claim(&self, event_id: &str) -> bool {
        let Ok(db) = self.lock() else { return false };
        db.set_notified(event_id).unwrap_or_else(|e| {
            tracing::warn!(event_id, error = %e, "could not store notification flag");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn target(y: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap()
    }

    fn names(db: &Database) -> Vec<String> {
        db.list_events()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    fn positions(db: &Database) -> Vec<u32> {
        db.list_events()
            .unwrap()
            .into_iter()
            .map(|e| e.position)
            .collect()
    }

    fn seeded() -> (Database, Vec<String>) {
        let db = Database::open_in_memory().unwrap();
        let ids = ["a", "b", "c", "d"]
            .iter()
            .map(|n| db.create_event(NewEvent::custom(*n, target(2030))).unwrap().id)
            .collect();
        (db, ids)
    }

    #[test]
    fn create_and_get() {
        let db = Database::open_in_memory().unwrap();
        let new = NewEvent::life("Life", target(1990), 80.0)
            .unwrap()
            .with_motto(Some("carpe diem".into()));
        let created = db.create_event(new).unwrap();
        let loaded = db.get_event(&created.id).unwrap().unwrap();
        assert_eq!(loaded.kind, EventKind::Life);
        assert_eq!(loaded.birth_date, Some(target(1990)));
        assert_eq!(loaded.expected_lifespan, Some(80.0));
        assert_eq!(loaded.motto.as_deref(), Some("carpe diem"));
        assert_eq!(loaded.target_at, created.target_at);
    }

    #[test]
    fn positions_are_appended() {
        let (db, _) = seeded();
        assert_eq!(names(&db), ["a", "b", "c", "d"]);
        assert_eq!(positions(&db), [0, 1, 2, 3]);
    }

    #[test]
    fn delete_compacts_positions() {
        let (db, ids) = seeded();
        db.delete_event(&ids[1]).unwrap();
        assert_eq!(names(&db), ["a", "c", "d"]);
        assert_eq!(positions(&db), [0, 1, 2]);
        assert!(db.delete_event(&ids[1]).is_err());
    }

    #[test]
    fn move_down_and_up() {
        let (db, ids) = seeded();
        db.move_event(&ids[0], 2).unwrap();
        assert_eq!(names(&db), ["b", "c", "a", "d"]);
        db.move_event(&ids[3], 0).unwrap();
        assert_eq!(names(&db), ["d", "b", "c", "a"]);
        assert_eq!(positions(&db), [0, 1, 2, 3]);
    }

    #[test]
    fn move_past_end_is_clamped() {
        let (db, ids) = seeded();
        db.move_event(&ids[0], 99).unwrap();
        assert_eq!(names(&db), ["b", "c", "d", "a"]);
    }

    #[test]
    fn move_unknown_is_not_found() {
        let (db, _) = seeded();
        let err = db.move_event("nope", 0).unwrap_err();
        assert!(matches!(
            err,
            crate::CoreError::Database(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn update_keeps_position() {
        let (db, ids) = seeded();
        let mut event = db.get_event(&ids[2]).unwrap().unwrap();
        event.name = "renamed".into();
        event.target_at = target(2040);
        db.update_event(&event).unwrap();
        let loaded = db.get_event(&ids[2]).unwrap().unwrap();
        assert_eq!(loaded.name, "renamed");
        assert_eq!(loaded.target_at, target(2040));
        assert_eq!(loaded.position, 2);
    }

    #[test]
    fn notified_flag_is_monotonic() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.is_notified("e").unwrap());
        assert!(db.set_notified("e").unwrap());
        assert!(!db.set_notified("e").unwrap());
        assert!(db.is_notified("e").unwrap());
    }

    #[test]
    fn database_ledger_claims_once() {
        let ledger = Mutex::new(Database::open_in_memory().unwrap());
        assert!(ledger.claim("e"));
        assert!(!ledger.claim("e"));
        assert!(ledger.has_notified("e"));
    }

    #[test]
    fn reopening_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finite.db");
        let id = {
            let db = Database::open_at(&path).unwrap();
            db.create_event(NewEvent::custom("keep", target(2030))).unwrap().id
        };
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.get_event(&id).unwrap().unwrap().name, "keep");
    }
}

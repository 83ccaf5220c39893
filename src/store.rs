use std::path::Path;

use chrono::Local;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::note::Note;

/// Sortable local timestamp format stored in the date columns.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not open the notes database")]
    Unavailable(#[source] rusqlite::Error),
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("note {0} not found")]
    NotFound(i64),
    #[error("database error")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The note library: one SQLite table, one row per note.
pub struct NoteStore {
    conn: Connection,
}

impl NoteStore {
    /// Open (and create if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(StoreError::Unavailable)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Self { conn };
        store.init_schema()?;
        debug!("opened note store at {}", path.display());
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Unavailable)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS note (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                creationDate TEXT NOT NULL,
                modificationDate TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn now() -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// All notes, most recently modified first.
    pub fn list_all(&self) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, creationDate, modificationDate
             FROM note ORDER BY modificationDate DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Note {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                created: row.get(3)?,
                modified: row.get(4)?,
            })
        })?;
        let mut notes = Vec::new();
        for note in rows {
            notes.push(note?);
        }
        Ok(notes)
    }

    pub fn load(&self, id: i64) -> Result<Note> {
        self.conn
            .query_row(
                "SELECT id, title, content, creationDate, modificationDate
                 FROM note WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Note {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        content: row.get(2)?,
                        created: row.get(3)?,
                        modified: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
    }

    /// Insert a new note and return its id.
    pub fn create(&self, title: &str, content: &str) -> Result<i64> {
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO note (title, content, creationDate, modificationDate)
             VALUES (?1, ?2, ?3, ?4)",
            params![title, content, now, now],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("created note {id}");
        Ok(id)
    }

    /// Overwrite title and content, bumping the modification date.
    pub fn update(&self, id: i64, title: &str, content: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE note SET title = ?1, content = ?2, modificationDate = ?3
             WHERE id = ?4",
            params![title, content, Self::now(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!("updated note {id}");
        Ok(())
    }

    /// Remove a note. Deleting an id that no longer exists is not an error.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM note WHERE id = ?1", params![id])?;
        debug!("deleted note {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_fresh_ids() {
        let store = NoteStore::open_in_memory().unwrap();
        let a = store.create("a", "<p>a</p>").unwrap();
        let b = store.create("b", "<p>b</p>").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn list_orders_by_modification_then_id() {
        let store = NoteStore::open_in_memory().unwrap();
        let first = store.create("first", "").unwrap();
        let second = store.create("second", "").unwrap();
        let third = store.create("third", "").unwrap();

        store.update(first, "first (edited)", "").unwrap();
        store.delete(second).unwrap();

        let notes = store.list_all().unwrap();
        let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![first, third]);
        assert_eq!(notes[0].title, "first (edited)");
    }

    #[test]
    fn update_preserves_id_and_creation_date() {
        let store = NoteStore::open_in_memory().unwrap();
        let id = store.create("t", "<p>v1</p>").unwrap();
        let before = store.load(id).unwrap();

        store.update(id, "t2", "<p>v2</p>").unwrap();
        let after = store.load(id).unwrap();

        assert_eq!(after.id, id);
        assert_eq!(after.created, before.created);
        assert_eq!(after.content, "<p>v2</p>");
        assert!(after.modified >= before.modified);
    }

    #[test]
    fn missing_note_is_not_found() {
        let store = NoteStore::open_in_memory().unwrap();
        assert!(matches!(store.load(42), Err(StoreError::NotFound(42))));
        assert!(matches!(
            store.update(42, "t", ""),
            Err(StoreError::NotFound(42))
        ));
    }

    #[test]
    fn delete_missing_note_is_a_no_op() {
        let store = NoteStore::open_in_memory().unwrap();
        assert!(store.delete(42).is_ok());
    }

    #[test]
    fn opens_on_disk_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        let id = {
            let store = NoteStore::open(&path).unwrap();
            store.create("persisted", "<p>x</p>").unwrap()
        };
        let store = NoteStore::open(&path).unwrap();
        let note = store.load(id).unwrap();
        assert_eq!(note.title, "persisted");
    }
}

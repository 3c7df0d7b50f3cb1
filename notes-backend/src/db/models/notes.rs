//! Note database operations

use rusqlite::{params, Connection, OptionalExtension};

use super::super::sqlite::{now_ts, ts_column};
use super::super::{Database, DbResult};
use crate::models::{Note, NoteChanges, NoteFields, NoteInput};

const NOTE_COLUMNS: &str = "id, title, content, url, author_id, created, updated";

impl Database {
    /// Insert a note owned by `author_id`
    pub fn create_note(&self, author_id: i64, input: &NoteInput) -> DbResult<Note> {
        let conn = self.conn()?;
        let now = now_ts();

        conn.execute(
            "INSERT INTO notes (title, content, url, author_id, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![input.title, input.content, input.url, author_id, now],
        )?;
        let id = conn.last_insert_rowid();

        let note = fetch_note(&conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        log::info!("[NOTES] Created note {} for user {}", note.id, author_id);
        Ok(note)
    }

    pub fn get_note(&self, id: i64) -> DbResult<Option<Note>> {
        let conn = self.conn()?;
        Ok(fetch_note(&conn, id)?)
    }

    /// All notes regardless of author, newest first
    pub fn list_notes(&self) -> DbResult<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes ORDER BY created DESC, id DESC",
            NOTE_COLUMNS
        ))?;

        let notes = stmt
            .query_map([], row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    /// Apply `changes` to a note and refresh `updated`.
    ///
    /// `created` and `author_id` are never written. Returns `None` when the note does not exist.
    pub fn update_note(&self, id: i64, changes: &NoteChanges) -> DbResult<Option<Note>> {
        let conn = self.conn()?;

        let rows = conn.execute(
            "UPDATE notes SET
                title = COALESCE(?1, title),
                content = COALESCE(?2, content),
                url = COALESCE(?3, url),
                updated = ?4
             WHERE id = ?5",
            params![changes.title, changes.content, changes.url, now_ts(), id],
        )?;

        if rows == 0 {
            return Ok(None);
        }

        log::info!("[NOTES] Updated note {}", id);
        Ok(fetch_note(&conn, id)?)
    }

    /// Delete a note, returning whether it existed
    pub fn delete_note(&self, id: i64) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        if rows > 0 {
            log::info!("[NOTES] Deleted note {}", id);
        }
        Ok(rows > 0)
    }
}

fn fetch_note(conn: &Connection, id: i64) -> rusqlite::Result<Option<Note>> {
    conn.query_row(
        &format!("SELECT {} FROM notes WHERE id = ?1", NOTE_COLUMNS),
        [id],
        row_to_note,
    )
    .optional()
}

fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        fields: NoteFields {
            title: row.get(1)?,
            content: row.get(2)?,
            url: row.get(3)?,
            author_id: row.get(4)?,
            created: ts_column(row, 5)?,
            updated: ts_column(row, 6)?,
        },
    })
}

// src/db/notes.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::activity::{self, Entry};
use crate::domain::enums::ActivityAction;
use crate::domain::pipeline::Pipeline;
use crate::domain::records::Note;
use crate::errors::ServerError;

fn select_sql<P: Pipeline>() -> String {
    format!(
        "select n.id, n.{col}, n.author_id, u.name, n.content, n.created_at
         from {table} n
         left join users u on u.id = n.author_id",
        col = P::PARENT_COLUMN,
        table = P::NOTES_TABLE
    )
}

fn note_from_row<P: Pipeline>(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        parent_key: P::PARENT_KEY,
        parent_id: row.get(1)?,
        author_id: row.get(2)?,
        author_name: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Appends a note and its NOTE_ADDED audit row.
pub fn insert_note<P: Pipeline>(
    conn: &Connection,
    parent_id: i64,
    author_id: i64,
    content: &str,
    now: DateTime<Utc>,
) -> Result<Note, ServerError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ServerError::BadRequest("content is required".into()));
    }

    conn.execute(
        &format!(
            "insert into {} ({}, author_id, content, created_at) values (?, ?, ?, ?)",
            P::NOTES_TABLE,
            P::PARENT_COLUMN
        ),
        params![parent_id, author_id, content, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert note failed: {e}")))?;
    let id = conn.last_insert_rowid();

    activity::record::<P>(
        conn,
        parent_id,
        Some(author_id),
        Entry::with_value(ActivityAction::NoteAdded, content),
        now,
    )?;

    get_note::<P>(conn, id)
}

pub fn get_note<P: Pipeline>(conn: &Connection, id: i64) -> Result<Note, ServerError> {
    conn.query_row(
        &format!("{} where n.id = ?", select_sql::<P>()),
        params![id],
        note_from_row::<P>,
    )
    .optional()?
    .ok_or_else(|| ServerError::NotFound(format!("{} note {id} not found", P::LABEL)))
}

/// Newest first.
pub fn list_notes<P: Pipeline>(conn: &Connection, parent_id: i64) -> Result<Vec<Note>, ServerError> {
    let sql = format!(
        "{} where n.{} = ? order by n.created_at desc, n.id desc",
        select_sql::<P>(),
        P::PARENT_COLUMN
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![parent_id], note_from_row::<P>)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn delete_note<P: Pipeline>(conn: &Connection, id: i64) -> Result<(), ServerError> {
    let n = conn.execute(
        &format!("delete from {} where id = ?", P::NOTES_TABLE),
        params![id],
    )?;
    if n == 0 {
        return Err(ServerError::NotFound(format!("{} note {id} not found", P::LABEL)));
    }
    Ok(())
}

// src/db/users.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::enums::Role;
use crate::domain::user::User;
use crate::errors::ServerError;

const USER_COLUMNS: &str = "id, name, email, role, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Insert a user. Email should already be normalized by caller (trim/lowercase).
pub fn insert_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    now: DateTime<Utc>,
) -> Result<User, ServerError> {
    conn.execute(
        "insert into users (name, email, password_hash, role, created_at) values (?, ?, ?, ?, ?)",
        params![name.trim(), email, password_hash, role, now],
    )
    .map_err(|e| match ServerError::from(e) {
        ServerError::BadRequest(_) => ServerError::BadRequest("email already registered".into()),
        other => other,
    })?;

    get_user(conn, conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<User, ServerError> {
    conn.query_row(
        &format!("select {USER_COLUMNS} from users where id = ?"),
        params![id],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| ServerError::NotFound(format!("user {id} not found")))
}

/// Returns the user together with its stored password hash.
pub fn find_credentials(
    conn: &Connection,
    email: &str,
) -> Result<Option<(User, String)>, ServerError> {
    let row = conn
        .query_row(
            &format!("select {USER_COLUMNS}, password_hash from users where email = ?"),
            params![email],
            |r| Ok((user_from_row(r)?, r.get::<_, String>(5)?)),
        )
        .optional()?;
    Ok(row)
}

pub fn count_users(conn: &Connection) -> Result<i64, ServerError> {
    Ok(conn.query_row("select count(*) from users", [], |r| r.get(0))?)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, ServerError> {
    let mut stmt = conn.prepare(&format!("select {USER_COLUMNS} from users order by name"))?;
    let rows = stmt.query_map([], user_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn user_exists(conn: &Connection, id: i64) -> Result<bool, ServerError> {
    let found: Option<i64> = conn
        .query_row("select id from users where id = ?", params![id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

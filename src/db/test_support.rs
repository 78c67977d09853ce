// src/db/test_support.rs
//! In-memory database fixtures shared by the db unit tests.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::connection::SCHEMA_SQL;
use crate::domain::enums::{
    CollegeFollowUpStatus, CollegeStatus, FollowUpStatus, LeadStatus, Role,
};

pub(crate) fn memory_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    conn.execute_batch(SCHEMA_SQL).unwrap();
    conn
}

/// Inserts a user named after the local part of `email`.
pub(crate) fn seed_user(conn: &Connection, email: &str, role: Role) -> i64 {
    let name = email.split('@').next().unwrap_or(email);
    conn.execute(
        "insert into users (name, email, password_hash, role, created_at) values (?, ?, 'x', ?, ?)",
        params![name, email, role, Utc::now()],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub(crate) fn seed_lead(conn: &Connection, name: &str, owner: i64) -> i64 {
    let now = Utc::now();
    conn.execute(
        "insert into leads (name, phone, status, follow_up_status, follow_up_date,
            assigned_to_id, created_by_id, created_at, updated_at)
         values (?1, '9000000000', ?2, ?3, ?4, ?5, ?5, ?4, ?4)",
        params![name, LeadStatus::New, FollowUpStatus::Pending, now, owner],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub(crate) fn seed_college(conn: &Connection, name: &str, owner: i64) -> i64 {
    let now = Utc::now();
    conn.execute(
        "insert into colleges (name, status, follow_up_status, follow_up_date,
            assigned_to_id, created_by_id, created_at, updated_at)
         values (?1, ?2, ?3, ?4, ?5, ?5, ?4, ?4)",
        params![name, CollegeStatus::New, CollegeFollowUpStatus::Pending, now, owner],
    )
    .unwrap();
    conn.last_insert_rowid()
}

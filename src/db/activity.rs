// src/db/activity.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::tracking::scope_clause;
use crate::domain::enums::ActivityAction;
use crate::domain::pipeline::{FieldChange, Pipeline};
use crate::domain::records::ActivityLog;
use crate::domain::user::Scope;
use crate::errors::ServerError;

/// One audit row to append.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub action: ActivityAction,
    pub field: Option<&'a str>,
    pub old_value: Option<&'a str>,
    pub new_value: Option<&'a str>,
}

impl<'a> Entry<'a> {
    pub fn action(action: ActivityAction) -> Self {
        Self {
            action,
            field: None,
            old_value: None,
            new_value: None,
        }
    }

    pub fn with_value(action: ActivityAction, new_value: &'a str) -> Self {
        Self {
            new_value: Some(new_value),
            ..Self::action(action)
        }
    }
}

impl<'a> From<&'a FieldChange> for Entry<'a> {
    fn from(c: &'a FieldChange) -> Self {
        Self {
            action: c.action,
            field: Some(c.field),
            old_value: c.old_value.as_deref(),
            new_value: c.new_value.as_deref(),
        }
    }
}

pub fn record<P: Pipeline>(
    conn: &Connection,
    parent_id: i64,
    user_id: Option<i64>,
    entry: Entry<'_>,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    conn.execute(
        &format!(
            "insert into {} ({}, user_id, action, field, old_value, new_value, created_at)
             values (?, ?, ?, ?, ?, ?, ?)",
            P::ACTIVITY_TABLE,
            P::PARENT_COLUMN
        ),
        params![
            parent_id,
            user_id,
            entry.action,
            entry.field,
            entry.old_value,
            entry.new_value,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert activity failed: {e}")))?;
    Ok(())
}

pub fn record_changes<P: Pipeline>(
    conn: &Connection,
    parent_id: i64,
    user_id: Option<i64>,
    changes: &[FieldChange],
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    for change in changes {
        record::<P>(conn, parent_id, user_id, change.into(), now)?;
    }
    Ok(())
}

fn select_sql<P: Pipeline>() -> String {
    format!(
        "select a.id, a.{col}, a.user_id, u.name, a.action, a.field, a.old_value, a.new_value, a.created_at
         from {table} a
         left join users u on u.id = a.user_id",
        col = P::PARENT_COLUMN,
        table = P::ACTIVITY_TABLE
    )
}

fn log_from_row<P: Pipeline>(row: &Row<'_>) -> rusqlite::Result<ActivityLog> {
    Ok(ActivityLog {
        id: row.get(0)?,
        parent_key: P::PARENT_KEY,
        parent_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        action: row.get(4)?,
        field: row.get(5)?,
        old_value: row.get(6)?,
        new_value: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Newest first.
pub fn list_for<P: Pipeline>(conn: &Connection, parent_id: i64) -> Result<Vec<ActivityLog>, ServerError> {
    let sql = format!(
        "{} where a.{} = ? order by a.created_at desc, a.id desc",
        select_sql::<P>(),
        P::PARENT_COLUMN
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![parent_id], log_from_row::<P>)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Latest activity across every record visible in `scope`.
pub fn recent<P: Pipeline>(
    conn: &Connection,
    scope: Scope,
    limit: i64,
) -> Result<Vec<ActivityLog>, ServerError> {
    let (clause, mut values) = scope_clause(scope, "e");
    let sql = format!(
        "{select} join {entity} e on e.id = a.{col} where {clause}
         order by a.created_at desc, a.id desc limit ?",
        select = select_sql::<P>(),
        entity = P::ENTITY_TABLE,
        col = P::PARENT_COLUMN,
    );
    values.push(limit.into());

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values), log_from_row::<P>)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

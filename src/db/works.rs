// src/db/works.rs
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::str::FromStr;

use crate::db::activity::{self, Entry};
use crate::db::tracking::{parse_id, scope_clause, work_title};
use crate::domain::dates::day_bounds;
use crate::domain::enums::{ActivityAction, WorkStatus};
use crate::domain::pipeline::Pipeline;
use crate::domain::records::Work;
use crate::domain::user::Scope;
use crate::errors::ServerError;

/// Due-date window filter for work listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueWindow {
    Today,
    Overdue,
    Upcoming,
}

impl FromStr for DueWindow {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "today" => Ok(DueWindow::Today),
            "overdue" => Ok(DueWindow::Overdue),
            "upcoming" => Ok(DueWindow::Upcoming),
            other => Err(ServerError::BadRequest(format!(
                "invalid due filter '{other}' (expected today, overdue or upcoming)"
            ))),
        }
    }
}

#[derive(Debug, Default)]
pub struct WorkFilter {
    pub status: Option<WorkStatus>,
    pub due: Option<DueWindow>,
    pub parent_id: Option<i64>,
}

impl WorkFilter {
    pub fn from_params<P: Pipeline>(params: &HashMap<String, String>) -> Result<Self, ServerError> {
        let non_empty = |key: &str| params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        Ok(Self {
            status: non_empty("status").map(str::parse).transpose()?,
            due: non_empty("due").map(str::parse).transpose()?,
            parent_id: non_empty(P::PARENT_KEY)
                .map(|v| parse_id(P::PARENT_KEY, v))
                .transpose()?,
        })
    }
}

fn select_sql<P: Pipeline>() -> String {
    format!(
        "select w.id, w.{col}, e.name, w.assigned_to_id, w.title, w.status, w.due_date,
                w.completed_at, w.created_at, w.updated_at
         from {works} w
         join {entity} e on e.id = w.{col}",
        col = P::PARENT_COLUMN,
        works = P::WORKS_TABLE,
        entity = P::ENTITY_TABLE
    )
}

fn work_from_row<P: Pipeline>(row: &Row<'_>) -> rusqlite::Result<Work> {
    Ok(Work {
        id: row.get(0)?,
        parent_key: P::PARENT_KEY,
        parent_id: row.get(1)?,
        parent_name: row.get(2)?,
        assigned_to_id: row.get(3)?,
        title: row.get(4)?,
        status: row.get(5)?,
        due_date: row.get(6)?,
        completed_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub fn insert_work<P: Pipeline>(
    conn: &Connection,
    parent_id: i64,
    assigned_to_id: Option<i64>,
    title: &str,
    due: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    conn.execute(
        &format!(
            "insert into {} ({}, assigned_to_id, title, status, due_date, created_at, updated_at)
             values (?, ?, ?, ?, ?, ?, ?)",
            P::WORKS_TABLE,
            P::PARENT_COLUMN
        ),
        params![parent_id, assigned_to_id, title, WorkStatus::Pending, due, now, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert work failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_work<P: Pipeline>(conn: &Connection, id: i64) -> Result<Work, ServerError> {
    conn.query_row(
        &format!("{} where w.id = ?", select_sql::<P>()),
        params![id],
        work_from_row::<P>,
    )
    .optional()?
    .ok_or_else(|| ServerError::NotFound(format!("{} work {id} not found", P::LABEL)))
}

/// Oldest open work of a parent, if any.
fn find_open<P: Pipeline>(conn: &Connection, parent_id: i64) -> Result<Option<i64>, ServerError> {
    Ok(conn
        .query_row(
            &format!(
                "select id from {} where {} = ? and status = ? order by id limit 1",
                P::WORKS_TABLE,
                P::PARENT_COLUMN
            ),
            params![parent_id, WorkStatus::Pending],
            |r| r.get(0),
        )
        .optional()?)
}

/// Find-or-create the parent's open work and move it to `due`.
pub fn schedule_open<P: Pipeline>(
    conn: &Connection,
    parent_id: i64,
    assigned_to_id: Option<i64>,
    title: &str,
    due: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    match find_open::<P>(conn, parent_id)? {
        Some(work_id) => {
            conn.execute(
                &format!(
                    "update {} set due_date = ?, assigned_to_id = ?, updated_at = ? where id = ?",
                    P::WORKS_TABLE
                ),
                params![due, assigned_to_id, now, work_id],
            )?;
            Ok(work_id)
        }
        None => insert_work::<P>(conn, parent_id, assigned_to_id, title, due, now),
    }
}

/// Marks every open work of the parent completed. Returns how many changed.
pub fn close_open<P: Pipeline>(
    conn: &Connection,
    parent_id: i64,
    now: DateTime<Utc>,
) -> Result<usize, ServerError> {
    let n = conn.execute(
        &format!(
            "update {} set status = ?, completed_at = ?, updated_at = ?
             where {} = ? and status = ?",
            P::WORKS_TABLE,
            P::PARENT_COLUMN
        ),
        params![WorkStatus::Completed, now, now, parent_id, WorkStatus::Pending],
    )?;
    Ok(n)
}

pub fn list_for_parent<P: Pipeline>(conn: &Connection, parent_id: i64) -> Result<Vec<Work>, ServerError> {
    let sql = format!(
        "{} where w.{} = ? order by w.due_date, w.id",
        select_sql::<P>(),
        P::PARENT_COLUMN
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![parent_id], work_from_row::<P>)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Works visible in `scope`: those on visible parents or assigned to the caller.
pub fn list_works<P: Pipeline>(
    conn: &Connection,
    scope: Scope,
    filter: &WorkFilter,
    now: DateTime<Utc>,
) -> Result<Vec<Work>, ServerError> {
    let (scope_sql, mut values) = scope_clause(scope, "e");
    let mut conditions = vec![match scope {
        Scope::All => scope_sql,
        Scope::Owner(uid) => {
            values.push(uid.into());
            format!("({scope_sql} or w.assigned_to_id = ?)")
        }
    }];

    if let Some(status) = filter.status {
        conditions.push("w.status = ?".into());
        values.push(Value::Text(status.to_string()));
    }
    if let Some(parent_id) = filter.parent_id {
        conditions.push(format!("w.{} = ?", P::PARENT_COLUMN));
        values.push(parent_id.into());
    }

    let (day_start, day_end) = day_bounds(now);
    match filter.due {
        Some(DueWindow::Today) => {
            conditions.push("w.status = 'PENDING' and w.due_date >= ? and w.due_date < ?".into());
            values.push(sql_time(day_start)?);
            values.push(sql_time(day_end)?);
        }
        Some(DueWindow::Overdue) => {
            conditions.push("w.status = 'PENDING' and w.due_date < ?".into());
            values.push(sql_time(day_start)?);
        }
        Some(DueWindow::Upcoming) => {
            conditions.push("w.status = 'PENDING' and w.due_date >= ?".into());
            values.push(sql_time(day_end)?);
        }
        None => {}
    }

    let sql = format!(
        "{} where {} order by w.due_date, w.id",
        select_sql::<P>(),
        conditions.join(" and ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values), work_from_row::<P>)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Timestamp bound as the same TEXT form rusqlite writes for `DateTime<Utc>`,
/// so string comparison in SQL orders correctly.
pub(crate) fn sql_time(t: DateTime<Utc>) -> Result<Value, ServerError> {
    use rusqlite::types::{ToSql, ToSqlOutput};
    match t.to_sql()? {
        ToSqlOutput::Owned(v) => Ok(v),
        ToSqlOutput::Borrowed(v) => Ok(v.into()),
        _ => Err(ServerError::InternalError("unexpected timestamp encoding".into())),
    }
}

/// Partial edit of a work item.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::domain::dates::deserialize_opt_datetime")]
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<WorkStatus>,
}

pub fn update_work<P: Pipeline>(
    conn: &Connection,
    id: i64,
    update: &WorkUpdate,
    now: DateTime<Utc>,
) -> Result<Work, ServerError> {
    let current = get_work::<P>(conn, id)?;

    let title = match &update.title {
        Some(t) if t.trim().is_empty() => {
            return Err(ServerError::BadRequest("title must not be empty".into()))
        }
        Some(t) => t.trim().to_string(),
        None => current.title.clone(),
    };
    let due = update.due_date.unwrap_or(current.due_date);
    let status = update.status.unwrap_or(current.status);
    let completed_at = match (current.status, status) {
        (WorkStatus::Pending, WorkStatus::Completed) => Some(now),
        (_, WorkStatus::Pending) => None,
        (WorkStatus::Completed, WorkStatus::Completed) => current.completed_at,
    };

    conn.execute(
        &format!(
            "update {} set title = ?, due_date = ?, status = ?, completed_at = ?, updated_at = ?
             where id = ?",
            P::WORKS_TABLE
        ),
        params![title, due, status, completed_at, now, id],
    )?;
    get_work::<P>(conn, id)
}

/// [`update_work`] plus a WORK_COMPLETED audit row when the work gets closed.
pub fn edit_work<P: Pipeline>(
    conn: &Connection,
    id: i64,
    update: &WorkUpdate,
    actor: i64,
    now: DateTime<Utc>,
) -> Result<Work, ServerError> {
    let before = get_work::<P>(conn, id)?;
    let work = update_work::<P>(conn, id, update, now)?;

    if before.status == WorkStatus::Pending && work.status == WorkStatus::Completed {
        activity::record::<P>(
            conn,
            work.parent_id,
            Some(actor),
            Entry::with_value(ActivityAction::WorkCompleted, &work.title),
            now,
        )?;
    }
    Ok(work)
}

pub fn complete_work<P: Pipeline>(
    conn: &Connection,
    id: i64,
    actor: i64,
    now: DateTime<Utc>,
) -> Result<Work, ServerError> {
    let update = WorkUpdate {
        status: Some(WorkStatus::Completed),
        ..Default::default()
    };
    edit_work::<P>(conn, id, &update, actor, now)
}

/// Adds a manual work to a parent, defaulting title and assignee from the parent.
pub fn create_manual<P: Pipeline>(
    conn: &Connection,
    parent_id: i64,
    title: Option<&str>,
    due: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Work, ServerError> {
    let (name, assigned_to_id): (String, Option<i64>) = conn
        .query_row(
            &format!("select name, assigned_to_id from {} where id = ?", P::ENTITY_TABLE),
            params![parent_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| ServerError::NotFound(format!("{} {parent_id} not found", P::LABEL)))?;

    let title = match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => work_title::<P>(&name),
    };
    let id = insert_work::<P>(conn, parent_id, assigned_to_id, &title, due, now)?;
    get_work::<P>(conn, id)
}

pub fn delete_work<P: Pipeline>(conn: &Connection, id: i64) -> Result<(), ServerError> {
    let n = conn.execute(
        &format!("delete from {} where id = ?", P::WORKS_TABLE),
        params![id],
    )?;
    if n == 0 {
        return Err(ServerError::NotFound(format!("{} work {id} not found", P::LABEL)));
    }
    Ok(())
}

/// Start of the trailing seven-day window used by completion stats.
pub fn week_ago(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(7)
}

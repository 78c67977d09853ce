// src/db/tracking.rs

//! Pipeline-generic bookkeeping: access scope, list filters, and applying a
//! [`TrackingPlan`] (entity row, follow-up work, audit trail).

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

use crate::db::{activity, users, works};
use crate::domain::pipeline::{Pipeline, Tracking, TrackingPlan, WorkAction};
use crate::domain::user::{AuthUser, Scope};
use crate::errors::ServerError;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

/// SQL condition (and its bind values) limiting `alias` rows to `scope`.
pub fn scope_clause(scope: Scope, alias: &str) -> (String, Vec<Value>) {
    match scope {
        Scope::All => ("1 = 1".to_string(), Vec::new()),
        Scope::Owner(uid) => (
            format!("({alias}.assigned_to_id = ? or {alias}.created_by_id = ?)"),
            vec![uid.into(), uid.into()],
        ),
    }
}

/// Ownership columns of a pipeline record.
#[derive(Debug, Clone, Copy)]
pub struct Ownership {
    pub assigned_to_id: Option<i64>,
    pub created_by_id: Option<i64>,
}

/// Loads the tracked fields, failing with 404 when missing and 403 when outside `scope`.
pub fn load_tracking<P: Pipeline>(
    conn: &Connection,
    id: i64,
    scope: Scope,
) -> Result<Tracking<P>, ServerError> {
    let row = conn
        .query_row(
            &format!(
                "select status, follow_up_status, follow_up_date, assigned_to_id, created_by_id
                 from {} where id = ?",
                P::ENTITY_TABLE
            ),
            params![id],
            |r| {
                Ok((
                    Tracking::<P> {
                        status: r.get(0)?,
                        follow_up_status: r.get(1)?,
                        follow_up_date: r.get(2)?,
                        assigned_to_id: r.get(3)?,
                    },
                    Ownership {
                        assigned_to_id: r.get(3)?,
                        created_by_id: r.get(4)?,
                    },
                ))
            },
        )
        .optional()?;

    let Some((tracking, owner)) = row else {
        return Err(ServerError::NotFound(format!("{} {id} not found", P::LABEL)));
    };
    if !scope.allows(owner.assigned_to_id, owner.created_by_id) {
        return Err(ServerError::Forbidden(format!("{} {id} is not yours", P::LABEL)));
    }
    Ok(tracking)
}

/// Same checks as [`load_tracking`] without keeping the row.
pub fn ensure_visible<P: Pipeline>(conn: &Connection, id: i64, scope: Scope) -> Result<(), ServerError> {
    load_tracking::<P>(conn, id, scope).map(|_| ())
}

/// Rejects assignments to users that do not exist.
pub fn check_assignee(conn: &Connection, assigned_to_id: Option<i64>) -> Result<(), ServerError> {
    match assigned_to_id {
        Some(uid) if !users::user_exists(conn, uid)? => Err(ServerError::BadRequest(format!(
            "assignedToId {uid} does not match any user"
        ))),
        _ => Ok(()),
    }
}

/// Assignee of a new record: the caller unless an admin picks someone else.
pub fn creation_assignee<P: Pipeline>(actor: &AuthUser, requested: Option<i64>) -> Result<Option<i64>, ServerError> {
    match requested {
        Some(uid) if uid != actor.id && !actor.is_admin() => Err(ServerError::Forbidden(format!(
            "only admins can assign a {} to someone else",
            P::LABEL
        ))),
        Some(uid) => Ok(Some(uid)),
        None => Ok(Some(actor.id)),
    }
}

/// Only admins may move a record to a different assignee.
pub fn check_reassign<P: Pipeline>(
    actor: &AuthUser,
    current: Option<i64>,
    requested: Option<i64>,
) -> Result<(), ServerError> {
    match requested {
        Some(uid) if Some(uid) != current && !actor.is_admin() => Err(ServerError::Forbidden(format!(
            "only admins can reassign a {}",
            P::LABEL
        ))),
        _ => Ok(()),
    }
}

pub fn work_title<P: Pipeline>(name: &str) -> String {
    format!("Follow up with {} {}", P::LABEL, name.trim())
}

/// Persists the outcome of `plan_update` for record `id`.
pub fn apply_plan<P: Pipeline>(
    conn: &Connection,
    id: i64,
    name: &str,
    plan: &TrackingPlan<P>,
    actor: i64,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    let next = &plan.next;
    conn.execute(
        &format!(
            "update {} set status = ?, follow_up_status = ?, follow_up_date = ?,
                assigned_to_id = ?, updated_at = ?
             where id = ?",
            P::ENTITY_TABLE
        ),
        params![
            next.status,
            next.follow_up_status,
            next.follow_up_date,
            next.assigned_to_id,
            now,
            id
        ],
    )?;

    match plan.work {
        WorkAction::Schedule(due) => {
            works::schedule_open::<P>(conn, id, next.assigned_to_id, &work_title::<P>(name), due, now)?;
        }
        WorkAction::CloseOpen => {
            let closed = works::close_open::<P>(conn, id, now)?;
            if closed > 0 {
                tracing::debug!(kind = P::LABEL, id, closed, "closed open works");
            }
        }
        WorkAction::Keep => {}
    }

    activity::record_changes::<P>(conn, id, Some(actor), &plan.changes, now)
}

/// Parsed list query shared by the lead and college listings.
#[derive(Debug)]
pub struct ListQuery<P: Pipeline> {
    pub status: Option<P::Status>,
    pub follow_up_status: Option<P::FollowUp>,
    pub search: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl<P: Pipeline> Default for ListQuery<P> {
    fn default() -> Self {
        Self {
            status: None,
            follow_up_status: None,
            search: None,
            assigned_to_id: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

pub(crate) fn parse_id(key: &str, raw: &str) -> Result<i64, ServerError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ServerError::BadRequest(format!("{key} must be an integer")))
}

impl<P: Pipeline> ListQuery<P> {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ServerError> {
        let non_empty = |key: &str| params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let mut query = Self::default();
        if let Some(v) = non_empty("status") {
            query.status = Some(v.parse()?);
        }
        if let Some(v) = non_empty("followUpStatus") {
            query.follow_up_status = Some(v.parse()?);
        }
        query.search = non_empty("q").map(str::to_string);
        if let Some(v) = non_empty("assignedToId") {
            query.assigned_to_id = Some(parse_id("assignedToId", v)?);
        }
        if let Some(v) = non_empty("limit") {
            query.limit = parse_id("limit", v)?.clamp(1, MAX_PAGE_SIZE);
        }
        if let Some(v) = non_empty("offset") {
            query.offset = parse_id("offset", v)?.max(0);
        }
        Ok(query)
    }

    /// Same filters without paging; SQLite reads `limit -1` as unbounded.
    pub fn for_export(params: &HashMap<String, String>) -> Result<Self, ServerError> {
        let mut query = Self::from_params(params)?;
        query.limit = -1;
        query.offset = 0;
        Ok(query)
    }

    /// WHERE clause over entity alias `e`, combined with `scope`.
    pub fn where_clause(&self, scope: Scope) -> (String, Vec<Value>) {
        let (scope_sql, mut values) = scope_clause(scope, "e");
        let mut conditions = vec![scope_sql];

        if let Some(status) = self.status {
            conditions.push("e.status = ?".into());
            values.push(Value::Text(status.to_string()));
        }
        if let Some(follow_up) = self.follow_up_status {
            conditions.push("e.follow_up_status = ?".into());
            values.push(Value::Text(follow_up.to_string()));
        }
        if let Some(uid) = self.assigned_to_id {
            conditions.push("e.assigned_to_id = ?".into());
            values.push(uid.into());
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", search.to_lowercase());
            let ors: Vec<String> = P::SEARCH_COLUMNS
                .iter()
                .map(|col| format!("lower(coalesce(e.{col}, '')) like ?"))
                .collect();
            conditions.push(format!("({})", ors.join(" or ")));
            values.extend(P::SEARCH_COLUMNS.iter().map(|_| Value::Text(pattern.clone())));
        }

        (conditions.join(" and "), values)
    }
}

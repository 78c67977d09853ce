// src/db/dashboard.rs
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::activity;
use crate::db::tracking::scope_clause;
use crate::db::works::{sql_time, week_ago};
use crate::domain::dates::day_bounds;
use crate::domain::pipeline::{CollegePipeline, LeadPipeline, Pipeline, PipelineEnum};
use crate::domain::records::ActivityLog;
use crate::domain::user::Scope;
use crate::errors::ServerError;

const RECENT_ACTIVITY_LIMIT: i64 = 10;

/// Aggregates for one pipeline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_follow_up_status: BTreeMap<String, i64>,
    pub created_this_week: i64,
    pub open_works: i64,
    pub due_today: i64,
    pub overdue: i64,
    pub completed_last_7_days: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub leads: PipelineStats,
    pub colleges: PipelineStats,
    pub recent_activity: Vec<ActivityLog>,
    pub recent_college_activity: Vec<ActivityLog>,
}

pub fn dashboard_stats(
    conn: &Connection,
    scope: Scope,
    now: DateTime<Utc>,
) -> Result<DashboardStats, ServerError> {
    Ok(DashboardStats {
        leads: pipeline_stats::<LeadPipeline>(conn, scope, now)?,
        colleges: pipeline_stats::<CollegePipeline>(conn, scope, now)?,
        recent_activity: activity::recent::<LeadPipeline>(conn, scope, RECENT_ACTIVITY_LIMIT)?,
        recent_college_activity: activity::recent::<CollegePipeline>(
            conn,
            scope,
            RECENT_ACTIVITY_LIMIT,
        )?,
    })
}

fn count(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<i64, ServerError> {
    Ok(conn.query_row(sql, rusqlite::params_from_iter(values), |r| r.get(0))?)
}

/// Counts grouped by `column`, with every variant of `E` present.
fn grouped<E: PipelineEnum>(
    conn: &Connection,
    table: &str,
    column: &str,
    scope: Scope,
) -> Result<BTreeMap<String, i64>, ServerError> {
    let mut counts: BTreeMap<String, i64> =
        E::all().iter().map(|v| (v.as_str().to_string(), 0)).collect();

    let (clause, values) = scope_clause(scope, "e");
    let sql = format!("select e.{column}, count(*) from {table} e where {clause} group by e.{column}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values), |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (key, n) = row?;
        counts.insert(key, n);
    }
    Ok(counts)
}

pub fn pipeline_stats<P: Pipeline>(
    conn: &Connection,
    scope: Scope,
    now: DateTime<Utc>,
) -> Result<PipelineStats, ServerError> {
    let entity = P::ENTITY_TABLE;
    let (clause, scope_values) = scope_clause(scope, "e");
    let (day_start, day_end) = day_bounds(now);

    let total = count(
        conn,
        &format!("select count(*) from {entity} e where {clause}"),
        scope_values.clone(),
    )?;

    let mut values = scope_values.clone();
    values.push(sql_time(now - Duration::days(7))?);
    let created_this_week = count(
        conn,
        &format!("select count(*) from {entity} e where {clause} and e.created_at >= ?"),
        values,
    )?;

    // Work counters share the join onto the parent for scoping.
    let works_sql = |extra: &str| {
        format!(
            "select count(*) from {works} w join {entity} e on e.id = w.{col}
             where {clause} and {extra}",
            works = P::WORKS_TABLE,
            col = P::PARENT_COLUMN,
        )
    };

    let open_works = count(conn, &works_sql("w.status = 'PENDING'"), scope_values.clone())?;

    let mut values = scope_values.clone();
    values.push(sql_time(day_start)?);
    values.push(sql_time(day_end)?);
    let due_today = count(
        conn,
        &works_sql("w.status = 'PENDING' and w.due_date >= ? and w.due_date < ?"),
        values,
    )?;

    let mut values = scope_values.clone();
    values.push(sql_time(day_start)?);
    let overdue = count(conn, &works_sql("w.status = 'PENDING' and w.due_date < ?"), values)?;

    let mut values = scope_values;
    values.push(sql_time(week_ago(now))?);
    let completed_last_7_days = count(
        conn,
        &works_sql("w.status = 'COMPLETED' and w.completed_at >= ?"),
        values,
    )?;

    Ok(PipelineStats {
        total,
        by_status: grouped::<P::Status>(conn, entity, "status", scope)?,
        by_follow_up_status: grouped::<P::FollowUp>(conn, entity, "follow_up_status", scope)?,
        created_this_week,
        open_works,
        due_today,
        overdue,
        completed_last_7_days,
    })
}

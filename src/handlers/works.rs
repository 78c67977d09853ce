// src/handlers/works.rs
use astra::Request;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::tracking::ensure_visible;
use crate::db::works::{self, WorkFilter, WorkUpdate};
use crate::domain::dates::deserialize_opt_datetime;
use crate::domain::pipeline::Pipeline;
use crate::domain::records::Work;
use crate::domain::user::{AuthUser, Scope};
use crate::errors::{ResultResp, ServerError};
use crate::handlers::notes::parent_id_of;
use crate::handlers::{query_params, read_json};
use crate::responses::{json_response, no_content};
use crate::router::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewWork {
    title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_datetime")]
    due_date: Option<DateTime<Utc>>,
}

/// A work is visible when its parent is, or when it is assigned to the caller.
fn visible_work<P: Pipeline>(conn: &Connection, id: i64, caller: &AuthUser) -> Result<Work, ServerError> {
    let work = works::get_work::<P>(conn, id)?;
    match caller.scope() {
        Scope::Owner(uid) if work.assigned_to_id == Some(uid) => {}
        scope => ensure_visible::<P>(conn, work.parent_id, scope)?,
    }
    Ok(work)
}

pub fn list<P: Pipeline>(req: &Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let filter = WorkFilter::from_params::<P>(&query_params(req))?;
    let works = state
        .db
        .with_conn(|conn| works::list_works::<P>(conn, caller.scope(), &filter, Utc::now()))?;
    json_response(200, &works)
}

pub fn create<P: Pipeline>(req: &mut Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let body: serde_json::Value = read_json(req)?;
    let parent_id = parent_id_of::<P>(&body)?;
    let input: NewWork = serde_json::from_value(body)?;
    let due = input
        .due_date
        .ok_or_else(|| ServerError::BadRequest("dueDate is required".into()))?;

    let work = state.db.with_conn(|conn| {
        ensure_visible::<P>(conn, parent_id, caller.scope())?;
        works::create_manual::<P>(conn, parent_id, input.title.as_deref(), due, Utc::now())
    })?;
    json_response(201, &work)
}

pub fn get<P: Pipeline>(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    let work = state.db.with_conn(|conn| visible_work::<P>(conn, id, caller))?;
    json_response(200, &work)
}

pub fn update<P: Pipeline>(id: i64, req: &mut Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let update: WorkUpdate = read_json(req)?;
    let work = state.db.with_conn(|conn| {
        visible_work::<P>(conn, id, caller)?;
        works::edit_work::<P>(conn, id, &update, caller.id, Utc::now())
    })?;
    json_response(200, &work)
}

pub fn complete<P: Pipeline>(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    let work = state.db.with_conn(|conn| {
        visible_work::<P>(conn, id, caller)?;
        works::complete_work::<P>(conn, id, caller.id, Utc::now())
    })?;
    json_response(200, &work)
}

pub fn delete<P: Pipeline>(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    caller.require_admin()?;
    state.db.with_conn(|conn| works::delete_work::<P>(conn, id))?;
    no_content()
}

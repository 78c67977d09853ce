// src/handlers/colleges.rs
use astra::Request;
use chrono::Utc;

use crate::db::tracking::{ensure_visible, ListQuery};
use crate::db::{activity, colleges};
use crate::domain::college::{CollegeUpdate, NewCollege};
use crate::domain::pipeline::CollegePipeline;
use crate::domain::user::AuthUser;
use crate::errors::ResultResp;
use crate::handlers::{query_params, read_json};
use crate::responses::{json_response, no_content};
use crate::router::AppState;
use crate::spreadsheets::export_colleges_xlsx;

pub fn list(req: &Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let query = ListQuery::<CollegePipeline>::from_params(&query_params(req))?;
    let colleges = state
        .db
        .with_conn(|conn| colleges::list_colleges(conn, caller.scope(), &query))?;
    json_response(200, &colleges)
}

pub fn export(req: &Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let query = ListQuery::<CollegePipeline>::for_export(&query_params(req))?;
    let colleges = state
        .db
        .with_conn(|conn| colleges::list_colleges(conn, caller.scope(), &query))?;
    tracing::info!(rows = colleges.len(), user_id = caller.id, "exporting colleges");
    export_colleges_xlsx(&colleges, Utc::now())
}

pub fn create(req: &mut Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let input: NewCollege = read_json(req)?;
    let college = state
        .db
        .with_conn(|conn| colleges::create_college(conn, &input, caller, Utc::now()))?;
    json_response(201, &college)
}

pub fn detail(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    let detail = state
        .db
        .with_conn(|conn| colleges::college_detail(conn, id, caller.scope()))?;
    json_response(200, &detail)
}

pub fn update(id: i64, req: &mut Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let update: CollegeUpdate = read_json(req)?;
    let college = state
        .db
        .with_conn(|conn| colleges::update_college(conn, id, &update, caller, Utc::now()))?;
    json_response(200, &college)
}

pub fn delete(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    caller.require_admin()?;
    state.db.with_conn(|conn| colleges::delete_college(conn, id))?;
    tracing::info!(college_id = id, user_id = caller.id, "college deleted");
    no_content()
}

pub fn activity(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    let logs = state.db.with_conn(|conn| {
        ensure_visible::<CollegePipeline>(conn, id, caller.scope())?;
        activity::list_for::<CollegePipeline>(conn, id)
    })?;
    json_response(200, &logs)
}

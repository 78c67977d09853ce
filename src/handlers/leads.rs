// src/handlers/leads.rs
use astra::Request;
use chrono::Utc;

use crate::db::tracking::{ensure_visible, ListQuery};
use crate::db::{activity, leads};
use crate::domain::lead::{LeadUpdate, NewLead};
use crate::domain::pipeline::LeadPipeline;
use crate::domain::user::AuthUser;
use crate::errors::ResultResp;
use crate::handlers::{query_params, read_json};
use crate::responses::{json_response, no_content};
use crate::router::AppState;
use crate::spreadsheets::export_leads_xlsx;

pub fn list(req: &Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let query = ListQuery::<LeadPipeline>::from_params(&query_params(req))?;
    let leads = state
        .db
        .with_conn(|conn| leads::list_leads(conn, caller.scope(), &query))?;
    json_response(200, &leads)
}

pub fn export(req: &Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let query = ListQuery::<LeadPipeline>::for_export(&query_params(req))?;
    let leads = state
        .db
        .with_conn(|conn| leads::list_leads(conn, caller.scope(), &query))?;
    tracing::info!(rows = leads.len(), user_id = caller.id, "exporting leads");
    export_leads_xlsx(&leads, Utc::now())
}

pub fn create(req: &mut Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let input: NewLead = read_json(req)?;
    let lead = state
        .db
        .with_conn(|conn| leads::create_lead(conn, &input, caller, Utc::now()))?;
    json_response(201, &lead)
}

pub fn detail(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    let detail = state
        .db
        .with_conn(|conn| leads::lead_detail(conn, id, caller.scope()))?;
    json_response(200, &detail)
}

pub fn update(id: i64, req: &mut Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let update: LeadUpdate = read_json(req)?;
    let lead = state
        .db
        .with_conn(|conn| leads::update_lead(conn, id, &update, caller, Utc::now()))?;
    json_response(200, &lead)
}

pub fn delete(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    caller.require_admin()?;
    state.db.with_conn(|conn| leads::delete_lead(conn, id))?;
    tracing::info!(lead_id = id, user_id = caller.id, "lead deleted");
    no_content()
}

pub fn activity(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    let logs = state.db.with_conn(|conn| {
        ensure_visible::<LeadPipeline>(conn, id, caller.scope())?;
        activity::list_for::<LeadPipeline>(conn, id)
    })?;
    json_response(200, &logs)
}

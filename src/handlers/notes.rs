// src/handlers/notes.rs

//! Notes for either pipeline; the parent is named by `P::PARENT_KEY`
//! (`leadId` or `collegeId`) in the query string or body.

use astra::Request;
use chrono::Utc;
use serde::Deserialize;

use crate::db::notes;
use crate::db::tracking::{ensure_visible, parse_id};
use crate::domain::pipeline::Pipeline;
use crate::domain::user::AuthUser;
use crate::errors::{ResultResp, ServerError};
use crate::handlers::{query_params, read_json};
use crate::responses::{json_response, no_content};
use crate::router::AppState;

#[derive(Deserialize)]
struct NoteBody {
    content: String,
}

/// Reads the parent id from a JSON body under the pipeline's key.
pub(crate) fn parent_id_of<P: Pipeline>(body: &serde_json::Value) -> Result<i64, ServerError> {
    body.get(P::PARENT_KEY)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| ServerError::BadRequest(format!("{} is required", P::PARENT_KEY)))
}

pub fn list<P: Pipeline>(req: &Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let params = query_params(req);
    let raw = params
        .get(P::PARENT_KEY)
        .ok_or_else(|| ServerError::BadRequest(format!("{} is required", P::PARENT_KEY)))?;
    let parent_id = parse_id(P::PARENT_KEY, raw)?;

    let notes = state.db.with_conn(|conn| {
        ensure_visible::<P>(conn, parent_id, caller.scope())?;
        notes::list_notes::<P>(conn, parent_id)
    })?;
    json_response(200, &notes)
}

pub fn create<P: Pipeline>(req: &mut Request, state: &AppState, caller: &AuthUser) -> ResultResp {
    let body: serde_json::Value = read_json(req)?;
    let parent_id = parent_id_of::<P>(&body)?;
    let NoteBody { content } = serde_json::from_value(body)?;

    let note = state.db.with_conn(|conn| {
        ensure_visible::<P>(conn, parent_id, caller.scope())?;
        notes::insert_note::<P>(conn, parent_id, caller.id, &content, Utc::now())
    })?;
    json_response(201, &note)
}

/// Authors may delete their own notes; admins any note.
pub fn delete<P: Pipeline>(id: i64, state: &AppState, caller: &AuthUser) -> ResultResp {
    state.db.with_conn(|conn| {
        let note = notes::get_note::<P>(conn, id)?;
        if !caller.is_admin() && note.author_id != Some(caller.id) {
            return Err(ServerError::Forbidden("only the author or an admin can delete a note".into()));
        }
        notes::delete_note::<P>(conn, id)
    })?;
    no_content()
}

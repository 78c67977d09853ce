//! Route handlers. Each takes the parsed request parts plus the caller and
//! returns a JSON (or XLSX) response.

pub mod auth;
pub mod colleges;
pub mod dashboard;
pub mod leads;
pub mod notes;
pub mod works;

use astra::Request;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;

use crate::errors::ServerError;

const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Decode the JSON request body.
pub(crate) fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let mut raw = Vec::new();
    req.body_mut()
        .reader()
        .take(MAX_BODY_BYTES)
        .read_to_end(&mut raw)
        .map_err(|e| ServerError::BadRequest(format!("could not read request body: {e}")))?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(ServerError::BadRequest("request body is required".into()));
    }
    Ok(serde_json::from_slice(&raw)?)
}

pub(crate) fn query_params(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

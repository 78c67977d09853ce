use crate::auth::{bearer_token, JwtKeys};
use crate::config::Environment;
use crate::db::tracking::parse_id;
use crate::db::Database;
use crate::domain::pipeline::{CollegePipeline, LeadPipeline};
use crate::domain::user::AuthUser;
use crate::errors::ServerError;
use crate::handlers::{auth, colleges, dashboard, leads, notes, works};
use crate::responses::{json_response, ResultResp};
use astra::Request;
use serde_json::json;

/// Shared, immutable state handed to every worker.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtKeys,
    pub environment: Environment,
}

type L = LeadPipeline;
type C = CollegePipeline;

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Routes open to anonymous callers.
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "health"]) => return json_response(200, &json!({ "status": "ok" })),
        ("POST", ["api", "auth", "register"]) => {
            let caller = optional_caller(&req, state)?;
            return auth::register(&mut req, state, caller.as_ref());
        }
        ("POST", ["api", "auth", "login"]) => return auth::login(&mut req, state),
        (_, ["api", ..]) => {}
        _ => return Err(ServerError::NotFound(format!("no route for {method} {path}"))),
    }

    let user = authenticate(&req, state)?;

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "auth", "me"]) => auth::me(state, &user),
        ("GET", ["api", "auth", "users"]) => auth::list_users(state, &user),

        ("GET", ["api", "dashboard", "stats"]) => dashboard::stats(state, &user),

        // Leads
        ("GET", ["api", "leads"]) => leads::list(&req, state, &user),
        ("POST", ["api", "leads"]) => leads::create(&mut req, state, &user),
        ("GET", ["api", "leads", "export"]) => leads::export(&req, state, &user),
        ("GET", ["api", "leads", raw]) => leads::detail(path_id(raw)?, state, &user),
        ("PUT", ["api", "leads", raw]) => leads::update(path_id(raw)?, &mut req, state, &user),
        ("DELETE", ["api", "leads", raw]) => leads::delete(path_id(raw)?, state, &user),
        ("GET", ["api", "leads", raw, "activity"]) => leads::activity(path_id(raw)?, state, &user),

        ("GET", ["api", "notes"]) => notes::list::<L>(&req, state, &user),
        ("POST", ["api", "notes"]) => notes::create::<L>(&mut req, state, &user),
        ("DELETE", ["api", "notes", raw]) => notes::delete::<L>(path_id(raw)?, state, &user),

        ("GET", ["api", "works"]) => works::list::<L>(&req, state, &user),
        ("POST", ["api", "works"]) => works::create::<L>(&mut req, state, &user),
        ("GET", ["api", "works", raw]) => works::get::<L>(path_id(raw)?, state, &user),
        ("PUT", ["api", "works", raw]) => works::update::<L>(path_id(raw)?, &mut req, state, &user),
        ("DELETE", ["api", "works", raw]) => works::delete::<L>(path_id(raw)?, state, &user),
        ("POST", ["api", "works", raw, "complete"]) => works::complete::<L>(path_id(raw)?, state, &user),

        // Colleges
        ("GET", ["api", "colleges"]) => colleges::list(&req, state, &user),
        ("POST", ["api", "colleges"]) => colleges::create(&mut req, state, &user),
        ("GET", ["api", "colleges", "export"]) => colleges::export(&req, state, &user),
        ("GET", ["api", "colleges", raw]) => colleges::detail(path_id(raw)?, state, &user),
        ("PUT", ["api", "colleges", raw]) => colleges::update(path_id(raw)?, &mut req, state, &user),
        ("DELETE", ["api", "colleges", raw]) => colleges::delete(path_id(raw)?, state, &user),
        ("GET", ["api", "colleges", raw, "activity"]) => colleges::activity(path_id(raw)?, state, &user),

        ("GET", ["api", "college-notes"]) => notes::list::<C>(&req, state, &user),
        ("POST", ["api", "college-notes"]) => notes::create::<C>(&mut req, state, &user),
        ("DELETE", ["api", "college-notes", raw]) => notes::delete::<C>(path_id(raw)?, state, &user),

        ("GET", ["api", "college-works"]) => works::list::<C>(&req, state, &user),
        ("POST", ["api", "college-works"]) => works::create::<C>(&mut req, state, &user),
        ("GET", ["api", "college-works", raw]) => works::get::<C>(path_id(raw)?, state, &user),
        ("PUT", ["api", "college-works", raw]) => works::update::<C>(path_id(raw)?, &mut req, state, &user),
        ("DELETE", ["api", "college-works", raw]) => works::delete::<C>(path_id(raw)?, state, &user),
        ("POST", ["api", "college-works", raw, "complete"]) => {
            works::complete::<C>(path_id(raw)?, state, &user)
        }

        _ => Err(ServerError::NotFound(format!("no route for {method} {path}"))),
    }
}

fn path_id(raw: &str) -> Result<i64, ServerError> {
    parse_id("id", raw)
}

fn authorization(req: &Request) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
}

/// The verified caller; 401 without a valid bearer token.
fn authenticate(req: &Request, state: &AppState) -> Result<AuthUser, ServerError> {
    let token = bearer_token(authorization(req))?;
    state.jwt.verify(token)
}

/// Like [`authenticate`], but an absent header means an anonymous caller.
fn optional_caller(req: &Request, state: &AppState) -> Result<Option<AuthUser>, ServerError> {
    match authorization(req) {
        None => Ok(None),
        Some(_) => authenticate(req, state).map(Some),
    }
}

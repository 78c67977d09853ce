use chrono::Utc;

use crate::db::dashboard::dashboard_stats;
use crate::domain::user::AuthUser;
use crate::errors::ResultResp;
use crate::responses::json_response;
use crate::router::AppState;

pub fn stats(state: &AppState, caller: &AuthUser) -> ResultResp {
    let stats = state
        .db
        .with_conn(|conn| dashboard_stats(conn, caller.scope(), Utc::now()))?;
    json_response(200, &stats)
}

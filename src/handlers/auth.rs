// src/handlers/auth.rs
use astra::Request;
use chrono::Utc;
use rusqlite::Connection;

use crate::auth::password::{hash_password, verify_password};
use crate::config::BootstrapAdmin;
use crate::db::users;
use crate::domain::enums::Role;
use crate::domain::user::{normalize_email, AuthResponse, AuthUser, LoginRequest, RegisterRequest, User};
use crate::errors::{ResultResp, ServerError};
use crate::handlers::read_json;
use crate::responses::json_response;
use crate::router::AppState;

/// Picks the role of a new account: the first account is the admin, after
/// that only an admin caller may choose.
fn role_for(requested: Option<Role>, caller: Option<&AuthUser>, existing_users: i64) -> Role {
    if existing_users == 0 {
        return Role::Admin;
    }
    match caller {
        Some(c) if c.is_admin() => requested.unwrap_or(Role::Agent),
        _ => Role::Agent,
    }
}

pub fn register(req: &mut Request, state: &AppState, caller: Option<&AuthUser>) -> ResultResp {
    let body: RegisterRequest = read_json(req)?;
    body.validate()?;
    let email = normalize_email(&body.email)?;
    let password_hash = hash_password(&body.password);
    let now = Utc::now();

    let user = state.db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let role = role_for(body.role, caller, users::count_users(&tx)?);
        let user = users::insert_user(&tx, &body.name, &email, &password_hash, role, now)?;
        tx.commit()?;
        Ok(user)
    })?;

    tracing::info!(user_id = user.id, role = %user.role, "user registered");
    let token = state.jwt.issue(&user, now)?;
    json_response(201, &AuthResponse { token, user })
}

pub fn login(req: &mut Request, state: &AppState) -> ResultResp {
    let body: LoginRequest = read_json(req)?;
    let invalid = || ServerError::Unauthorized("invalid email or password".into());
    let email = normalize_email(&body.email).map_err(|_| invalid())?;

    let found = state
        .db
        .with_conn(|conn| users::find_credentials(conn, &email))?;
    let Some((user, stored)) = found else {
        return Err(invalid());
    };
    if !verify_password(&body.password, &stored)? {
        tracing::debug!(user_id = user.id, "password mismatch");
        return Err(invalid());
    }

    let token = state.jwt.issue(&user, Utc::now())?;
    json_response(200, &AuthResponse { token, user })
}

pub fn me(state: &AppState, caller: &AuthUser) -> ResultResp {
    let user = state
        .db
        .with_conn(|conn| users::get_user(conn, caller.id))
        .map_err(|e| match e {
            ServerError::NotFound(_) => ServerError::Unauthorized("account no longer exists".into()),
            other => other,
        })?;
    json_response(200, &user)
}

pub fn list_users(state: &AppState, caller: &AuthUser) -> ResultResp {
    caller.require_admin()?;
    let users = state.db.with_conn(|conn| users::list_users(conn))?;
    json_response(200, &users)
}

/// Creates the configured admin account unless its email is already taken.
pub fn bootstrap_admin(conn: &Connection, admin: &BootstrapAdmin) -> Result<Option<User>, ServerError> {
    let email = normalize_email(&admin.email)?;
    if users::find_credentials(conn, &email)?.is_some() {
        return Ok(None);
    }
    let hash = hash_password(&admin.password);
    let user = users::insert_user(conn, &admin.name, &email, &hash, Role::Admin, Utc::now())?;
    Ok(Some(user))
}

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::db::{init_db, Database};
use crate::responses::error_to_response;
use crate::router::{handle, AppState};
use astra::Server;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod handlers;
mod responses;
mod router;
mod spreadsheets;

#[cfg(test)]
mod tests;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,lead_desk=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let db = Database::new(config.db_path.clone());
    if let Err(e) = init_db(&db) {
        tracing::error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    if let Some(admin) = &config.bootstrap_admin {
        match db.with_conn(|conn| handlers::auth::bootstrap_admin(conn, admin)) {
            Ok(Some(user)) => tracing::info!(user_id = user.id, email = %user.email, "bootstrap admin created"),
            Ok(None) => tracing::debug!("bootstrap admin already present"),
            Err(e) => {
                tracing::error!(error = %e, "could not create bootstrap admin");
                std::process::exit(1);
            }
        }
    }

    let state = AppState {
        db,
        jwt: JwtKeys::new(&config.jwt_secret, config.jwt_ttl_secs),
        environment: config.environment,
    };

    tracing::info!(
        addr = %config.bind_addr,
        workers = config.max_workers,
        env = ?config.environment,
        "starting server"
    );

    let server = Server::bind(&config.bind_addr).max_workers(config.max_workers);

    let result = server.serve(move |req: astra::Request, _info| {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let resp = match handle(req, &state) {
            Ok(resp) => resp,
            Err(err) => error_to_response(&err, state.environment),
        };

        tracing::info!(
            %method,
            path = %path,
            status = resp.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );
        resp
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("server shut down");
}

// src/config.rs
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{0} must be set outside development")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Optional admin account created at startup when no user with that email exists.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: String,
    pub max_workers: usize,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub environment: Environment,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

const DEV_JWT_SECRET: &str = "lead-desk-development-secret";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            None | Some("production") | Some("prod") => Environment::Production,
            Some("development") | Some("dev") => Environment::Development,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "APP_ENV",
                    reason: format!("unknown environment '{other}'"),
                })
            }
        };

        let bind_addr = lookup("LEAD_DESK_BIND")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "LEAD_DESK_BIND",
                reason: e.to_string(),
            })?;

        let db_path = lookup("LEAD_DESK_DB").unwrap_or_else(|| "lead_desk.sqlite3".to_string());

        let max_workers = parse_number(&lookup, "LEAD_DESK_WORKERS", 8)?;
        if max_workers == 0 {
            return Err(ConfigError::Invalid {
                key: "LEAD_DESK_WORKERS",
                reason: "must be at least 1".into(),
            });
        }

        let jwt_ttl_secs = parse_number(&lookup, "JWT_TTL_SECS", 60 * 60 * 24 * 7)?;

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if environment.is_development() => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let bootstrap_admin = match (
            lookup("LEAD_DESK_ADMIN_EMAIL"),
            lookup("LEAD_DESK_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                name: lookup("LEAD_DESK_ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            db_path,
            max_workers,
            jwt_secret,
            jwt_ttl_secs,
            environment,
            bootstrap_admin,
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

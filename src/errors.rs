// errors.rs
use astra::Response;
use rusqlite::ErrorCode;

/// Errors originating from either the server logic
/// (routing, missing resources, auth) or downstream layers (DB, export).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),

    #[error("Internal Server Error: {0}")]
    InternalError(String),
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound(_) => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Unauthorized(_) => 401,
            ServerError::Forbidden(_) => 403,
            ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError(_) => {
                500
            }
        }
    }

    /// Message that is always safe to hand back to a client.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::NotFound(msg)
            | ServerError::BadRequest(msg)
            | ServerError::Unauthorized(msg)
            | ServerError::Forbidden(msg) => msg.clone(),
            _ => "Internal Server Error".to_string(),
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::QueryReturnedNoRows => ServerError::NotFound("record not found".into()),
            rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
                let detail = msg.clone().unwrap_or_else(|| err.to_string());
                if detail.contains("UNIQUE") {
                    ServerError::BadRequest(format!("duplicate value: {detail}"))
                } else {
                    ServerError::BadRequest(format!("constraint violation: {detail}"))
                }
            }
            _ => ServerError::DbError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("invalid request body: {e}"))
    }
}

impl From<crate::domain::enums::ParseEnumError> for ServerError {
    fn from(e: crate::domain::enums::ParseEnumError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

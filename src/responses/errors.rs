use crate::config::Environment;
use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde::Serialize;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// Convert a ServerError into a JSON error response.
///
/// 500s are logged; their details reach the client only in development.
pub fn error_to_response(err: &ServerError, env: Environment) -> Response {
    let status = err.status();
    let (message, detail) = if status >= 500 {
        tracing::error!(error = %err, "request failed");
        if env.is_development() {
            (err.to_string(), Some(err.to_string()))
        } else {
            (err.public_message(), None)
        }
    } else {
        (err.public_message(), None)
    };

    let body = ErrorBody {
        error: &message,
        detail,
    };
    let json = serde_json::to_vec(&body).unwrap_or_else(|_| br#"{"error":"Internal Server Error"}"#.to_vec());

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(json))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}

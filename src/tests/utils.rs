// src/tests/utils.rs
use crate::auth::JwtKeys;
use crate::config::Environment;
use crate::db::{init_db, Database};
use crate::responses::error_to_response;
use crate::router::{handle, AppState};
use astra::{Body, Response};
use serde_json::Value;
use std::io::Read;
use tempfile::TempDir;

/// A fresh database file plus app state, dropped with the test.
pub struct TestApp {
    _dir: TempDir,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: u16,
    pub content_type: String,
    pub raw: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.raw).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.raw)
            )
        })
    }
}

fn into_test_response(resp: Response) -> TestResponse {
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let mut raw = Vec::new();
    resp.into_body().reader().read_to_end(&mut raw).unwrap();
    TestResponse {
        status,
        content_type,
        raw,
    }
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lead_desk_test.sqlite3");
        let db = Database::new(path.to_string_lossy().to_string());
        init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

        Self {
            _dir: dir,
            state: AppState {
                db,
                jwt: JwtKeys::new("test-secret", 3600),
                environment: Environment::Production,
            },
        }
    }

    /// Runs a request through the router, mapping errors the way the server does.
    pub fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = http::Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let req = builder.body(body).unwrap();

        let resp = match handle(req, &self.state) {
            Ok(resp) => resp,
            Err(err) => error_to_response(&err, self.state.environment),
        };
        into_test_response(resp)
    }

    pub fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send("GET", uri, Some(token), None)
    }

    pub fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send("POST", uri, Some(token), Some(body))
    }

    pub fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send("PUT", uri, Some(token), Some(body))
    }

    pub fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send("DELETE", uri, Some(token), None)
    }

    /// Registers an account and returns `(token, user id)`.
    /// The first account registered on a fresh app is the admin.
    pub fn register(&self, name: &str, email: &str) -> (String, i64) {
        let resp = self.send(
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "name": name,
                "email": email,
                "password": "password123",
            })),
        );
        assert_eq!(resp.status, 201, "register failed: {}", String::from_utf8_lossy(&resp.raw));
        let body = resp.json();
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    /// Creates a lead through the API and returns its JSON.
    pub fn create_lead(&self, token: &str, body: Value) -> Value {
        let resp = self.post("/api/leads", token, body);
        assert_eq!(resp.status, 201, "create lead failed: {}", String::from_utf8_lossy(&resp.raw));
        resp.json()
    }

    pub fn create_college(&self, token: &str, body: Value) -> Value {
        let resp = self.post("/api/colleges", token, body);
        assert_eq!(resp.status, 201, "create college failed: {}", String::from_utf8_lossy(&resp.raw));
        resp.json()
    }
}

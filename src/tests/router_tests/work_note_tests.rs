// src/tests/router_tests/work_note_tests.rs
use crate::tests::utils::TestApp;
use chrono::{Duration, Utc};
use serde_json::json;

fn lead_due(app: &TestApp, token: &str, due: &str) -> i64 {
    let lead = app.create_lead(
        token,
        json!({ "name": "Sunil", "phone": "9000000000", "followUpDate": due }),
    );
    lead["id"].as_i64().unwrap()
}

#[test]
fn notes_are_listed_and_audited() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = lead_due(&app, &token, "2030-01-15");

    let resp = app.post("/api/notes", &token, json!({ "leadId": lead, "content": "Wants 3BHK" }));
    assert_eq!(resp.status, 201);
    let note = resp.json();
    assert_eq!(note["leadId"], lead);
    assert_eq!(note["authorName"], "Asha");

    let notes = app.get(&format!("/api/notes?leadId={lead}"), &token).json();
    assert_eq!(notes.as_array().unwrap().len(), 1);

    let activity = app.get(&format!("/api/leads/{lead}/activity"), &token).json();
    assert_eq!(activity[0]["action"], "NOTE_ADDED");
    assert_eq!(activity[0]["newValue"], "Wants 3BHK");
}

#[test]
fn note_validation() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = lead_due(&app, &token, "2030-01-15");

    assert_eq!(app.post("/api/notes", &token, json!({ "content": "x" })).status, 400);
    assert_eq!(app.post("/api/notes", &token, json!({ "leadId": lead, "content": "  " })).status, 400);
    assert_eq!(app.get("/api/notes", &token).status, 400);
    assert_eq!(app.post("/api/notes", &token, json!({ "leadId": 9999, "content": "x" })).status, 404);
}

#[test]
fn only_author_or_admin_deletes_a_note() {
    let app = TestApp::new();
    let (admin, _) = app.register("Asha", "asha@example.com");
    let (ravi, _) = app.register("Ravi", "ravi@example.com");
    let lead = lead_due(&app, &admin, "2030-01-15");

    let by_admin = app
        .post("/api/notes", &admin, json!({ "leadId": lead, "content": "admin note" }))
        .json();
    assert_eq!(app.delete(&format!("/api/notes/{}", by_admin["id"]), &ravi).status, 403);
    assert_eq!(app.delete(&format!("/api/notes/{}", by_admin["id"]), &admin).status, 204);
    assert_eq!(app.delete(&format!("/api/notes/{}", by_admin["id"]), &admin).status, 404);
}

#[test]
fn due_windows() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let today = Utc::now().date_naive();
    let yesterday = (today - Duration::days(1)).to_string();
    let tomorrow = (today + Duration::days(1)).to_string();

    lead_due(&app, &token, &yesterday);
    lead_due(&app, &token, &today.to_string());
    lead_due(&app, &token, &tomorrow);

    let count = |due: &str| {
        app.get(&format!("/api/works?due={due}"), &token)
            .json()
            .as_array()
            .unwrap()
            .len()
    };
    assert_eq!(count("overdue"), 1);
    assert_eq!(count("today"), 1);
    assert_eq!(count("upcoming"), 1);
    assert_eq!(app.get("/api/works?due=someday", &token).status, 400);
}

#[test]
fn manual_work_lifecycle() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = lead_due(&app, &token, "2030-01-15");

    assert_eq!(app.post("/api/works", &token, json!({ "leadId": lead })).status, 400);

    let work = app
        .post(
            "/api/works",
            &token,
            json!({ "leadId": lead, "title": "Share brochure", "dueDate": "2030-01-10" }),
        )
        .json();
    assert_eq!(work["title"], "Share brochure");
    let uri = format!("/api/works/{}", work["id"]);

    let done = app.put(&uri, &token, json!({ "status": "COMPLETED" })).json();
    assert_eq!(done["status"], "COMPLETED");
    assert!(!done["completedAt"].is_null());

    let reopened = app.put(&uri, &token, json!({ "status": "PENDING" })).json();
    assert!(reopened["completedAt"].is_null());

    let pending = app.get(&format!("/api/works?leadId={lead}&status=PENDING"), &token).json();
    assert_eq!(pending.as_array().unwrap().len(), 2);

    let completed = app.post(&format!("{uri}/complete"), &token, json!({})).json();
    assert_eq!(completed["status"], "COMPLETED");

    let activity = app.get(&format!("/api/leads/{lead}/activity"), &token).json();
    let completions = activity
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["action"] == "WORK_COMPLETED")
        .count();
    assert_eq!(completions, 2);
}

#[test]
fn work_delete_is_admin_only_and_scoped_reads() {
    let app = TestApp::new();
    let (admin, _) = app.register("Asha", "asha@example.com");
    let (ravi, _) = app.register("Ravi", "ravi@example.com");
    let (meena, _) = app.register("Meena", "meena@example.com");
    let lead = lead_due(&app, &ravi, "2030-01-15");

    let works = app.get(&format!("/api/works?leadId={lead}"), &ravi).json();
    let uri = format!("/api/works/{}", works[0]["id"]);

    assert_eq!(app.get(&uri, &ravi).status, 200);
    assert_eq!(app.get(&uri, &meena).status, 403);
    assert!(app.get("/api/works", &meena).json().as_array().unwrap().is_empty());

    assert_eq!(app.delete(&uri, &ravi).status, 403);
    assert_eq!(app.delete(&uri, &admin).status, 204);
}

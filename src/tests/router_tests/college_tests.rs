// src/tests/router_tests/college_tests.rs
use crate::tests::utils::TestApp;
use serde_json::{json, Value};

fn college_body(name: &str) -> Value {
    json!({
        "name": name,
        "city": "Mysuru",
        "contactPerson": "Dr. Rao",
        "studentStrength": 1200,
        "followUpDate": "2030-01-20",
    })
}

#[test]
fn create_defaults_and_single_work() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");

    let college = app.create_college(&token, college_body("JSS College"));
    assert_eq!(college["status"], "NEW");
    assert_eq!(college["followUpStatus"], "PENDING");
    assert_eq!(college["contactPerson"], "Dr. Rao");

    let detail = app.get(&format!("/api/colleges/{}", college["id"]), &token).json();
    let works = detail["works"].as_array().unwrap();
    assert_eq!(works.len(), 1);
    assert_eq!(works[0]["collegeId"], college["id"]);
    assert_eq!(works[0]["status"], "PENDING");
}

#[test]
fn create_without_follow_up_date_is_rejected() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let resp = app.post("/api/colleges", &token, json!({ "name": "JSS College" }));
    assert_eq!(resp.status, 400);
}

#[test]
fn completed_follow_up_onboards() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let college = app.create_college(&token, college_body("JSS College"));
    let uri = format!("/api/colleges/{}", college["id"]);

    let updated = app.put(&uri, &token, json!({ "followUpStatus": "COMPLETED" })).json();
    assert_eq!(updated["status"], "ONBOARDED");

    let detail = app.get(&uri, &token).json();
    for work in detail["works"].as_array().unwrap() {
        assert_eq!(work["status"], "COMPLETED");
        assert!(!work["completedAt"].is_null());
    }
}

#[test]
fn not_interested_rejects() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let college = app.create_college(&token, college_body("JSS College"));

    let updated = app
        .put(
            &format!("/api/colleges/{}", college["id"]),
            &token,
            json!({ "followUpStatus": "NOT_INTERESTED" }),
        )
        .json();
    assert_eq!(updated["status"], "REJECTED");
}

#[test]
fn leaving_campus_visit_follows_the_next_follow_up() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");

    for (next, expected) in [
        ("COMPLETED", "ONBOARDED"),
        ("NOT_INTERESTED", "REJECTED"),
        ("FOLLOW_UP_LATER", "CONTACTED"),
    ] {
        let mut body = college_body("Visited College");
        body["followUpStatus"] = json!("CAMPUS_VISIT_DONE");
        let college = app.create_college(&token, body);
        assert_eq!(college["status"], "CAMPUS_VISIT_DONE");

        let updated = app
            .put(
                &format!("/api/colleges/{}", college["id"]),
                &token,
                json!({ "followUpStatus": next }),
            )
            .json();
        assert_eq!(updated["status"], expected, "after moving to {next}");
    }
}

#[test]
fn lead_enum_values_are_rejected_for_colleges() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let college = app.create_college(&token, college_body("JSS College"));

    let resp = app.put(
        &format!("/api/colleges/{}", college["id"]),
        &token,
        json!({ "followUpStatus": "NOT_NEGOTIABLE" }),
    );
    assert_eq!(resp.status, 400);
}

#[test]
fn college_notes_and_works_use_college_ids() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let college = app.create_college(&token, college_body("JSS College"));
    let id = college["id"].as_i64().unwrap();

    let note = app.post(
        "/api/college-notes",
        &token,
        json!({ "collegeId": id, "content": "Principal wants a demo" }),
    );
    assert_eq!(note.status, 201);
    assert_eq!(note.json()["collegeId"], id);

    let notes = app.get(&format!("/api/college-notes?collegeId={id}"), &token).json();
    assert_eq!(notes.as_array().unwrap().len(), 1);

    let works = app.get(&format!("/api/college-works?collegeId={id}"), &token).json();
    assert_eq!(works.as_array().unwrap().len(), 1);
    let work_id = works[0]["id"].as_i64().unwrap();

    let done = app.post(&format!("/api/college-works/{work_id}/complete"), &token, json!({}));
    assert_eq!(done.status, 200);
    assert_eq!(done.json()["status"], "COMPLETED");

    let activity = app.get(&format!("/api/colleges/{id}/activity"), &token).json();
    assert_eq!(activity[0]["action"], "WORK_COMPLETED");
}

#[test]
fn export_returns_a_workbook() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    app.create_college(&token, college_body("JSS College"));

    let resp = app.get("/api/colleges/export", &token);
    assert_eq!(resp.status, 200);
    assert_eq!(&resp.raw[..2], b"PK");
}

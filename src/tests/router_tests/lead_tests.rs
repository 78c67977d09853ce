// src/tests/router_tests/lead_tests.rs
use crate::tests::utils::TestApp;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

fn lead_body(name: &str) -> Value {
    json!({
        "name": name,
        "phone": "9845000000",
        "location": "Indiranagar",
        "budget": 7500000,
        "followUpDate": "2030-01-15T10:00:00Z",
    })
}

fn works_of(detail: &Value) -> Vec<Value> {
    detail["works"].as_array().unwrap().clone()
}

fn time(v: &Value) -> DateTime<Utc> {
    v.as_str().unwrap().parse().unwrap()
}

#[test]
fn create_defaults_to_new_pending_with_one_work() {
    let app = TestApp::new();
    let (token, user_id) = app.register("Asha", "asha@example.com");

    let lead = app.create_lead(&token, lead_body("Sunil"));
    assert_eq!(lead["status"], "NEW");
    assert_eq!(lead["followUpStatus"], "PENDING");
    assert_eq!(lead["assignedToId"], user_id);

    let detail = app.get(&format!("/api/leads/{}", lead["id"]), &token).json();
    let works = works_of(&detail);
    assert_eq!(works.len(), 1);
    assert_eq!(works[0]["status"], "PENDING");
    assert_eq!(time(&works[0]["dueDate"]), time(&json!("2030-01-15T10:00:00Z")));
    assert_eq!(detail["activity"][0]["action"], "CREATED");
}

#[test]
fn create_without_follow_up_date_is_rejected() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");

    let resp = app.post("/api/leads", &token, json!({ "name": "Sunil", "phone": "1" }));
    assert_eq!(resp.status, 400);
    assert_eq!(resp.json()["error"], "followUpDate is required");

    let list = app.get("/api/leads", &token).json();
    assert!(list.as_array().unwrap().is_empty());
}

#[test]
fn create_with_site_visit_sets_status() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");

    let mut body = lead_body("Sunil");
    body["followUpStatus"] = json!("SITE_VISIT_DONE");
    let lead = app.create_lead(&token, body);
    assert_eq!(lead["status"], "SITE_VISIT_DONE");
}

#[test]
fn completed_follow_up_closes_lead_and_every_open_work() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = app.create_lead(&token, lead_body("Sunil"));
    let uri = format!("/api/leads/{}", lead["id"]);

    // A second open work, added by hand.
    let resp = app.post(
        "/api/works",
        &token,
        json!({ "leadId": lead["id"], "dueDate": "2030-02-01" }),
    );
    assert_eq!(resp.status, 201);

    let updated = app.put(&uri, &token, json!({ "followUpStatus": "COMPLETED" }));
    assert_eq!(updated.status, 200);
    assert_eq!(updated.json()["status"], "CLOSED");

    let detail = app.get(&uri, &token).json();
    let works = works_of(&detail);
    assert_eq!(works.len(), 2);
    for work in works {
        assert_eq!(work["status"], "COMPLETED");
        assert!(!work["completedAt"].is_null());
    }
}

#[test]
fn not_negotiable_loses_the_lead() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = app.create_lead(&token, lead_body("Sunil"));
    let uri = format!("/api/leads/{}", lead["id"]);

    let updated = app.put(&uri, &token, json!({ "followUpStatus": "NOT_NEGOTIABLE" })).json();
    assert_eq!(updated["status"], "LOST");

    let works = works_of(&app.get(&uri, &token).json());
    assert!(works.iter().all(|w| w["status"] == "COMPLETED"));
}

#[test]
fn unrelated_edit_keeps_manual_work_on_a_closed_lead() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = app.create_lead(&token, lead_body("Sunil"));
    let uri = format!("/api/leads/{}", lead["id"]);

    app.put(&uri, &token, json!({ "followUpStatus": "COMPLETED" }));
    let work = app
        .post(
            "/api/works",
            &token,
            json!({ "leadId": lead["id"], "title": "Hand over keys", "dueDate": "2030-03-01" }),
        )
        .json();
    assert_eq!(work["status"], "PENDING");

    let updated = app.put(&uri, &token, json!({ "location": "Elsewhere" }));
    assert_eq!(updated.status, 200);

    let after = app.get(&format!("/api/works/{}", work["id"]), &token).json();
    assert_eq!(after["status"], "PENDING");
    assert!(after["completedAt"].is_null());

    // Sending the terminal follow-up again does close it.
    app.put(&uri, &token, json!({ "followUpStatus": "COMPLETED" }));
    let after = app.get(&format!("/api/works/{}", work["id"]), &token).json();
    assert_eq!(after["status"], "COMPLETED");
}

#[test]
fn settled_status_is_not_overwritten() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = app.create_lead(&token, lead_body("Sunil"));
    let uri = format!("/api/leads/{}", lead["id"]);

    let updated = app
        .put(&uri, &token, json!({ "status": "CLOSED", "followUpStatus": "NOT_NEGOTIABLE" }))
        .json();
    assert_eq!(updated["status"], "CLOSED");
}

#[test]
fn leaving_site_visit_follows_the_next_follow_up() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");

    for (next, expected) in [
        ("COMPLETED", "CLOSED"),
        ("NOT_NEGOTIABLE", "LOST"),
        ("INTERESTED", "CONTACTED"),
    ] {
        let mut body = lead_body("Visitor");
        body["followUpStatus"] = json!("SITE_VISIT_DONE");
        let lead = app.create_lead(&token, body);
        assert_eq!(lead["status"], "SITE_VISIT_DONE");

        let updated = app
            .put(&format!("/api/leads/{}", lead["id"]), &token, json!({ "followUpStatus": next }))
            .json();
        assert_eq!(updated["status"], expected, "after moving to {next}");
    }
}

#[test]
fn new_follow_up_date_reschedules_the_open_work() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = app.create_lead(&token, lead_body("Sunil"));
    let uri = format!("/api/leads/{}", lead["id"]);

    let resp = app.put(
        &uri,
        &token,
        json!({ "followUpStatus": "FOLLOW_UP_LATER", "followUpDate": "2030-03-01" }),
    );
    assert_eq!(resp.status, 200);

    let detail = app.get(&uri, &token).json();
    let works = works_of(&detail);
    assert_eq!(works.len(), 1);
    assert_eq!(time(&works[0]["dueDate"]), time(&json!("2030-03-01T00:00:00Z")));

    let actions: Vec<&str> = detail["activity"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"FOLLOW_UP_STATUS_CHANGED"));
    assert!(actions.contains(&"FOLLOW_UP_DATE_CHANGED"));
}

#[test]
fn invalid_enum_values_are_bad_requests() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = app.create_lead(&token, lead_body("Sunil"));

    let resp = app.put(
        &format!("/api/leads/{}", lead["id"]),
        &token,
        json!({ "followUpStatus": "SOMEDAY" }),
    );
    assert_eq!(resp.status, 400);

    assert_eq!(app.get("/api/leads?status=WON", &token).status, 400);
    assert_eq!(app.get("/api/leads/abc", &token).status, 400);
}

#[test]
fn list_filters_and_search() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let first = app.create_lead(&token, lead_body("Sunil Kumar"));
    app.create_lead(&token, lead_body("Priya"));

    app.put(
        &format!("/api/leads/{}", first["id"]),
        &token,
        json!({ "status": "CONTACTED" }),
    );

    let contacted = app.get("/api/leads?status=CONTACTED", &token).json();
    assert_eq!(contacted.as_array().unwrap().len(), 1);
    assert_eq!(contacted[0]["name"], "Sunil Kumar");

    let search = app.get("/api/leads?q=priya", &token).json();
    assert_eq!(search.as_array().unwrap().len(), 1);

    let paged = app.get("/api/leads?limit=1&offset=1", &token).json();
    assert_eq!(paged.as_array().unwrap().len(), 1);
}

#[test]
fn detail_edit_is_audited_as_updated() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    let lead = app.create_lead(&token, lead_body("Sunil"));
    let uri = format!("/api/leads/{}", lead["id"]);

    let updated = app.put(&uri, &token, json!({ "location": "Whitefield" })).json();
    assert_eq!(updated["location"], "Whitefield");

    let activity = app.get(&format!("{uri}/activity"), &token).json();
    assert_eq!(activity[0]["action"], "UPDATED");
}

#[test]
fn export_returns_a_workbook() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    app.create_lead(&token, lead_body("Sunil"));

    let resp = app.get("/api/leads/export", &token);
    assert_eq!(resp.status, 200);
    assert!(resp.content_type.contains("spreadsheetml"));
    assert_eq!(&resp.raw[..2], b"PK");
}

#[test]
fn delete_is_admin_only_and_cascades() {
    let app = TestApp::new();
    let (admin, _) = app.register("Asha", "asha@example.com");
    let (agent, _) = app.register("Ravi", "ravi@example.com");
    let lead = app.create_lead(&agent, lead_body("Sunil"));
    let uri = format!("/api/leads/{}", lead["id"]);

    assert_eq!(app.delete(&uri, &agent).status, 403);
    assert_eq!(app.delete(&uri, &admin).status, 204);
    assert_eq!(app.get(&uri, &admin).status, 404);

    let works = app.get("/api/works", &admin).json();
    assert!(works.as_array().unwrap().is_empty());
}

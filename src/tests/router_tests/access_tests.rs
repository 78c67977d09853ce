// src/tests/router_tests/access_tests.rs
use crate::tests::utils::TestApp;
use serde_json::json;

fn body(name: &str) -> serde_json::Value {
    json!({ "name": name, "phone": "9000000000", "followUpDate": "2030-01-15" })
}

#[test]
fn agents_only_see_their_own_leads() {
    let app = TestApp::new();
    let (admin, _) = app.register("Asha", "asha@example.com");
    let (ravi, _) = app.register("Ravi", "ravi@example.com");
    let (meena, _) = app.register("Meena", "meena@example.com");

    let ravis = app.create_lead(&ravi, body("Ravi's lead"));
    app.create_lead(&meena, body("Meena's lead"));

    let listed = app.get("/api/leads", &ravi).json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Ravi's lead");

    let all = app.get("/api/leads", &admin).json();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let uri = format!("/api/leads/{}", ravis["id"]);
    assert_eq!(app.get(&uri, &meena).status, 403);
    assert_eq!(app.put(&uri, &meena, json!({ "location": "x" })).status, 403);
    assert_eq!(app.get(&format!("{uri}/activity"), &meena).status, 403);
    assert_eq!(app.get(&uri, &admin).status, 200);
}

#[test]
fn missing_records_are_not_found() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");
    assert_eq!(app.get("/api/leads/9999", &token).status, 404);
    assert_eq!(app.put("/api/colleges/9999", &token, json!({})).status, 404);
    assert_eq!(app.get("/api/works/9999", &token).status, 404);
}

#[test]
fn only_admins_reassign() {
    let app = TestApp::new();
    let (admin, _) = app.register("Asha", "asha@example.com");
    let (ravi, ravi_id) = app.register("Ravi", "ravi@example.com");
    let (_, meena_id) = app.register("Meena", "meena@example.com");

    let lead = app.create_lead(&ravi, body("Lead"));
    let uri = format!("/api/leads/{}", lead["id"]);

    let resp = app.put(&uri, &ravi, json!({ "assignedToId": meena_id }));
    assert_eq!(resp.status, 403);

    // Restating the current assignee is not a reassignment.
    let resp = app.put(&uri, &ravi, json!({ "assignedToId": ravi_id }));
    assert_eq!(resp.status, 200);

    let resp = app.put(&uri, &admin, json!({ "assignedToId": meena_id }));
    assert_eq!(resp.status, 200);
    let updated = resp.json();
    assert_eq!(updated["assignedToId"], meena_id);
    assert_eq!(updated["assignedToName"], "Meena");

    let activity = app.get(&format!("{uri}/activity"), &admin).json();
    assert_eq!(activity[0]["action"], "ASSIGNEE_CHANGED");

    // Ravi created it, so it stays visible to him.
    assert_eq!(app.get(&uri, &ravi).status, 200);
}

#[test]
fn agents_cannot_create_for_someone_else() {
    let app = TestApp::new();
    let (admin, _) = app.register("Asha", "asha@example.com");
    let (ravi, ravi_id) = app.register("Ravi", "ravi@example.com");
    let (_, meena_id) = app.register("Meena", "meena@example.com");

    let mut for_meena = body("Lead");
    for_meena["assignedToId"] = json!(meena_id);
    assert_eq!(app.post("/api/leads", &ravi, for_meena.clone()).status, 403);
    assert_eq!(app.post("/api/leads", &admin, for_meena).status, 201);

    let mut unknown = body("Lead");
    unknown["assignedToId"] = json!(ravi_id + 100);
    assert_eq!(app.post("/api/leads", &admin, unknown).status, 400);
}

// src/tests/router_tests/dashboard_tests.rs
use crate::tests::utils::TestApp;
use serde_json::json;

#[test]
fn dashboard_requires_login() {
    let app = TestApp::new();
    assert_eq!(app.send("GET", "/api/dashboard/stats", None, None).status, 401);
}

#[test]
fn stats_list_every_status_even_when_empty() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");

    let stats = app.get("/api/dashboard/stats", &token).json();
    assert_eq!(stats["leads"]["total"], 0);
    assert_eq!(stats["leads"]["byStatus"]["SITE_VISIT_DONE"], 0);
    assert_eq!(stats["leads"]["byFollowUpStatus"]["NOT_NEGOTIABLE"], 0);
    assert_eq!(stats["colleges"]["byStatus"]["ONBOARDED"], 0);
    assert_eq!(stats["colleges"]["byFollowUpStatus"]["CAMPUS_VISIT_DONE"], 0);
}

#[test]
fn stats_follow_pipeline_changes() {
    let app = TestApp::new();
    let (token, _) = app.register("Asha", "asha@example.com");

    let lead = app.create_lead(
        &token,
        json!({ "name": "Sunil", "phone": "1", "followUpDate": "2030-01-15" }),
    );
    app.create_lead(
        &token,
        json!({ "name": "Priya", "phone": "2", "followUpDate": "2030-01-16" }),
    );
    app.create_college(&token, json!({ "name": "JSS", "followUpDate": "2030-01-17" }));

    let resp = app.put(
        &format!("/api/leads/{}", lead["id"]),
        &token,
        json!({ "followUpStatus": "COMPLETED" }),
    );
    assert_eq!(resp.status, 200);

    let stats = app.get("/api/dashboard/stats", &token).json();
    assert_eq!(stats["leads"]["total"], 2);
    assert_eq!(stats["leads"]["byStatus"]["CLOSED"], 1);
    assert_eq!(stats["leads"]["byStatus"]["NEW"], 1);
    assert_eq!(stats["leads"]["openWorks"], 1);
    assert_eq!(stats["leads"]["completedLast7Days"], 1);
    assert_eq!(stats["leads"]["createdThisWeek"], 2);
    assert_eq!(stats["colleges"]["total"], 1);
    assert_eq!(stats["colleges"]["openWorks"], 1);
    assert!(!stats["recentActivity"].as_array().unwrap().is_empty());
    assert_eq!(stats["recentCollegeActivity"][0]["action"], "CREATED");
}

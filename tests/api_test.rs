//! HTTP API tests over the in-memory store.

mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use common::*;
use rollcall::cache::QueryKey;
use rollcall::models::attendance::AttendanceState;
use rollcall::stats::UnmarkedPolicy;

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_member_create_list_delete() {
    let state = memory_state();
    let app = test_app!(state);

    let resp = test::call_service(&app, post_json("/api/members", json!({ "name": "  Zoe Martin " })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let zoe: Value = test::read_body_json(resp).await;
    assert_eq!(zoe["name"], "Zoe Martin");

    let resp = test::call_service(&app, post_json("/api/members", json!({ "name": "Ana Lima" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let members: Value = test::call_and_read_body_json(&app, get("/api/members").to_request()).await;
    let names: Vec<&str> = members.as_array().unwrap().iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Ana Lima", "Zoe Martin"]);

    let uri = format!("/api/members/{}", zoe["id"].as_str().unwrap());
    let resp = test::call_service(&app, delete(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, delete(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_member_name_validation() {
    let state = memory_state();
    let app = test_app!(state);

    for name in ["A", "  ", "R2D2", "robert; drop table"] {
        let resp = test::call_service(&app, post_json("/api/members", json!({ "name": name })).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "name {name:?}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"].as_array().unwrap().len(), 1);
    }

    let members: Value = test::call_and_read_body_json(&app, get("/api/members").to_request()).await;
    assert!(members.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_mutation_requires_json_content_type() {
    let state = memory_state();
    let app = test_app!(state);

    let req = TestRequest::post()
        .uri("/api/members")
        .insert_header(("content-type", "text/plain"))
        .set_payload(r#"{"name":"Ana Lima"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("application/json"));
}

#[actix_web::test]
async fn test_malformed_json_is_a_validation_error() {
    let state = memory_state();
    let app = test_app!(state);

    let req = TestRequest::post()
        .uri("/api/members")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"name\":")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
}

#[actix_web::test]
async fn test_health() {
    let state = memory_state();
    let app = test_app!(state);
    let body: Value = test::call_and_read_body_json(&app, get("/health").to_request()).await;
    assert_eq!(body["status"], "ok");
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_event_lifecycle() {
    let state = memory_state();
    let app = test_app!(state);

    let resp = test::call_service(
        &app,
        post_json(
            "/api/events",
            json!({ "title": " Rehearsal ", "date": "2024-03-10", "description": "  " }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let event: Value = test::read_body_json(resp).await;
    assert_eq!(event["title"], "Rehearsal");
    assert_eq!(event["date"], "2024-03-10");
    assert_eq!(event["description"], Value::Null);
    let uri = format!("/api/events/{}", event["id"].as_str().unwrap());

    let fetched: Value = test::call_and_read_body_json(&app, get(&uri).to_request()).await;
    assert_eq!(fetched, event);

    let patched: Value = test::call_and_read_body_json(
        &app,
        patch_json(&uri, json!({ "date": "2024-03-12", "description": "Bring scores" })).to_request(),
    )
    .await;
    assert_eq!(patched["title"], "Rehearsal");
    assert_eq!(patched["date"], "2024-03-12");
    assert_eq!(patched["description"], "Bring scores");

    let cleared: Value =
        test::call_and_read_body_json(&app, patch_json(&uri, json!({ "description": null })).to_request()).await;
    assert_eq!(cleared["description"], Value::Null);
    assert_eq!(cleared["date"], "2024-03-12");

    let resp = test::call_service(&app, delete(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = test::call_service(&app, get(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_event_validation() {
    let state = memory_state();
    let app = test_app!(state);

    let resp = test::call_service(
        &app,
        post_json("/api/events", json!({ "title": "", "date": "10/03/2024" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    let resp = test::call_service(
        &app,
        post_json("/api/events", json!({ "title": "Gig", "date": "2024-02-30" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let event = seed_event(&state, "Gig", "2024-05-01").await;
    let uri = format!("/api/events/{}", event.id);
    let resp = test::call_service(&app, patch_json(&uri, json!({})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, patch_json("/api/events/nope", json!({ "title": "Other" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_events_sorted_and_found_by_date() {
    let state = memory_state();
    let app = test_app!(state);

    let late = seed_event(&state, "Late", "2024-06-01").await;
    let early = seed_event(&state, "Early", "2024-01-15").await;
    seed_event(&state, "Late again", "2024-06-01").await;

    let events: Value = test::call_and_read_body_json(&app, get("/api/events").to_request()).await;
    let titles: Vec<&str> = events.as_array().unwrap().iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Early", "Late", "Late again"]);

    let found: Value = test::call_and_read_body_json(&app, get("/api/events/by-date/2024-06-01").to_request()).await;
    assert_eq!(found["id"], late.id.as_str());
    let found: Value = test::call_and_read_body_json(&app, get("/api/events/by-date/2024-01-15").to_request()).await;
    assert_eq!(found["id"], early.id.as_str());

    let resp = test::call_service(&app, get("/api/events/by-date/2024-07-01").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = test::call_service(&app, get("/api/events/by-date/yesterday").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_attendance_upsert_replaces_record() {
    let state = memory_state();
    let app = test_app!(state);
    let member = seed_member(&state, "Ana Lima").await;
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;
    let uri = format!("/api/events/{}/attendance/{}", event.id, member.id);

    let first: Value = test::call_and_read_body_json(&app, put_json(&uri, json!({ "is_present": false })).to_request()).await;
    assert_eq!(first["is_present"], false);
    assert_eq!(first["justification"], Value::Null);

    let second: Value = test::call_and_read_body_json(
        &app,
        put_json(&uri, json!({ "is_present": false, "justification": "  Doctor  " })).to_request(),
    )
    .await;
    assert_eq!(second["justification"], "Doctor");
    assert_eq!(second["id"], first["id"]);

    let present: Value = test::call_and_read_body_json(
        &app,
        put_json(&uri, json!({ "is_present": true, "justification": "ignored" })).to_request(),
    )
    .await;
    assert_eq!(present["is_present"], true);
    assert_eq!(present["justification"], Value::Null);

    let records: Value = test::call_and_read_body_json(
        &app,
        get(&format!("/api/events/{}/attendance", event.id)).to_request(),
    )
    .await;
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_attendance_unknown_ids() {
    let state = memory_state();
    let app = test_app!(state);
    let member = seed_member(&state, "Ana Lima").await;
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;

    let resp = test::call_service(
        &app,
        put_json(&format!("/api/events/nope/attendance/{}", member.id), json!({ "is_present": true })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        put_json(&format!("/api/events/{}/attendance/nope", event.id), json!({ "is_present": true })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, get("/api/events/nope/attendance").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_justification_too_long() {
    let state = memory_state();
    let app = test_app!(state);
    let member = seed_member(&state, "Ana Lima").await;
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;

    let resp = test::call_service(
        &app,
        put_json(
            &format!("/api/events/{}/attendance/{}", event.id, member.id),
            json!({ "is_present": false, "justification": "x".repeat(1001) }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_present_mark_ignores_long_justification() {
    let state = memory_state();
    let app = test_app!(state);
    let member = seed_member(&state, "Ana Lima").await;
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;

    let record: Value = test::call_and_read_body_json(
        &app,
        put_json(
            &format!("/api/events/{}/attendance/{}", event.id, member.id),
            json!({ "is_present": true, "justification": "x".repeat(1001) }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(record["is_present"], true);
    assert_eq!(record["justification"], Value::Null);
}

#[actix_web::test]
async fn test_toggle_unknown_event_leaves_no_cache_entry() {
    let state = memory_state();
    let app = test_app!(state);
    let member = seed_member(&state, "Ana Lima").await;

    for i in 0..50 {
        let uri = format!("/api/events/ghost{i}/attendance/{}/toggle", member.id);
        let resp = test::call_service(&app, post_empty(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
    let cached = (0..50)
        .filter(|i| state.store.is_cached(&QueryKey::AttendanceByEvent(format!("ghost{i}"))))
        .count();
    assert_eq!(cached, 0);

    let resp = test::call_service(&app, get("/api/events/ghost0/attendance").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(!state.store.is_cached(&QueryKey::AttendanceByEvent("ghost0".to_string())));
}

#[actix_web::test]
async fn test_toggle_cycles_presence() {
    let state = memory_state();
    let app = test_app!(state);
    let member = seed_member(&state, "Ana Lima").await;
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;
    let uri = format!("/api/events/{}/attendance/{}/toggle", event.id, member.id);

    let record: Value = test::call_and_read_body_json(&app, post_empty(&uri).to_request()).await;
    assert_eq!(record["is_present"], true);

    let record: Value = test::call_and_read_body_json(&app, post_empty(&uri).to_request()).await;
    assert_eq!(record["is_present"], false);
    assert_eq!(record["justification"], Value::Null);

    seed_attendance(&state, &event, &member, AttendanceState::Justified("Flu".to_string())).await;
    let record: Value = test::call_and_read_body_json(&app, post_empty(&uri).to_request()).await;
    assert_eq!(record["is_present"], true);
}

#[actix_web::test]
async fn test_delete_member_removes_attendance() {
    let state = memory_state();
    let app = test_app!(state);
    let ana = seed_member(&state, "Ana Lima").await;
    let bo = seed_member(&state, "Bo Chen").await;
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;
    seed_attendance(&state, &event, &ana, AttendanceState::Present).await;
    seed_attendance(&state, &event, &bo, AttendanceState::Unjustified).await;

    // warm the cache before deleting
    let all: Value = test::call_and_read_body_json(&app, get("/api/attendance").to_request()).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let resp = test::call_service(&app, delete(&format!("/api/members/{}", bo.id)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let all: Value = test::call_and_read_body_json(&app, get("/api/attendance").to_request()).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["member_id"], ana.id.as_str());
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_event_stats_over_roster() {
    let state = memory_state();
    let app = test_app!(state);
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;
    let a = seed_member(&state, "Ana Lima").await;
    let b = seed_member(&state, "Bo Chen").await;
    seed_member(&state, "Cy Dorn").await;
    seed_attendance(&state, &event, &a, AttendanceState::Present).await;
    seed_attendance(&state, &event, &b, AttendanceState::Justified("Work".to_string())).await;

    let body: Value =
        test::call_and_read_body_json(&app, get(&format!("/api/events/{}/stats", event.id)).to_request()).await;
    assert_eq!(body["stats"], json!({ "total": 3, "present": 1, "justified": 1, "absent": 1 }));
    assert_eq!(body["percentages"], json!({ "present": 33, "justified": 33, "absent": 33 }));

    let resp = test::call_service(&app, get("/api/events/nope/stats").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_event_stats_empty_roster() {
    let state = memory_state();
    let app = test_app!(state);
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;

    let body: Value =
        test::call_and_read_body_json(&app, get(&format!("/api/events/{}/stats", event.id)).to_request()).await;
    assert_eq!(body["stats"]["total"], 0);
    assert_eq!(body["percentages"], json!({ "present": 0, "justified": 0, "absent": 0 }));
}

/// Five events: two unjustified, one justified, one present, one unmarked.
async fn seed_five_events(state: &MemoryState) -> String {
    let member = seed_member(state, "Ana Lima").await;
    let states = [
        Some(AttendanceState::Unjustified),
        Some(AttendanceState::Unjustified),
        Some(AttendanceState::Justified("Sick".to_string())),
        Some(AttendanceState::Present),
        None,
    ];
    for (day, attendance) in states.into_iter().enumerate() {
        let event = seed_event(state, "Session", &format!("2024-01-{:02}", day + 1)).await;
        if let Some(attendance) = attendance {
            seed_attendance(state, &event, &member, attendance).await;
        }
    }
    member.id
}

#[actix_web::test]
async fn test_member_status_ignores_unmarked_by_default() {
    let state = memory_state();
    let app = test_app!(state);
    let member_id = seed_five_events(&state).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        get(&format!("/api/members/{member_id}/status")).to_request(),
    )
    .await;
    assert_eq!(body["status"], json!({ "count": 2, "tier": "ok" }));
    assert_eq!(body["total_absent"], 3);
    assert_eq!(
        body["stats"],
        json!({ "present": 1, "justified": 1, "absent": 2, "not_marked": 1 })
    );

    let resp = test::call_service(&app, get("/api/members/nope/status").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_member_status_counting_unmarked() {
    let state = memory_state_with(UnmarkedPolicy::CountAsAbsent);
    let app = test_app!(state);
    let member_id = seed_five_events(&state).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        get(&format!("/api/members/{member_id}/status")).to_request(),
    )
    .await;
    assert_eq!(body["status"], json!({ "count": 3, "tier": "attention" }));
}

#[actix_web::test]
async fn test_summaries() {
    let state = memory_state();
    let app = test_app!(state);
    let ana = seed_member(&state, "Ana Lima").await;
    let bo = seed_member(&state, "Bo Chen").await;
    let old = seed_event(&state, "Old", "2000-01-01").await;
    let future = seed_event(&state, "Future", "2999-01-01").await;
    seed_attendance(&state, &old, &ana, AttendanceState::Present).await;
    seed_attendance(&state, &old, &bo, AttendanceState::Unjustified).await;
    seed_attendance(&state, &future, &ana, AttendanceState::Present).await;

    let events: Value = test::call_and_read_body_json(&app, get("/api/summary/events").to_request()).await;
    let events = events.as_array().unwrap();
    assert_eq!(events[0]["event"]["title"], "Future");
    assert_eq!(events[0]["held"], false);
    assert_eq!(events[1]["event"]["title"], "Old");
    assert_eq!(events[1]["held"], true);
    assert_eq!(events[1]["percentages"]["present"], 50);
    assert_eq!(events[0]["stats"]["absent"], 1);

    let members: Value = test::call_and_read_body_json(&app, get("/api/summary/members").to_request()).await;
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["member"]["name"], "Ana Lima");
    assert_eq!(members[0]["stats"]["present"], 2);
    assert_eq!(members[1]["stats"]["absent"], 1);
    assert_eq!(members[1]["stats"]["not_marked"], 1);
    assert_eq!(members[1]["total_absent"], 2);
}

#[actix_web::test]
async fn test_summary_reflects_new_attendance() {
    let state = memory_state();
    let app = test_app!(state);
    let ana = seed_member(&state, "Ana Lima").await;
    let event = seed_event(&state, "Rehearsal", "2024-03-10").await;

    let before: Value = test::call_and_read_body_json(&app, get("/api/summary/members").to_request()).await;
    assert_eq!(before[0]["stats"]["present"], 0);

    let uri = format!("/api/events/{}/attendance/{}", event.id, ana.id);
    test::call_service(&app, put_json(&uri, json!({ "is_present": true })).to_request()).await;

    let after: Value = test::call_and_read_body_json(&app, get("/api/summary/members").to_request()).await;
    assert_eq!(after[0]["stats"]["present"], 1);
}

//! Shared test infrastructure.
//!
//! - `memory_state()` - app state over a fresh in-memory store
//! - `test_app!(state)` - actix test service with every route registered
//! - `setup_pg()` - migrated Postgres pool, `None` unless `TEST_DATABASE_URL` is set

#![allow(dead_code)]

use actix_web::test::TestRequest;
use actix_web::web;
use serde_json::Value;
use sqlx::PgPool;

use rollcall::handlers::AppState;
use rollcall::models::attendance::{AttendanceRecord, AttendanceState};
use rollcall::models::event::{Event, NewEvent};
use rollcall::models::member::Member;
use rollcall::stats::UnmarkedPolicy;
use rollcall::store::{AttendanceStore, EventStore, MemberStore, MemoryStore};

pub type MemoryState = web::Data<AppState<MemoryStore>>;

/// Build an initialised test service for a `MemoryState`.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .configure(rollcall::handlers::configure::<rollcall::store::MemoryStore>),
        )
        .await
    };
}

pub fn memory_state() -> MemoryState {
    memory_state_with(UnmarkedPolicy::Ignore)
}

pub fn memory_state_with(policy: UnmarkedPolicy) -> MemoryState {
    web::Data::new(AppState::new(MemoryStore::new(), policy))
}

// ============================================================================
// SEEDING
// ============================================================================

pub async fn seed_member(state: &MemoryState, name: &str) -> Member {
    state.store.create_member(name).await.expect("create member")
}

pub async fn seed_event(state: &MemoryState, title: &str, date: &str) -> Event {
    state
        .store
        .create_event(NewEvent {
            title: title.to_string(),
            date: date.parse().expect("valid date"),
            description: None,
        })
        .await
        .expect("create event")
}

pub async fn seed_attendance(
    state: &MemoryState,
    event: &Event,
    member: &Member,
    attendance: AttendanceState,
) -> AttendanceRecord {
    state
        .store
        .upsert_attendance(&event.id, &member.id, attendance)
        .await
        .expect("upsert attendance")
}

// ============================================================================
// REQUESTS
// ============================================================================

pub fn post_json(uri: &str, body: Value) -> TestRequest {
    TestRequest::post().uri(uri).set_json(body)
}

pub fn put_json(uri: &str, body: Value) -> TestRequest {
    TestRequest::put().uri(uri).set_json(body)
}

pub fn patch_json(uri: &str, body: Value) -> TestRequest {
    TestRequest::patch().uri(uri).set_json(body)
}

/// POST with a JSON content type and no payload.
pub fn post_empty(uri: &str) -> TestRequest {
    TestRequest::post()
        .uri(uri)
        .insert_header(("content-type", "application/json"))
}

pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri)
}

pub fn delete(uri: &str) -> TestRequest {
    TestRequest::delete().uri(uri)
}

// ============================================================================
// POSTGRES
// ============================================================================

/// Connect to `TEST_DATABASE_URL` and run migrations. Tests skip when unset.
pub async fn setup_pg() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = rollcall::db::init_pool(&url, 2).await.expect("connect test database");
    rollcall::db::run_migrations(&pool).await.expect("run migrations");
    Some(pool)
}

/// A name no other test run will produce.
pub fn unique(prefix: &str) -> String {
    format!("{prefix} {}", uuid::Uuid::new_v4().simple())
}

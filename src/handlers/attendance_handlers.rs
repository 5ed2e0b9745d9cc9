use actix_web::{HttpResponse, web};

use crate::errors::{AppError, check};
use crate::handlers::AppState;
use crate::handlers::event_handlers::require_event;
use crate::models::attendance::{AttendanceRequest, AttendanceState};
use crate::store::{AttendanceStore, Store};
use crate::validate;

pub async fn list_by_event<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event = require_event(&state, &path.into_inner()).await?;
    let records = state.store.list_attendance_by_event(&event.id).await?;
    Ok(HttpResponse::Ok().json(records))
}

pub async fn list_all<S: Store>(state: web::Data<AppState<S>>) -> Result<HttpResponse, AppError> {
    let records = state.store.list_attendance().await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Record presence for one member at one event, replacing any earlier record.
pub async fn upsert<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<(String, String)>,
    body: web::Json<AttendanceRequest>,
) -> Result<HttpResponse, AppError> {
    let (event_id, member_id) = path.into_inner();
    let mut errors = Vec::new();
    // text on a present mark is dropped, not stored
    if !body.is_present {
        if let Some(text) = body.justification.as_deref() {
            errors.extend(validate::validate_justification(text));
        }
    }
    check(errors)?;

    let attendance_state = AttendanceState::from_parts(body.is_present, body.justification.as_deref());
    let record = state
        .store
        .upsert_attendance(&event_id, &member_id, attendance_state)
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Flip presence. Present becomes an unjustified absence, anything else
/// (including no record) becomes present. The store flips atomically.
pub async fn toggle<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (event_id, member_id) = path.into_inner();
    let event = require_event(&state, &event_id).await?;
    let record = state.store.toggle_attendance(&event.id, &member_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::errors::{AppError, check};
use crate::handlers::AppState;
use crate::models::event::{Event, EventPatch, EventPatchRequest, EventRequest, NewEvent};
use crate::stats::{self, EventStats, Percentages};
use crate::store::{AttendanceStore, EventStore, MemberStore, Store};
use crate::validate;

#[derive(Debug, Serialize)]
struct EventStatsResponse {
    event_id: String,
    stats: EventStats,
    percentages: Percentages,
}

pub(crate) async fn require_event<S: Store>(state: &AppState<S>, id: &str) -> Result<Event, AppError> {
    state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {id}")))
}

pub async fn list<S: Store>(state: web::Data<AppState<S>>) -> Result<HttpResponse, AppError> {
    let events = state.store.list_events().await?;
    Ok(HttpResponse::Ok().json(events))
}

pub async fn create<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<EventRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let mut errors = Vec::new();
    errors.extend(validate::validate_event_title(&body.title));
    if let Some(description) = body.description.as_deref() {
        errors.extend(validate::validate_event_description(description));
    }
    let date = validate::parse_event_date(&body.date);
    if let Err(e) = &date {
        errors.push(e.clone());
    }
    check(errors)?;
    let date = date.map_err(|e| AppError::Validation(vec![e]))?;

    let event = state
        .store
        .create_event(NewEvent {
            title: body.title.trim().to_string(),
            date,
            description: validate::normalize_optional(body.description.as_deref()),
        })
        .await?;
    Ok(HttpResponse::Created().json(event))
}

pub async fn read<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event = require_event(&state, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

/// First event scheduled on the given `YYYY-MM-DD` date.
pub async fn by_date<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw = path.into_inner();
    let date = validate::parse_event_date(&raw).map_err(|e| AppError::Validation(vec![e]))?;
    let event = state
        .store
        .find_event_by_date(date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event on {date}")))?;
    Ok(HttpResponse::Ok().json(event))
}

pub async fn update<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
    body: web::Json<EventPatchRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let mut errors = Vec::new();
    let mut patch = EventPatch::default();

    if let Some(title) = body.title.as_deref() {
        errors.extend(validate::validate_event_title(title));
        patch.title = Some(title.trim().to_string());
    }
    if let Some(raw) = body.date.as_deref() {
        match validate::parse_event_date(raw) {
            Ok(date) => patch.date = Some(date),
            Err(e) => errors.push(e),
        }
    }
    match body.description {
        Some(Some(description)) => {
            errors.extend(validate::validate_event_description(&description));
            patch.description = Some(validate::normalize_optional(Some(&description)));
        }
        Some(None) => patch.description = Some(None),
        None => {}
    }
    if patch.is_empty() && errors.is_empty() {
        errors.push("At least one of title, date or description is required".to_string());
    }
    check(errors)?;

    let event = state.store.update_event(&path.into_inner(), patch).await?;
    Ok(HttpResponse::Ok().json(event))
}

pub async fn delete<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state.store.delete_event(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Present / justified / absent split of the current roster for one event.
pub async fn stats<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event = require_event(&state, &path.into_inner()).await?;
    let members = state.store.list_members().await?;
    let records = state.store.list_attendance_by_event(&event.id).await?;

    let stats = stats::event_statistics(&event, &members, &records);
    Ok(HttpResponse::Ok().json(EventStatsResponse {
        event_id: event.id,
        percentages: stats.percentages(),
        stats,
    }))
}

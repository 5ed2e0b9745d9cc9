use actix_web::{HttpResponse, web};

use crate::errors::{AppError, check};
use crate::handlers::AppState;
use crate::models::member::MemberRequest;
use crate::stats;
use crate::store::{AttendanceStore, EventStore, MemberStore, Store};
use crate::validate;

pub async fn list<S: Store>(state: web::Data<AppState<S>>) -> Result<HttpResponse, AppError> {
    let members = state.store.list_members().await?;
    Ok(HttpResponse::Ok().json(members))
}

pub async fn create<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<MemberRequest>,
) -> Result<HttpResponse, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_member_name(&body.name));
    check(errors)?;

    let member = state.store.create_member(body.name.trim()).await?;
    Ok(HttpResponse::Created().json(member))
}

pub async fn delete<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state.store.delete_member(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Absence status of one member across all events.
pub async fn status<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let member_id = path.into_inner();
    let members = state.store.list_members().await?;
    let member = members
        .into_iter()
        .find(|m| m.id == member_id)
        .ok_or_else(|| AppError::NotFound(format!("Member {member_id}")))?;

    let events = state.store.list_events().await?;
    let records = state.store.list_attendance().await?;

    let overview = stats::roster_overview(&[member], &events, &records, state.unmarked_policy)
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Member {member_id}")))?;
    Ok(HttpResponse::Ok().json(overview))
}

use actix_web::{HttpResponse, web};

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::stats;
use crate::store::{AttendanceStore, EventStore, MemberStore, Store};

pub async fn members<S: Store>(state: web::Data<AppState<S>>) -> Result<HttpResponse, AppError> {
    let members = state.store.list_members().await?;
    let events = state.store.list_events().await?;
    let records = state.store.list_attendance().await?;

    let overview = stats::roster_overview(&members, &events, &records, state.unmarked_policy);
    Ok(HttpResponse::Ok().json(overview))
}

pub async fn events<S: Store>(state: web::Data<AppState<S>>) -> Result<HttpResponse, AppError> {
    let members = state.store.list_members().await?;
    let events = state.store.list_events().await?;
    let records = state.store.list_attendance().await?;

    let today = chrono::Local::now().date_naive();
    let overview = stats::events_overview(&events, &members, &records, today);
    Ok(HttpResponse::Ok().json(overview))
}

use chrono::NaiveDate;
use sqlx::PgPool;

use super::{AttendanceStore, EventStore, MemberStore};
use crate::errors::AppError;
use crate::models::attendance::{self, AttendanceRecord, AttendanceState};
use crate::models::event::{self, Event, EventPatch, NewEvent};
use crate::models::member::{self, Member};

/// PostgreSQL backend. Cascades and the (event, member) uniqueness live in
/// the schema under `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl MemberStore for PgStore {
    async fn list_members(&self) -> Result<Vec<Member>, AppError> {
        Ok(member::queries::list(&self.pool).await?)
    }

    async fn create_member(&self, name: &str) -> Result<Member, AppError> {
        let created = member::queries::create(&self.pool, name).await?;
        log::info!("Created member {} ({})", created.id, created.name);
        Ok(created)
    }

    async fn delete_member(&self, id: &str) -> Result<(), AppError> {
        if !member::queries::delete(&self.pool, id).await? {
            return Err(AppError::NotFound(format!("Member {id}")));
        }
        log::info!("Deleted member {id}");
        Ok(())
    }
}

impl EventStore for PgStore {
    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        Ok(event::queries::list(&self.pool).await?)
    }

    async fn find_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        Ok(event::queries::find_by_id(&self.pool, id).await?)
    }

    async fn find_event_by_date(&self, date: NaiveDate) -> Result<Option<Event>, AppError> {
        Ok(event::queries::find_by_date(&self.pool, date).await?)
    }

    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError> {
        let created = event::queries::create(&self.pool, &new).await?;
        log::info!("Created event {} on {}", created.id, created.date);
        Ok(created)
    }

    async fn update_event(&self, id: &str, patch: EventPatch) -> Result<Event, AppError> {
        let updated = event::queries::update(&self.pool, id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {id}")))?;
        log::info!("Updated event {id}");
        Ok(updated)
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        if !event::queries::delete(&self.pool, id).await? {
            return Err(AppError::NotFound(format!("Event {id}")));
        }
        log::info!("Deleted event {id}");
        Ok(())
    }
}

impl AttendanceStore for PgStore {
    async fn list_attendance_by_event(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(attendance::queries::list_by_event(&self.pool, event_id).await?)
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(attendance::queries::list_all(&self.pool).await?)
    }

    async fn upsert_attendance(
        &self,
        event_id: &str,
        member_id: &str,
        state: AttendanceState,
    ) -> Result<AttendanceRecord, AppError> {
        match attendance::queries::upsert(&self.pool, event_id, member_id, &state).await {
            Ok(record) => {
                log::info!(
                    "Recorded attendance event={event_id} member={member_id} present={}",
                    record.state.is_present()
                );
                Ok(record)
            }
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Err(AppError::NotFound(
                format!("Event {event_id} or member {member_id}"),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn toggle_attendance(&self, event_id: &str, member_id: &str) -> Result<AttendanceRecord, AppError> {
        match attendance::queries::toggle(&self.pool, event_id, member_id).await {
            Ok(record) => {
                log::info!(
                    "Toggled attendance event={event_id} member={member_id} present={}",
                    record.state.is_present()
                );
                Ok(record)
            }
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Err(AppError::NotFound(
                format!("Event {event_id} or member {member_id}"),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

//! Persistence seams for members, events and attendance.
//!
//! Handlers and the cache only see these traits. `PgStore` is the production
//! backend; `MemoryStore` keeps everything in process.
//!
//! Contract shared by every implementation:
//! - `list_events` is ordered by date ascending, `list_members` by name.
//! - Deleting a member or an event removes its attendance records.
//! - `upsert_attendance` keeps at most one record per (event, member) and
//!   fails with `NotFound` when either id is unknown. `toggle_attendance`
//!   reads and writes the record atomically.
//! - A failed call leaves the store unchanged.

pub mod memory;
pub mod pg;

use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::attendance::{AttendanceRecord, AttendanceState};
use crate::models::event::{Event, EventPatch, NewEvent};
use crate::models::member::Member;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[allow(async_fn_in_trait)]
pub trait MemberStore {
    async fn list_members(&self) -> Result<Vec<Member>, AppError>;
    async fn create_member(&self, name: &str) -> Result<Member, AppError>;
    async fn delete_member(&self, id: &str) -> Result<(), AppError>;
}

#[allow(async_fn_in_trait)]
pub trait EventStore {
    async fn list_events(&self) -> Result<Vec<Event>, AppError>;
    async fn find_event(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn find_event_by_date(&self, date: NaiveDate) -> Result<Option<Event>, AppError>;
    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError>;
    async fn update_event(&self, id: &str, patch: EventPatch) -> Result<Event, AppError>;
    async fn delete_event(&self, id: &str) -> Result<(), AppError>;
}

#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    async fn list_attendance_by_event(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, AppError>;
    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, AppError>;
    async fn upsert_attendance(
        &self,
        event_id: &str,
        member_id: &str,
        state: AttendanceState,
    ) -> Result<AttendanceRecord, AppError>;
    /// Flip presence in one step: present becomes an unjustified absence,
    /// any absence or a missing record becomes present.
    async fn toggle_attendance(&self, event_id: &str, member_id: &str) -> Result<AttendanceRecord, AppError>;
}

/// Everything the HTTP layer needs from a backend.
pub trait Store: MemberStore + EventStore + AttendanceStore + Send + Sync + 'static {}

impl<T> Store for T where T: MemberStore + EventStore + AttendanceStore + Send + Sync + 'static {}

use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use super::{AttendanceStore, EventStore, MemberStore};
use crate::errors::AppError;
use crate::models::attendance::{AttendanceRecord, AttendanceState};
use crate::models::event::{Event, EventPatch, NewEvent};
use crate::models::member::Member;

#[derive(Default)]
struct Tables {
    members: Vec<Member>,
    events: Vec<Event>,
    attendance: Vec<AttendanceRecord>,
}

/// In-process backend with the same ordering and cascade rules as `PgStore`.
/// Rows keep insertion order, which stands in for `created_at`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl MemberStore for MemoryStore {
    async fn list_members(&self) -> Result<Vec<Member>, AppError> {
        let mut members = self.tables().members.clone();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    async fn create_member(&self, name: &str) -> Result<Member, AppError> {
        let member = Member {
            id: new_id(),
            name: name.to_string(),
        };
        self.tables().members.push(member.clone());
        log::info!("Created member {} ({})", member.id, member.name);
        Ok(member)
    }

    async fn delete_member(&self, id: &str) -> Result<(), AppError> {
        let mut tables = self.tables();
        let before = tables.members.len();
        tables.members.retain(|m| m.id != id);
        if tables.members.len() == before {
            return Err(AppError::NotFound(format!("Member {id}")));
        }
        tables.attendance.retain(|r| r.member_id != id);
        log::info!("Deleted member {id}");
        Ok(())
    }
}

impl EventStore for MemoryStore {
    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let mut events = self.tables().events.clone();
        // stable: same-day events stay in creation order
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    async fn find_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        Ok(self.tables().events.iter().find(|e| e.id == id).cloned())
    }

    async fn find_event_by_date(&self, date: NaiveDate) -> Result<Option<Event>, AppError> {
        Ok(self.tables().events.iter().find(|e| e.date == date).cloned())
    }

    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError> {
        let event = Event {
            id: new_id(),
            title: new.title,
            date: new.date,
            description: new.description,
        };
        self.tables().events.push(event.clone());
        log::info!("Created event {} on {}", event.id, event.date);
        Ok(event)
    }

    async fn update_event(&self, id: &str, patch: EventPatch) -> Result<Event, AppError> {
        let mut tables = self.tables();
        let event = tables
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Event {id}")))?;
        patch.apply(event);
        log::info!("Updated event {id}");
        Ok(event.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        let mut tables = self.tables();
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        if tables.events.len() == before {
            return Err(AppError::NotFound(format!("Event {id}")));
        }
        tables.attendance.retain(|r| r.event_id != id);
        log::info!("Deleted event {id}");
        Ok(())
    }
}

impl AttendanceStore for MemoryStore {
    async fn list_attendance_by_event(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(self
            .tables()
            .attendance
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(self.tables().attendance.clone())
    }

    async fn upsert_attendance(
        &self,
        event_id: &str,
        member_id: &str,
        state: AttendanceState,
    ) -> Result<AttendanceRecord, AppError> {
        let mut tables = self.tables();
        let known = tables.events.iter().any(|e| e.id == event_id)
            && tables.members.iter().any(|m| m.id == member_id);
        if !known {
            return Err(AppError::NotFound(format!("Event {event_id} or member {member_id}")));
        }

        let present = state.is_present();
        let existing = tables
            .attendance
            .iter()
            .position(|r| r.event_id == event_id && r.member_id == member_id);
        let record = match existing {
            Some(i) => {
                tables.attendance[i].state = state;
                tables.attendance[i].clone()
            }
            None => {
                let record = AttendanceRecord {
                    id: new_id(),
                    event_id: event_id.to_string(),
                    member_id: member_id.to_string(),
                    state,
                };
                tables.attendance.push(record.clone());
                record
            }
        };
        log::info!("Recorded attendance event={event_id} member={member_id} present={present}");
        Ok(record)
    }

    async fn toggle_attendance(&self, event_id: &str, member_id: &str) -> Result<AttendanceRecord, AppError> {
        let mut tables = self.tables();
        let known = tables.events.iter().any(|e| e.id == event_id)
            && tables.members.iter().any(|m| m.id == member_id);
        if !known {
            return Err(AppError::NotFound(format!("Event {event_id} or member {member_id}")));
        }

        let existing = tables
            .attendance
            .iter()
            .position(|r| r.event_id == event_id && r.member_id == member_id);
        let record = match existing {
            Some(i) => {
                let next = tables.attendance[i].state.toggled();
                tables.attendance[i].state = next;
                tables.attendance[i].clone()
            }
            None => {
                let record = AttendanceRecord {
                    id: new_id(),
                    event_id: event_id.to_string(),
                    member_id: member_id.to_string(),
                    state: AttendanceState::Present,
                };
                tables.attendance.push(record.clone());
                record
            }
        };
        log::info!(
            "Toggled attendance event={event_id} member={member_id} present={}",
            record.state.is_present()
        );
        Ok(record)
    }
}

//! Read-through query cache over a [`Store`](crate::store::Store).
//!
//! Reads are cached per [`QueryKey`]. Every successful mutation invalidates
//! the keys it can affect before it returns, so the next read observes it:
//!
//! | mutation            | invalidates                                  |
//! |---------------------|----------------------------------------------|
//! | create member       | `Members`                                    |
//! | delete member       | `Members`, every attendance key              |
//! | create/update event | `Events`                                     |
//! | delete event        | `Events`, every attendance key               |
//! | upsert/toggle attendance | `AttendanceAll`, `AttendanceByEvent(event)` |
//!
//! Failed mutations invalidate nothing. Per-event attendance is cached only
//! for ids present in the event list, so lookups of unknown events leave no
//! entries behind.
//!
//! A fetch that was already in flight when its key got invalidated returns
//! its result to the caller but does not store it. Each key and each resource
//! carries a generation counter; the value is kept only if both are unchanged
//! since the fetch started.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::attendance::{AttendanceRecord, AttendanceState};
use crate::models::event::{Event, EventPatch, NewEvent};
use crate::models::member::Member;
use crate::store::{AttendanceStore, EventStore, MemberStore};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Members,
    Events,
    AttendanceAll,
    AttendanceByEvent(String),
}

/// Logical resource a query reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Members,
    Events,
    Attendance,
}

impl QueryKey {
    pub fn resource(&self) -> Resource {
        match self {
            QueryKey::Members => Resource::Members,
            QueryKey::Events => Resource::Events,
            QueryKey::AttendanceAll | QueryKey::AttendanceByEvent(_) => Resource::Attendance,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Invalidation {
    /// Drop every key of the resource.
    Resource(Resource),
    Key(QueryKey),
}

#[derive(Clone)]
enum CachedValue {
    Members(Arc<Vec<Member>>),
    Events(Arc<Vec<Event>>),
    Attendance(Arc<Vec<AttendanceRecord>>),
}

trait Cacheable: Sized {
    fn into_cached(value: Arc<Self>) -> CachedValue;
    fn from_cached(value: &CachedValue) -> Option<Arc<Self>>;
}

impl Cacheable for Vec<Member> {
    fn into_cached(value: Arc<Self>) -> CachedValue {
        CachedValue::Members(value)
    }

    fn from_cached(value: &CachedValue) -> Option<Arc<Self>> {
        match value {
            CachedValue::Members(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl Cacheable for Vec<Event> {
    fn into_cached(value: Arc<Self>) -> CachedValue {
        CachedValue::Events(value)
    }

    fn from_cached(value: &CachedValue) -> Option<Arc<Self>> {
        match value {
            CachedValue::Events(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl Cacheable for Vec<AttendanceRecord> {
    fn into_cached(value: Arc<Self>) -> CachedValue {
        CachedValue::Attendance(value)
    }

    fn from_cached(value: &CachedValue) -> Option<Arc<Self>> {
        match value {
            CachedValue::Attendance(v) => Some(v.clone()),
            _ => None,
        }
    }
}

type Stamp = (u64, u64);

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CachedValue>,
    key_generations: HashMap<QueryKey, u64>,
    resource_generations: HashMap<Resource, u64>,
}

impl CacheState {
    fn stamp(&self, key: &QueryKey) -> Stamp {
        (
            self.resource_generations.get(&key.resource()).copied().unwrap_or(0),
            self.key_generations.get(key).copied().unwrap_or(0),
        )
    }

    fn invalidate(&mut self, target: &Invalidation) {
        match target {
            Invalidation::Resource(resource) => {
                self.entries.retain(|k, _| k.resource() != *resource);
                // the resource bump already changes every earlier stamp
                self.key_generations.retain(|k, _| k.resource() != *resource);
                *self.resource_generations.entry(*resource).or_insert(0) += 1;
            }
            Invalidation::Key(key) => {
                self.entries.remove(key);
                *self.key_generations.entry(key.clone()).or_insert(0) += 1;
            }
        }
    }
}

/// Any store, fronted by the query cache. Implements the same store traits.
pub struct CachedStore<S> {
    inner: S,
    state: RwLock<CacheState>,
}

impl<S> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// The uncached backend. Writes made through it bypass invalidation.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn is_cached(&self, key: &QueryKey) -> bool {
        self.read_state().entries.contains_key(key)
    }

    pub fn invalidate(&self, targets: &[Invalidation]) {
        let mut state = self.write_state();
        for target in targets {
            log::debug!("Cache invalidate {target:?}");
            state.invalidate(target);
        }
    }

    fn invalidate_event_attendance(&self, event_id: &str) {
        self.invalidate(&[
            Invalidation::Key(QueryKey::AttendanceAll),
            Invalidation::Key(QueryKey::AttendanceByEvent(event_id.to_string())),
        ]);
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn read_through<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>, AppError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let stamp = {
            let state = self.read_state();
            if let Some(hit) = state.entries.get(&key).and_then(T::from_cached) {
                return Ok(hit);
            }
            state.stamp(&key)
        };

        let fresh = Arc::new(fetch().await?);

        let mut state = self.write_state();
        if state.stamp(&key) == stamp {
            state.entries.insert(key, T::into_cached(fresh.clone()));
        } else {
            log::debug!("Discarding read of {key:?} invalidated while in flight");
        }
        Ok(fresh)
    }
}

impl<S: MemberStore> MemberStore for CachedStore<S> {
    async fn list_members(&self) -> Result<Vec<Member>, AppError> {
        let members = self
            .read_through(QueryKey::Members, || self.inner.list_members())
            .await?;
        Ok(members.as_ref().clone())
    }

    async fn create_member(&self, name: &str) -> Result<Member, AppError> {
        let created = self.inner.create_member(name).await?;
        self.invalidate(&[Invalidation::Resource(Resource::Members)]);
        Ok(created)
    }

    async fn delete_member(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete_member(id).await?;
        self.invalidate(&[
            Invalidation::Resource(Resource::Members),
            Invalidation::Resource(Resource::Attendance),
        ]);
        Ok(())
    }
}

impl<S: EventStore> EventStore for CachedStore<S> {
    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let events = self
            .read_through(QueryKey::Events, || self.inner.list_events())
            .await?;
        Ok(events.as_ref().clone())
    }

    async fn find_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        let events = self
            .read_through(QueryKey::Events, || self.inner.list_events())
            .await?;
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    async fn find_event_by_date(&self, date: NaiveDate) -> Result<Option<Event>, AppError> {
        // list order is date, then creation: the first match is the earliest created
        let events = self
            .read_through(QueryKey::Events, || self.inner.list_events())
            .await?;
        Ok(events.iter().find(|e| e.date == date).cloned())
    }

    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError> {
        let created = self.inner.create_event(new).await?;
        self.invalidate(&[Invalidation::Resource(Resource::Events)]);
        Ok(created)
    }

    async fn update_event(&self, id: &str, patch: EventPatch) -> Result<Event, AppError> {
        let updated = self.inner.update_event(id, patch).await?;
        self.invalidate(&[Invalidation::Resource(Resource::Events)]);
        Ok(updated)
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete_event(id).await?;
        self.invalidate(&[
            Invalidation::Resource(Resource::Events),
            Invalidation::Resource(Resource::Attendance),
        ]);
        Ok(())
    }
}

impl<S: AttendanceStore + EventStore> AttendanceStore for CachedStore<S> {
    async fn list_attendance_by_event(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        // only known events get a cache entry
        let events = self
            .read_through(QueryKey::Events, || self.inner.list_events())
            .await?;
        if !events.iter().any(|e| e.id == event_id) {
            return self.inner.list_attendance_by_event(event_id).await;
        }

        let records = self
            .read_through(QueryKey::AttendanceByEvent(event_id.to_string()), || {
                self.inner.list_attendance_by_event(event_id)
            })
            .await?;
        Ok(records.as_ref().clone())
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, AppError> {
        let records = self
            .read_through(QueryKey::AttendanceAll, || self.inner.list_attendance())
            .await?;
        Ok(records.as_ref().clone())
    }

    async fn upsert_attendance(
        &self,
        event_id: &str,
        member_id: &str,
        state: AttendanceState,
    ) -> Result<AttendanceRecord, AppError> {
        let record = self.inner.upsert_attendance(event_id, member_id, state).await?;
        self.invalidate_event_attendance(event_id);
        Ok(record)
    }

    async fn toggle_attendance(&self, event_id: &str, member_id: &str) -> Result<AttendanceRecord, AppError> {
        let record = self.inner.toggle_attendance(event_id, member_id).await?;
        self.invalidate_event_attendance(event_id);
        Ok(record)
    }
}

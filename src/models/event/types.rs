use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A dated meeting against which attendance is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Validated data for a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Partial update. `description: Some(None)` clears the description;
/// `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<Option<String>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none() && self.description.is_none()
    }

    pub fn apply(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
    }
}

/// Body of `POST /api/events`.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PATCH /api/events/{id}`. An explicit `"description": null`
/// clears the field, an absent key keeps it.
#[derive(Debug, Default, Deserialize)]
pub struct EventPatchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

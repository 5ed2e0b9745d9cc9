use serde::{Deserialize, Serialize};

/// Presence state of one member for one event.
///
/// A present member never carries justification text, and a justification is
/// never blank: `from_parts` folds whitespace-only text into `Unjustified`.
/// A missing record is read as `Unjustified` by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceState {
    Present,
    Justified(String),
    Unjustified,
}

impl AttendanceState {
    /// Build the state from the stored `(is_present, justification)` pair.
    /// Justification text on a present row is dropped.
    pub fn from_parts(is_present: bool, justification: Option<&str>) -> Self {
        if is_present {
            return AttendanceState::Present;
        }
        match justification.map(str::trim) {
            Some(text) if !text.is_empty() => AttendanceState::Justified(text.to_string()),
            _ => AttendanceState::Unjustified,
        }
    }

    /// Absent, justified when `text` is non-blank.
    pub fn absent(text: Option<&str>) -> Self {
        Self::from_parts(false, text)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceState::Present)
    }

    pub fn is_justified(&self) -> bool {
        matches!(self, AttendanceState::Justified(text) if !text.trim().is_empty())
    }

    pub fn is_unjustified(&self) -> bool {
        !self.is_present() && !self.is_justified()
    }

    pub fn justification(&self) -> Option<&str> {
        match self {
            AttendanceState::Justified(text) => Some(text),
            _ => None,
        }
    }

    /// Present becomes an unjustified absence; any absence becomes present.
    pub fn toggled(&self) -> Self {
        if self.is_present() {
            AttendanceState::Unjustified
        } else {
            AttendanceState::Present
        }
    }
}

/// The attendance fact for one (event, member) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AttendanceRow", into = "AttendanceRow")]
pub struct AttendanceRecord {
    pub id: String,
    pub event_id: String,
    pub member_id: String,
    pub state: AttendanceState,
}

/// Flat storage and wire shape of a record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: String,
    pub event_id: String,
    pub member_id: String,
    pub is_present: bool,
    pub justification: Option<String>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        AttendanceRecord {
            state: AttendanceState::from_parts(row.is_present, row.justification.as_deref()),
            id: row.id,
            event_id: row.event_id,
            member_id: row.member_id,
        }
    }
}

impl From<AttendanceRecord> for AttendanceRow {
    fn from(record: AttendanceRecord) -> Self {
        AttendanceRow {
            is_present: record.state.is_present(),
            justification: record.state.justification().map(str::to_string),
            id: record.id,
            event_id: record.event_id,
            member_id: record.member_id,
        }
    }
}

/// Body of `PUT /api/events/{id}/attendance/{member_id}`.
#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub is_present: bool,
    #[serde(default)]
    pub justification: Option<String>,
}

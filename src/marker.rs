//! Mark sheet: attendance-taking state for the currently selected event.
//!
//! The sheet holds the committed records of one event plus unsaved draft
//! justifications typed for absent members. User actions return an
//! [`AttendanceCommand`] for the caller to send to the attendance store; the
//! committed view only changes through [`MarkSheet::refresh`], once the store
//! has confirmed. Drafts are local and change immediately.

use std::collections::HashMap;

use crate::models::attendance::{AttendanceRecord, AttendanceState};
use crate::models::event::Event;
use crate::models::member::Member;

/// An upsert for the attendance store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceCommand {
    pub event_id: String,
    pub member_id: String,
    pub state: AttendanceState,
}

#[derive(Debug, Default)]
pub struct MarkSheet {
    event_id: Option<String>,
    committed: HashMap<String, AttendanceState>,
    drafts: HashMap<String, String>,
}

impl MarkSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to another event. Drafts belong to the previous event and are dropped.
    pub fn select(&mut self, event_id: &str, records: &[AttendanceRecord]) {
        self.event_id = Some(event_id.to_string());
        self.drafts.clear();
        self.refresh(records);
    }

    pub fn deselect(&mut self) {
        self.event_id = None;
        self.committed.clear();
        self.drafts.clear();
    }

    /// Reload committed states for the selected event, keeping drafts.
    pub fn refresh(&mut self, records: &[AttendanceRecord]) {
        let Some(event_id) = self.event_id.as_deref() else {
            return;
        };
        self.committed = records
            .iter()
            .filter(|r| r.event_id == event_id)
            .map(|r| (r.member_id.clone(), r.state.clone()))
            .collect();
    }

    pub fn selected_event(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    /// Committed state, `None` when the member is unmarked.
    pub fn state_of(&self, member_id: &str) -> Option<&AttendanceState> {
        self.committed.get(member_id)
    }

    pub fn draft(&self, member_id: &str) -> Option<&str> {
        self.drafts.get(member_id).map(String::as_str)
    }

    pub fn set_draft(&mut self, member_id: &str, text: &str) {
        self.drafts.insert(member_id.to_string(), text.to_string());
    }

    /// Flip presence. A present member becomes absent, carrying the draft
    /// justification if one was typed; anyone else becomes present.
    pub fn toggle(&mut self, member_id: &str) -> Option<AttendanceCommand> {
        let currently_present = self.state_of(member_id).is_some_and(AttendanceState::is_present);
        if currently_present {
            let state = AttendanceState::absent(self.draft(member_id));
            self.command(member_id, state)
        } else {
            self.mark_present(member_id)
        }
    }

    /// Mark present. Any draft justification for the member is discarded.
    pub fn mark_present(&mut self, member_id: &str) -> Option<AttendanceCommand> {
        let command = self.command(member_id, AttendanceState::Present)?;
        self.drafts.remove(member_id);
        Some(command)
    }

    /// Mark absent with the current draft; a blank draft gives an unjustified absence.
    pub fn save_justification(&mut self, member_id: &str) -> Option<AttendanceCommand> {
        let state = AttendanceState::absent(self.draft(member_id));
        self.command(member_id, state)
    }

    fn command(&self, member_id: &str, state: AttendanceState) -> Option<AttendanceCommand> {
        Some(AttendanceCommand {
            event_id: self.event_id.clone()?,
            member_id: member_id.to_string(),
            state,
        })
    }

    /// Running absence count per member across `events`: every event where
    /// the member is not present, marked or not. On the selected event a
    /// non-blank draft already exempts the absence.
    pub fn live_absences(
        &self,
        members: &[Member],
        events: &[Event],
        all_records: &[AttendanceRecord],
    ) -> HashMap<String, usize> {
        let present: HashMap<(&str, &str), bool> = all_records
            .iter()
            .map(|r| ((r.event_id.as_str(), r.member_id.as_str()), r.state.is_present()))
            .collect();

        members
            .iter()
            .map(|member| {
                let drafted = self
                    .draft(&member.id)
                    .is_some_and(|text| !text.trim().is_empty());
                let count = events
                    .iter()
                    .filter(|event| {
                        let is_present = present
                            .get(&(event.id.as_str(), member.id.as_str()))
                            .copied()
                            .unwrap_or(false);
                        let exempt = drafted && self.selected_event() == Some(event.id.as_str());
                        !is_present && !exempt
                    })
                    .count();
                (member.id.clone(), count)
            })
            .collect()
    }
}

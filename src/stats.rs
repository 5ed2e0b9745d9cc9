//! Attendance aggregation: pure functions over members, events and records.
//!
//! Nothing here performs I/O or keeps state between calls. Malformed input
//! (records for unknown members, duplicate rows, more records than events)
//! yields clamped statistics instead of an error.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::attendance::{AttendanceRecord, AttendanceState};
use crate::models::event::Event;
use crate::models::member::Member;

/// Risk label derived from a count of unjustified absences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceTier {
    Ok,
    Attention,
    Out,
}

impl AbsenceTier {
    pub const ATTENTION_AT: usize = 3;
    pub const OUT_AT: usize = 4;

    pub fn from_count(count: usize) -> Self {
        if count >= Self::OUT_AT {
            AbsenceTier::Out
        } else if count == Self::ATTENTION_AT {
            AbsenceTier::Attention
        } else {
            AbsenceTier::Ok
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AbsenceTier::Ok => "OK",
            AbsenceTier::Attention => "Attention",
            AbsenceTier::Out => "Out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbsenceStatus {
    pub count: usize,
    pub tier: AbsenceTier,
}

impl AbsenceStatus {
    pub fn from_count(count: usize) -> Self {
        Self {
            count,
            tier: AbsenceTier::from_count(count),
        }
    }
}

/// Whether an event with no record for a member counts as an unjustified
/// absence when deriving the member's tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmarkedPolicy {
    /// Only explicit unjustified records count.
    #[default]
    Ignore,
    /// Unmarked events count as unjustified absences too.
    CountAsAbsent,
}

impl FromStr for UnmarkedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(UnmarkedPolicy::Ignore),
            "absent" | "count_as_absent" => Ok(UnmarkedPolicy::CountAsAbsent),
            other => Err(format!("unknown unmarked policy '{other}' (expected 'ignore' or 'absent')")),
        }
    }
}

/// Unjustified absences recorded for one member, across all events.
/// Events without a record are not seen by this scan.
pub fn member_absence_status(member_id: &str, records: &[AttendanceRecord]) -> AbsenceStatus {
    let count = records
        .iter()
        .filter(|r| r.member_id == member_id && r.state.is_unjustified())
        .count();
    AbsenceStatus::from_count(count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Percentages {
    pub present: usize,
    pub justified: usize,
    pub absent: usize,
}

/// Presence breakdown of one event over the full roster.
///
/// `present + justified + absent == total` always holds: members without a
/// record for the event land in `absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub total: usize,
    pub present: usize,
    pub justified: usize,
    pub absent: usize,
}

impl EventStats {
    /// Each share rounded on its own; the three need not add up to 100.
    pub fn percentages(&self) -> Percentages {
        Percentages {
            present: percent(self.present, self.total),
            justified: percent(self.justified, self.total),
            absent: percent(self.absent, self.total),
        }
    }
}

/// `round(count / total * 100)`, half rounding up; 0 when `total` is 0.
pub fn percent(count: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (count * 200 + total) / (2 * total)
}

pub fn event_statistics(event: &Event, members: &[Member], records: &[AttendanceRecord]) -> EventStats {
    let roster: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();

    // one state per roster member; a later duplicate row replaces an earlier one
    let mut marked: HashMap<&str, &AttendanceState> = HashMap::new();
    for record in records {
        if record.event_id == event.id && roster.contains(record.member_id.as_str()) {
            marked.insert(record.member_id.as_str(), &record.state);
        }
    }

    let total = roster.len();
    let present = marked.values().filter(|s| s.is_present()).count();
    let justified = marked.values().filter(|s| s.is_justified()).count();
    EventStats {
        total,
        present,
        justified,
        absent: total - present - justified,
    }
}

/// One member's record counts across every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberStats {
    pub present: usize,
    pub justified: usize,
    /// Explicit unjustified records only.
    pub absent: usize,
    /// Events with no record for the member.
    pub not_marked: usize,
}

impl MemberStats {
    /// Explicit unjustified absences plus unmarked events.
    pub fn total_absent(&self) -> usize {
        self.absent + self.not_marked
    }

    pub fn risk_count(&self, policy: UnmarkedPolicy) -> usize {
        match policy {
            UnmarkedPolicy::Ignore => self.absent,
            UnmarkedPolicy::CountAsAbsent => self.total_absent(),
        }
    }

    pub fn status(&self, policy: UnmarkedPolicy) -> AbsenceStatus {
        AbsenceStatus::from_count(self.risk_count(policy))
    }
}

pub fn member_stats_across_events(
    member_id: &str,
    records: &[AttendanceRecord],
    total_event_count: usize,
) -> MemberStats {
    let mut stats = MemberStats::default();
    let mut recorded = 0;
    for record in records.iter().filter(|r| r.member_id == member_id) {
        recorded += 1;
        match &record.state {
            s if s.is_present() => stats.present += 1,
            s if s.is_justified() => stats.justified += 1,
            _ => stats.absent += 1,
        }
    }
    stats.not_marked = total_event_count.saturating_sub(recorded);
    stats
}

#[derive(Debug, Clone, Serialize)]
pub struct EventOverview {
    pub event: Event,
    pub stats: EventStats,
    pub percentages: Percentages,
    /// The event date is before `today`.
    pub held: bool,
}

/// Statistics for every event, newest first.
pub fn events_overview(
    events: &[Event],
    members: &[Member],
    records: &[AttendanceRecord],
    today: NaiveDate,
) -> Vec<EventOverview> {
    let mut overview: Vec<EventOverview> = events
        .iter()
        .map(|event| {
            let stats = event_statistics(event, members, records);
            EventOverview {
                event: event.clone(),
                percentages: stats.percentages(),
                stats,
                held: event.date < today,
            }
        })
        .collect();
    overview.sort_by(|a, b| b.event.date.cmp(&a.event.date));
    overview
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberOverview {
    pub member: Member,
    pub stats: MemberStats,
    pub total_absent: usize,
    pub status: AbsenceStatus,
}

/// Per-member statistics in roster order. Records for events not in
/// `events` are ignored, so `not_marked` is exact and never negative.
pub fn roster_overview(
    members: &[Member],
    events: &[Event],
    records: &[AttendanceRecord],
    policy: UnmarkedPolicy,
) -> Vec<MemberOverview> {
    let known: HashSet<&str> = events.iter().map(|e| e.id.as_str()).collect();
    let relevant: Vec<AttendanceRecord> = records
        .iter()
        .filter(|r| known.contains(r.event_id.as_str()))
        .cloned()
        .collect();

    members
        .iter()
        .map(|member| {
            let stats = member_stats_across_events(&member.id, &relevant, known.len());
            MemberOverview {
                member: member.clone(),
                total_absent: stats.total_absent(),
                status: stats.status(policy),
                stats,
            }
        })
        .collect()
}

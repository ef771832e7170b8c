//! Epoch stamps, assignment events, and epoch summaries.
//!
//! An epoch is one full evaluation pass assigning every tracked vehicle to a
//! zone or to none. Each vehicle ends an epoch in exactly one of three states:
//!
//! ```text
//! snapshot → candidates → exact test → Assigned(zone)
//!                                    → Unassigned
//!          → Skipped (invalid position, counter invariant, interrupted)
//! ```

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, ZoneId};

/// Identity of one evaluation epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EpochStamp {
    /// Monotonic sequence number, starting at 1 for the first epoch of a process.
    pub seq: u64,
    /// Timestamp written on every assignment and counter produced by this epoch.
    pub at: DateTime<Utc>,
}

/// Outcome of resolving one vehicle in one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssignmentEvent {
    Assigned {
        vehicle_id: EntityId,
        zone_id: ZoneId,
        at: DateTime<Utc>,
        /// Counter value after this epoch's increment.
        count: u64,
    },
    Unassigned {
        vehicle_id: EntityId,
        at: DateTime<Utc>,
    },
    Skipped {
        vehicle_id: EntityId,
        reason: SkipReason,
    },
}

impl AssignmentEvent {
    #[must_use]
    pub const fn vehicle_id(&self) -> &EntityId {
        match self {
            Self::Assigned { vehicle_id, .. }
            | Self::Unassigned { vehicle_id, .. }
            | Self::Skipped { vehicle_id, .. } => vehicle_id,
        }
    }

    #[must_use]
    pub const fn zone_id(&self) -> Option<ZoneId> {
        match self {
            Self::Assigned { zone_id, .. } => Some(*zone_id),
            Self::Unassigned { .. } | Self::Skipped { .. } => None,
        }
    }
}

/// Why a vehicle was left out of an epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Non-finite coordinate.
    InvalidPosition(String),
    /// The counter store refused a second increment for the pair in one epoch.
    DuplicateIncrement(String),
    /// Shutdown was requested before this vehicle was resolved.
    Interrupted,
}

/// Aggregate counts for one epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EpochSummary {
    pub seq: u64,
    pub started_at: Option<DateTime<Utc>>,
    /// Vehicles in the snapshot.
    pub processed: u32,
    pub assigned: u32,
    pub unassigned: u32,
    pub skipped: u32,
    pub zones_loaded: u32,
    pub zones_skipped: u32,
    pub sink_failures: u32,
    pub interrupted: bool,
    pub duration_ms: u64,
}

impl EpochSummary {
    /// Tally a batch of events into a summary for `stamp`.
    #[must_use]
    pub fn from_events(stamp: EpochStamp, events: &[AssignmentEvent]) -> Self {
        let mut summary = Self {
            seq: stamp.seq,
            started_at: Some(stamp.at),
            ..Self::default()
        };
        for event in events {
            summary.processed += 1;
            match event {
                AssignmentEvent::Assigned { .. } => summary.assigned += 1,
                AssignmentEvent::Unassigned { .. } => summary.unassigned += 1,
                AssignmentEvent::Skipped { reason, .. } => {
                    summary.skipped += 1;
                    if matches!(reason, SkipReason::Interrupted) {
                        summary.interrupted = true;
                    }
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn summary_counts_each_state() {
        let stamp = EpochStamp {
            seq: 3,
            at: Utc::now(),
        };
        let events = vec![
            AssignmentEvent::Assigned {
                vehicle_id: "a".into(),
                zone_id: ZoneId(1),
                at: stamp.at,
                count: 1,
            },
            AssignmentEvent::Unassigned {
                vehicle_id: "b".into(),
                at: stamp.at,
            },
            AssignmentEvent::Skipped {
                vehicle_id: "c".into(),
                reason: SkipReason::InvalidPosition("NaN".into()),
            },
        ];
        let summary = EpochSummary::from_events(stamp, &events);
        assert_eq!(summary.seq, 3);
        assert_eq!(
            (summary.processed, summary.assigned, summary.unassigned, summary.skipped),
            (3, 1, 1, 1)
        );
        assert!(!summary.interrupted);
    }

    #[test]
    fn interrupted_skip_marks_summary() {
        let stamp = EpochStamp {
            seq: 1,
            at: Utc::now(),
        };
        let events = vec![AssignmentEvent::Skipped {
            vehicle_id: "a".into(),
            reason: SkipReason::Interrupted,
        }];
        assert!(EpochSummary::from_events(stamp, &events).interrupted);
    }

    #[test]
    fn event_serializes_with_state_tag() {
        let event = AssignmentEvent::Unassigned {
            vehicle_id: "taxi-9".into(),
            at: "2026-02-08T12:00:00Z".parse().unwrap(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["state"], "unassigned");
        assert_eq!(value["vehicle_id"], "taxi-9");
    }
}

//! Domain event catalogue
//!
//! Every component publishes to an external sink; none consume from it. The
//! wire names (`SEGMENT_RESERVED`, ...) are the audit trail's vocabulary and
//! are stable across releases.

use crate::{Conflict, Mission, MissionId, Priority, Segment, SegmentHold, SegmentId, Vehicle};
use serde::{Deserialize, Serialize};

/// A domain event: the affected entity plus enough context to audit the
/// decision without re-reading the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum DomainEvent {
    VehicleRegistered {
        vehicle: Vehicle,
    },
    VehicleUpdated {
        vehicle: Vehicle,
    },
    SegmentReserved {
        segment: Segment,
    },
    SegmentReleased {
        segment: Segment,
    },
    SegmentOccupied {
        segment: Segment,
    },
    /// A higher-priority requester evicted the previous holder. Carries both
    /// holds so the evicted mission can be reconciled asynchronously.
    PreemptionTriggered {
        segment_id: SegmentId,
        old_hold: SegmentHold,
        new_hold: SegmentHold,
        new_priority: Priority,
    },
    ConflictDetected {
        conflict: Conflict,
    },
    ConflictResolved {
        conflict: Conflict,
    },
    MissionCreated {
        mission: Mission,
    },
    /// Activation succeeded; any tie conflicts raised along the path ride
    /// along for visibility.
    MissionActivated {
        mission: Mission,
        conflicts: Vec<Conflict>,
    },
    MissionCompleted {
        mission: Mission,
    },
    MissionAborted {
        mission: Mission,
        reason: String,
    },
    MissionRerouted {
        mission_id: MissionId,
        new_path: Vec<SegmentId>,
    },
}

impl DomainEvent {
    /// Stable wire name for the audit trail.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::VehicleRegistered { .. } => "VEHICLE_REGISTERED",
            DomainEvent::VehicleUpdated { .. } => "VEHICLE_UPDATED",
            DomainEvent::SegmentReserved { .. } => "SEGMENT_RESERVED",
            DomainEvent::SegmentReleased { .. } => "SEGMENT_RELEASED",
            DomainEvent::SegmentOccupied { .. } => "SEGMENT_OCCUPIED",
            DomainEvent::PreemptionTriggered { .. } => "PREEMPTION_TRIGGERED",
            DomainEvent::ConflictDetected { .. } => "CONFLICT_DETECTED",
            DomainEvent::ConflictResolved { .. } => "CONFLICT_RESOLVED",
            DomainEvent::MissionCreated { .. } => "MISSION_CREATED",
            DomainEvent::MissionActivated { .. } => "MISSION_ACTIVATED",
            DomainEvent::MissionCompleted { .. } => "MISSION_COMPLETED",
            DomainEvent::MissionAborted { .. } => "MISSION_ABORTED",
            DomainEvent::MissionRerouted { .. } => "MISSION_REROUTED",
        }
    }

    /// The mission this event concerns, when there is exactly one.
    ///
    /// Preemptions and conflicts concern two missions and return `None`;
    /// consumers needing both should match the variant directly.
    pub fn mission_id(&self) -> Option<&MissionId> {
        match self {
            DomainEvent::MissionCreated { mission }
            | DomainEvent::MissionActivated { mission, .. }
            | DomainEvent::MissionCompleted { mission }
            | DomainEvent::MissionAborted { mission, .. } => Some(&mission.mission_id),
            DomainEvent::MissionRerouted { mission_id, .. } => Some(mission_id),
            DomainEvent::SegmentReserved { segment }
            | DomainEvent::SegmentReleased { segment }
            | DomainEvent::SegmentOccupied { segment } => {
                segment.hold.as_ref().map(|h| &h.mission_id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Credential, OrgId, VehicleId};

    #[test]
    fn test_event_type_names_are_stable() {
        let vehicle = Vehicle::new(
            VehicleId::from("V1"),
            OrgId::from("medical"),
            "ambulance",
            Priority::new(2).unwrap(),
            Credential::from("MedicalMSP"),
        );
        let event = DomainEvent::VehicleRegistered { vehicle };
        assert_eq!(event.event_type(), "VEHICLE_REGISTERED");

        let seg = Segment::free(SegmentId::from("S1"));
        assert_eq!(
            DomainEvent::SegmentReserved { segment: seg }.event_type(),
            "SEGMENT_RESERVED"
        );
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = DomainEvent::MissionRerouted {
            mission_id: MissionId::from("M1"),
            new_path: vec![SegmentId::from("S1"), SegmentId::from("S9")],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "MissionRerouted");
        assert_eq!(json["payload"]["new_path"][1], "S9");

        let back: DomainEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_mission_id_extraction() {
        let event = DomainEvent::MissionRerouted {
            mission_id: MissionId::from("M7"),
            new_path: vec![],
        };
        assert_eq!(event.mission_id(), Some(&MissionId::from("M7")));

        let free = DomainEvent::SegmentReleased {
            segment: Segment::free(SegmentId::from("S2")),
        };
        assert_eq!(free.mission_id(), None);
    }
}

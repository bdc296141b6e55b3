//! Core entity structures

use crate::{
    ConflictId, ConflictResolution, ConflictStatus, Credential, MissionId, MissionStatus, OrgId,
    Priority, SegmentId, SegmentStatus, Timestamp, VehicleId, VehicleStatus,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ============================================================================
// VEHICLE
// ============================================================================

/// An emergency vehicle registered by one of the operating organizations.
///
/// Created on registration, never deleted; status is mutated by the mission
/// orchestrator around activation/completion and by direct operator calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: VehicleId,
    pub org: OrgId,
    /// Free-form subtype, e.g. "ambulance", "patrol_car".
    pub vehicle_type: String,
    pub priority: Priority,
    pub status: VehicleStatus,
    /// Credential that registered this vehicle.
    pub registered_by: Credential,
    pub registered_at: Timestamp,
}

impl Vehicle {
    /// Create a newly registered vehicle (status Active).
    pub fn new(
        vehicle_id: VehicleId,
        org: OrgId,
        vehicle_type: impl Into<String>,
        priority: Priority,
        registered_by: Credential,
    ) -> Self {
        Self {
            vehicle_id,
            org,
            vehicle_type: vehicle_type.into(),
            priority,
            status: VehicleStatus::Active,
            registered_by,
            registered_at: Utc::now(),
        }
    }
}

// ============================================================================
// SEGMENT
// ============================================================================

/// Holder state of a reserved or occupied segment.
///
/// Grouped into one struct so a segment is either fully held or fully free;
/// there is no representable state with a holder vehicle but no mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentHold {
    pub vehicle_id: VehicleId,
    pub mission_id: MissionId,
    pub org: OrgId,
    pub priority: Priority,
    pub reserved_at: Timestamp,
}

impl SegmentHold {
    pub fn new(
        vehicle_id: VehicleId,
        mission_id: MissionId,
        org: OrgId,
        priority: Priority,
    ) -> Self {
        Self {
            vehicle_id,
            mission_id,
            org,
            priority,
            reserved_at: Utc::now(),
        }
    }
}

/// A road segment's reservation state.
///
/// Topology (adjacency, geometry) lives outside the core; segments
/// materialize lazily, so a segment with no stored record reads as free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: SegmentId,
    pub status: SegmentStatus,
    /// `None` exactly when `status` is [`SegmentStatus::Free`].
    pub hold: Option<SegmentHold>,
}

impl Segment {
    /// A free segment, as materialized on first reference.
    pub fn free(segment_id: SegmentId) -> Self {
        Self {
            segment_id,
            status: SegmentStatus::Free,
            hold: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.hold.is_none()
    }

    /// The vehicle currently holding this segment, if any.
    pub fn holder(&self) -> Option<&VehicleId> {
        self.hold.as_ref().map(|h| &h.vehicle_id)
    }

    /// Install a hold (grant or preemption overwrite), returning the previous
    /// hold if one existed.
    pub fn install_hold(&mut self, hold: SegmentHold) -> Option<SegmentHold> {
        let previous = self.hold.replace(hold);
        self.status = SegmentStatus::Reserved;
        previous
    }

    /// Clear the hold, returning the segment to free.
    pub fn clear_hold(&mut self) -> Option<SegmentHold> {
        self.status = SegmentStatus::Free;
        self.hold.take()
    }

    /// Mark the vehicle as physically present. Does not touch the hold or its
    /// reservation timestamp.
    pub fn mark_occupied(&mut self) {
        self.status = SegmentStatus::Occupied;
    }
}

// ============================================================================
// MISSION
// ============================================================================

/// An emergency mission assigned to a single vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub mission_id: MissionId,
    pub vehicle_id: VehicleId,
    pub org: OrgId,
    /// Copied from the vehicle at creation.
    pub priority: Priority,
    /// Origin node marker; opaque to the core.
    pub origin_node: String,
    /// Destination node marker; opaque to the core.
    pub dest_node: String,
    /// Ordered segment ids requested at activation (or the latest reroute).
    ///
    /// This is a historical record of what the mission asked for, not a live
    /// holder list: a segment preempted away from the mission still appears
    /// here. The preemption event carries both missions for reconciliation.
    pub path: Vec<SegmentId>,
    pub status: MissionStatus,
    pub created_at: Timestamp,
    pub activated_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_by: Credential,
    /// Operator-supplied reason, set when the mission is aborted.
    pub abort_reason: Option<String>,
}

impl Mission {
    /// Create a pending mission with an empty path.
    pub fn new(
        mission_id: MissionId,
        vehicle_id: VehicleId,
        org: OrgId,
        priority: Priority,
        origin_node: impl Into<String>,
        dest_node: impl Into<String>,
        created_by: Credential,
    ) -> Self {
        Self {
            mission_id,
            vehicle_id,
            org,
            priority,
            origin_node: origin_node.into(),
            dest_node: dest_node.into(),
            path: Vec::new(),
            status: MissionStatus::Pending,
            created_at: Utc::now(),
            activated_at: None,
            completed_at: None,
            created_by,
            abort_reason: None,
        }
    }

    /// Transition pending → active with the reserved path.
    pub fn activate_with_path(&mut self, path: Vec<SegmentId>) {
        self.status = MissionStatus::Active;
        self.activated_at = Some(Utc::now());
        self.path = path;
    }

    /// Transition active → completed.
    pub fn complete(&mut self) {
        self.status = MissionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Transition pending | active → aborted, recording the reason.
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.status = MissionStatus::Aborted;
        self.completed_at = Some(Utc::now());
        self.abort_reason = Some(reason.into());
    }
}

// ============================================================================
// CONFLICT
// ============================================================================

/// A recorded, unresolved tie between two equal-priority missions contending
/// for the same segment.
///
/// Mission 1 is always the incumbent (the holder at conflict creation);
/// mission 2 is the challenger whose reservation attempt was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_id: ConflictId,
    pub segment_id: SegmentId,
    pub mission1_id: MissionId,
    pub mission2_id: MissionId,
    pub priority1: Priority,
    pub priority2: Priority,
    pub status: ConflictStatus,
    pub resolution: Option<ConflictResolution>,
    pub resolved_by: Option<Credential>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Conflict {
    /// Create a pending conflict between the incumbent holder and a
    /// challenger.
    pub fn between(
        segment_id: SegmentId,
        incumbent_mission: MissionId,
        incumbent_priority: Priority,
        challenger_mission: MissionId,
        challenger_priority: Priority,
    ) -> Self {
        Self {
            conflict_id: ConflictId::generate(&segment_id),
            segment_id,
            mission1_id: incumbent_mission,
            mission2_id: challenger_mission,
            priority1: incumbent_priority,
            priority2: challenger_priority,
            status: ConflictStatus::Pending,
            resolution: None,
            resolved_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    /// Record a resolution. Advisory: changes no segment state.
    pub fn resolve(&mut self, resolution: ConflictResolution, resolved_by: Credential) {
        self.status = ConflictStatus::Resolved;
        self.resolution = Some(resolution);
        self.resolved_by = Some(resolved_by);
        self.resolved_at = Some(Utc::now());
    }
}

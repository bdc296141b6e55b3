//! Status enums and bounded value types for ARTERIA entities

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENTITY KIND
// ============================================================================

/// Entity type discriminator, used in errors and store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Vehicle,
    Segment,
    Mission,
    Conflict,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Vehicle => "vehicle",
            EntityKind::Segment => "segment",
            EntityKind::Mission => "mission",
            EntityKind::Conflict => "conflict",
        };
        f.write_str(s)
    }
}

// ============================================================================
// PRIORITY
// ============================================================================

/// Priority level attached to a vehicle and inherited by its missions.
///
/// Integer 1 (most urgent) to 5 (least urgent); a numerically smaller value
/// always wins contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const MOST_URGENT: Priority = Priority(1);
    pub const LEAST_URGENT: Priority = Priority(5);

    /// Validate and wrap a raw priority level.
    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&level) {
            return Err(ValidationError::PriorityOutOfRange { value: level });
        }
        Ok(Self(level))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// True when this priority beats `other` in contention.
    pub fn outranks(&self, other: Priority) -> bool {
        self.0 < other.0
    }

    /// True when both sides are equally urgent (the tie-conflict case).
    pub fn ties_with(&self, other: Priority) -> bool {
        self.0 == other.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// VEHICLE STATUS
// ============================================================================

/// Availability status of a registered vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    /// Available for mission assignment
    Active,
    /// Out of service
    Inactive,
    /// Currently assigned to an active mission
    OnMission,
}

impl VehicleStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Inactive => "inactive",
            VehicleStatus::OnMission => "on_mission",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ValidationError> {
        match s {
            "active" => Ok(VehicleStatus::Active),
            "inactive" => Ok(VehicleStatus::Inactive),
            "on_mission" => Ok(VehicleStatus::OnMission),
            _ => Err(ValidationError::InvalidValue {
                field: "vehicle status".to_string(),
                reason: format!("unknown value: {s}"),
            }),
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// SEGMENT STATUS
// ============================================================================

/// Reservation status of a road segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentStatus {
    /// No holder
    Free,
    /// Held by a mission that has not yet physically entered
    Reserved,
    /// Held by a mission whose vehicle is currently on the segment
    Occupied,
}

impl SegmentStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SegmentStatus::Free => "free",
            SegmentStatus::Reserved => "reserved",
            SegmentStatus::Occupied => "occupied",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, ValidationError> {
        match s {
            "free" => Ok(SegmentStatus::Free),
            "reserved" => Ok(SegmentStatus::Reserved),
            "occupied" => Ok(SegmentStatus::Occupied),
            _ => Err(ValidationError::InvalidValue {
                field: "segment status".to_string(),
                reason: format!("unknown value: {s}"),
            }),
        }
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for SegmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// MISSION STATUS
// ============================================================================

/// Lifecycle status of a mission.
///
/// pending →(activate)→ active →(complete)→ completed;
/// pending | active →(abort)→ aborted. Completed and Aborted are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionStatus {
    Pending,
    Active,
    Completed,
    Aborted,
}

impl MissionStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            MissionStatus::Pending => "pending",
            MissionStatus::Active => "active",
            MissionStatus::Completed => "completed",
            MissionStatus::Aborted => "aborted",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(MissionStatus::Pending),
            "active" => Ok(MissionStatus::Active),
            "completed" => Ok(MissionStatus::Completed),
            "aborted" => Ok(MissionStatus::Aborted),
            _ => Err(ValidationError::InvalidValue {
                field: "mission status".to_string(),
                reason: format!("unknown value: {s}"),
            }),
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Aborted)
    }

    /// Abort is allowed from pending or active.
    pub fn can_abort(&self) -> bool {
        matches!(self, MissionStatus::Pending | MissionStatus::Active)
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for MissionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// CONFLICT STATUS / RESOLUTION
// ============================================================================

/// Status of a tie-priority conflict record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictStatus {
    Pending,
    Resolved,
}

impl ConflictStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ConflictStatus::Pending => "pending",
            ConflictStatus::Resolved => "resolved",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(ConflictStatus::Pending),
            "resolved" => Ok(ConflictStatus::Resolved),
            _ => Err(ValidationError::InvalidValue {
                field: "conflict status".to_string(),
                reason: format!("unknown value: {s}"),
            }),
        }
    }
}

impl fmt::Display for ConflictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Recorded intent for how a conflict should be settled.
///
/// Advisory only: realizing a resolution requires explicit follow-up calls
/// into the ledger or orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictResolution {
    /// The incumbent mission (holder at conflict creation) keeps the segment
    Mission1Wins,
    /// The challenger takes the segment
    Mission2Wins,
    /// Both missions should route around the contested segment
    BothReroute,
}

impl ConflictResolution {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ConflictResolution::Mission1Wins => "mission1_wins",
            ConflictResolution::Mission2Wins => "mission2_wins",
            ConflictResolution::BothReroute => "both_reroute",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, ValidationError> {
        match s {
            "mission1_wins" => Ok(ConflictResolution::Mission1Wins),
            "mission2_wins" => Ok(ConflictResolution::Mission2Wins),
            "both_reroute" => Ok(ConflictResolution::BothReroute),
            _ => Err(ValidationError::InvalidValue {
                field: "conflict resolution".to_string(),
                reason: format!("unknown value: {s}"),
            }),
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for ConflictResolution {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_accepts_full_range() {
        for level in 1..=5u8 {
            assert_eq!(Priority::new(level).unwrap().level(), level);
        }
    }

    #[test]
    fn test_priority_rejects_out_of_range() {
        for level in [0u8, 6, 100] {
            assert!(matches!(
                Priority::new(level),
                Err(ValidationError::PriorityOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_priority_ordering() {
        let urgent = Priority::new(1).unwrap();
        let routine = Priority::new(4).unwrap();
        assert!(urgent.outranks(routine));
        assert!(!routine.outranks(urgent));
        assert!(routine.ties_with(Priority::new(4).unwrap()));
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            VehicleStatus::Active,
            VehicleStatus::Inactive,
            VehicleStatus::OnMission,
        ] {
            assert_eq!(VehicleStatus::from_db_str(status.as_db_str()).unwrap(), status);
        }
        for status in [
            MissionStatus::Pending,
            MissionStatus::Active,
            MissionStatus::Completed,
            MissionStatus::Aborted,
        ] {
            assert_eq!(MissionStatus::from_db_str(status.as_db_str()).unwrap(), status);
        }
        for res in [
            ConflictResolution::Mission1Wins,
            ConflictResolution::Mission2Wins,
            ConflictResolution::BothReroute,
        ] {
            assert_eq!(ConflictResolution::from_db_str(res.as_db_str()).unwrap(), res);
        }
    }

    #[test]
    fn test_mission_status_terminality() {
        assert!(MissionStatus::Completed.is_terminal());
        assert!(MissionStatus::Aborted.is_terminal());
        assert!(!MissionStatus::Pending.is_terminal());
        assert!(MissionStatus::Pending.can_abort());
        assert!(MissionStatus::Active.can_abort());
        assert!(!MissionStatus::Completed.can_abort());
    }

    #[test]
    fn test_invalid_status_string_rejected() {
        assert!(VehicleStatus::from_db_str("parked").is_err());
        assert!(SegmentStatus::from_db_str("closed").is_err());
        assert!(MissionStatus::from_db_str("paused").is_err());
    }
}

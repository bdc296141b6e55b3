//! Error types for ARTERIA operations

use crate::enums::EntityKind;
use crate::identity::{ConflictId, MissionId, SegmentId, VehicleId};
use thiserror::Error;

/// Validation errors: malformed or out-of-range input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("{kind} id must not be empty")]
    EmptyId { kind: EntityKind },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Priority level must be between 1 and 5, got {value}")]
    PriorityOutOfRange { value: u8 },

    #[error("Unknown organization: {org}")]
    UnknownOrganization { org: String },

    #[error("Mission {mission_id} path must not be empty")]
    EmptyPath { mission_id: MissionId },
}

/// Storage layer errors.
///
/// Implementations provide per-key conflict detection at commit time: a
/// writer that read a stale version gets `VersionConflict` and must retry at
/// the integration layer. The core never retries internally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("Stale write to {kind} {id}: version conflict at commit")]
    VersionConflict { kind: EntityKind, id: String },

    #[error("Read failed for {kind} {id}: {reason}")]
    ReadFailed {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    #[error("Write failed for {kind} {id}: {reason}")]
    WriteFailed {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Authorization errors: the caller's resolved organization does not own the
/// touched resource, or the caller cannot be resolved at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unknown credential: {credential}")]
    UnknownCredential { credential: String },

    #[error("Access denied: caller org {caller_org} cannot {action} a resource owned by {owner_org}")]
    OrgMismatch {
        caller_org: String,
        owner_org: String,
        action: &'static str,
    },

    #[error("Segment {segment_id} is not held by vehicle {vehicle_id}")]
    NotHolder {
        segment_id: SegmentId,
        vehicle_id: VehicleId,
    },
}

/// Lifecycle state errors: the operation is invalid for the entity's current
/// state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Mission {mission_id} is not pending (current: {current})")]
    MissionNotPending { mission_id: MissionId, current: String },

    #[error("Mission {mission_id} is not active (current: {current})")]
    MissionNotActive { mission_id: MissionId, current: String },

    #[error("Mission {mission_id} cannot be aborted (current: {current})")]
    MissionNotAbortable { mission_id: MissionId, current: String },

    #[error("Vehicle {vehicle_id} is already on a mission")]
    VehicleOnMission { vehicle_id: VehicleId },

    #[error("Conflict {conflict_id} is already resolved")]
    ConflictAlreadyResolved { conflict_id: ConflictId },

    #[error("Segment {segment_id} is not reserved")]
    SegmentNotReserved { segment_id: SegmentId },
}

/// Reservation arbitration losses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error(
        "Segment {segment_id} is reserved at priority {holder_priority}, \
         denying request at priority {requested_priority}"
    )]
    Denied {
        segment_id: SegmentId,
        holder_priority: u8,
        requested_priority: u8,
    },
}

/// Master error type for all ARTERIA operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArteriaError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Reservation error: {0}")]
    Reservation(#[from] ReservationError),
}

/// Result type alias for ARTERIA operations.
pub type ArteriaResult<T> = Result<T, ArteriaError>;

// ============================================================================
// WARNINGS
// ============================================================================

/// Outcome of a best-effort compensation step.
///
/// Steps marked best-effort (vehicle status sync, compensating releases)
/// swallow their own failures into one of these rather than failing the
/// enclosing operation; callers must treat the affected state as eventually,
/// not immediately, consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Which step failed, e.g. "release segment S3".
    pub step: String,
    /// The swallowed error.
    pub source: ArteriaError,
}

impl Warning {
    pub fn new(step: impl Into<String>, source: ArteriaError) -> Self {
        Self {
            step: step.into(),
            source,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            kind: EntityKind::Vehicle,
            id: "V9".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("vehicle"));
        assert!(msg.contains("V9"));
    }

    #[test]
    fn test_auth_error_display_org_mismatch() {
        let err = AuthError::OrgMismatch {
            caller_org: "police".to_string(),
            owner_org: "medical".to_string(),
            action: "abort mission",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("police"));
        assert!(msg.contains("medical"));
        assert!(msg.contains("abort mission"));
    }

    #[test]
    fn test_reservation_denied_display() {
        let err = ReservationError::Denied {
            segment_id: SegmentId::from("S4"),
            holder_priority: 1,
            requested_priority: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("S4"));
        assert!(msg.contains('1'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_arteria_error_from_variants() {
        let validation = ArteriaError::from(ValidationError::PriorityOutOfRange { value: 9 });
        assert!(matches!(validation, ArteriaError::Validation(_)));

        let storage = ArteriaError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, ArteriaError::Storage(_)));

        let auth = ArteriaError::from(AuthError::UnknownCredential {
            credential: "GhostMSP".to_string(),
        });
        assert!(matches!(auth, ArteriaError::Auth(_)));

        let state = ArteriaError::from(StateError::VehicleOnMission {
            vehicle_id: VehicleId::from("V1"),
        });
        assert!(matches!(state, ArteriaError::State(_)));

        let reservation = ArteriaError::from(ReservationError::Denied {
            segment_id: SegmentId::from("S1"),
            holder_priority: 2,
            requested_priority: 4,
        });
        assert!(matches!(reservation, ArteriaError::Reservation(_)));
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::new(
            "release segment S3",
            ArteriaError::State(StateError::SegmentNotReserved {
                segment_id: SegmentId::from("S3"),
            }),
        );
        let msg = format!("{}", w);
        assert!(msg.starts_with("release segment S3:"));
        assert!(msg.contains("not reserved"));
    }
}

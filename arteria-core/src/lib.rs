//! ARTERIA Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no reservation or lifecycle logic.
//!
//! The domain: a finite, shared grid of road segments allocated among
//! competing emergency-vehicle missions run by mutually distrusting
//! organizations. Contention is arbitrated by numeric priority (1 most
//! urgent, 5 least); equal priorities produce a recorded conflict instead of
//! a grant.

mod config;
mod entities;
mod enums;
mod error;
mod event;
mod identity;

pub use config::{ArteriaConfig, OrgMapping};
pub use entities::{Conflict, Mission, Segment, SegmentHold, Vehicle};
pub use enums::{
    ConflictResolution, ConflictStatus, EntityKind, MissionStatus, Priority, SegmentStatus,
    VehicleStatus,
};
pub use error::{
    ArteriaError, ArteriaResult, AuthError, ReservationError, StateError, StorageError,
    ValidationError, Warning,
};
pub use event::DomainEvent;
pub use identity::{
    ConflictId, Credential, MissionId, OrgDirectory, OrgId, SegmentId, Timestamp, VehicleId,
};

//! ARTERIA Dispatch - Reservation Arbitration and Mission Lifecycle
//!
//! The behavior layer over `arteria-storage` and `arteria-events`:
//!
//! - [`VehicleRegistry`] owns vehicle identity, organization, priority, and
//!   availability status.
//! - [`SegmentLedger`] owns per-segment holder state and the
//!   priority-arbitration rule (grant / preempt / conflict / deny).
//! - [`ConflictArbiter`] owns tie-contention conflict records and their
//!   advisory resolution.
//! - [`MissionOrchestrator`] composes the above into the mission state
//!   machine and the multi-segment reserve/rollback/reroute protocol.
//!
//! Every mutating call is one synchronous request→decision round: no
//! queueing, no blocking waits, no cancellation primitive. Authorization is
//! recomputed on every call from the caller's resolved organization.

mod arbiter;
mod ledger;
mod orchestrator;
mod registry;
mod shared;

#[cfg(test)]
mod test_fixtures;

pub use arbiter::ConflictArbiter;
pub use ledger::{ReservationOutcome, SegmentLedger};
pub use orchestrator::{
    ActivationReport, CompletionReport, MissionOrchestrator, RerouteReport,
};
pub use registry::VehicleRegistry;

//! Segment reservation ledger
//!
//! The core arbitration primitive. Every reservation attempt is decided
//! synchronously against whichever segment state is current at commit time:
//! grant on free, preempt on outranking priority, conflict record on tie,
//! denial otherwise. There is no queueing and no fairness guarantee across
//! commit order.

use crate::shared::resolve_caller;
use arteria_core::{
    ArteriaResult, AuthError, Conflict, Credential, DomainEvent, EntityKind, MissionId,
    OrgDirectory, Priority, ReservationError, Segment, SegmentHold, SegmentId, SegmentStatus,
    StateError, StorageError, VehicleId,
};
use arteria_events::EventSink;
use arteria_storage::StateStore;
use std::sync::Arc;
use tracing::debug;

/// Non-error outcomes of a reservation attempt.
///
/// A tie is a *non-grant*: the caller must not treat the segment as reserved
/// for its mission until the recorded conflict is settled and a follow-up
/// call succeeds.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationOutcome {
    /// The segment was free and is now held by the requester.
    Granted,
    /// The requester outranked the previous holder and took the segment.
    /// Carries the evicted hold so the losing mission can be reconciled
    /// asynchronously.
    Preempted { evicted: SegmentHold },
    /// Equal priorities: segment state unchanged, conflict recorded.
    Conflict(Conflict),
}

/// Owns per-segment holder state and the priority-arbitration rule.
#[derive(Clone)]
pub struct SegmentLedger {
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventSink>,
    directory: Arc<OrgDirectory>,
}

impl SegmentLedger {
    pub fn new(
        store: Arc<dyn StateStore>,
        events: Arc<dyn EventSink>,
        directory: Arc<OrgDirectory>,
    ) -> Self {
        Self {
            store,
            events,
            directory,
        }
    }

    /// Attempt to reserve a segment for a mission.
    ///
    /// Loads the segment (materializing a free one if none is recorded) and
    /// applies the arbitration ladder. Only grant and preemption mutate
    /// segment state; a tie leaves the holder untouched and records a
    /// [`Conflict`]; a lower-priority request is denied with state unchanged.
    pub fn reserve(
        &self,
        caller: &Credential,
        segment_id: &SegmentId,
        vehicle_id: &VehicleId,
        mission_id: &MissionId,
        priority: Priority,
    ) -> ArteriaResult<ReservationOutcome> {
        let org = resolve_caller(&self.directory, caller)?;

        let mut segment = self
            .store
            .segment_get(segment_id)?
            .unwrap_or_else(|| Segment::free(segment_id.clone()));

        let holder = match &segment.hold {
            None => {
                // Free: grant.
                let hold =
                    SegmentHold::new(vehicle_id.clone(), mission_id.clone(), org, priority);
                segment.install_hold(hold);
                self.store.segment_put(&segment)?;
                debug!(segment = %segment_id, mission = %mission_id, "segment reserved");
                self.events
                    .publish(DomainEvent::SegmentReserved { segment });
                return Ok(ReservationOutcome::Granted);
            }
            Some(holder) => holder.clone(),
        };

        if priority.outranks(holder.priority) {
            // Preempt: overwrite the hold, keep status reserved.
            let new_hold = SegmentHold::new(vehicle_id.clone(), mission_id.clone(), org, priority);
            segment.install_hold(new_hold.clone());
            self.store.segment_put(&segment)?;
            debug!(
                segment = %segment_id,
                evicted_mission = %holder.mission_id,
                new_mission = %mission_id,
                "segment preempted"
            );
            self.events.publish(DomainEvent::PreemptionTriggered {
                segment_id: segment_id.clone(),
                old_hold: holder.clone(),
                new_hold,
                new_priority: priority,
            });
            return Ok(ReservationOutcome::Preempted { evicted: holder });
        }

        if priority.ties_with(holder.priority) {
            // Tie: do not change segment state; record the contention.
            let conflict = Conflict::between(
                segment_id.clone(),
                holder.mission_id.clone(),
                holder.priority,
                mission_id.clone(),
                priority,
            );
            self.store.conflict_insert(&conflict)?;
            debug!(
                segment = %segment_id,
                incumbent = %holder.mission_id,
                challenger = %mission_id,
                "tie conflict recorded"
            );
            self.events.publish(DomainEvent::ConflictDetected {
                conflict: conflict.clone(),
            });
            return Ok(ReservationOutcome::Conflict(conflict));
        }

        debug!(segment = %segment_id, mission = %mission_id, "reservation denied");
        Err(ReservationError::Denied {
            segment_id: segment_id.clone(),
            holder_priority: holder.priority.level(),
            requested_priority: priority.level(),
        }
        .into())
    }

    /// Release a segment held by the given vehicle.
    ///
    /// Fails without touching state unless the vehicle is the current holder;
    /// releasing an already-free segment fails rather than silently
    /// succeeding.
    pub fn release(
        &self,
        caller: &Credential,
        segment_id: &SegmentId,
        vehicle_id: &VehicleId,
    ) -> ArteriaResult<()> {
        resolve_caller(&self.directory, caller)?;

        let mut segment = self.require_segment(segment_id)?;
        self.require_holder(&segment, vehicle_id)?;

        segment.clear_hold();
        self.store.segment_put(&segment)?;
        debug!(segment = %segment_id, vehicle = %vehicle_id, "segment released");
        self.events
            .publish(DomainEvent::SegmentReleased { segment });
        Ok(())
    }

    /// Mark a reserved segment as physically occupied by its holder.
    ///
    /// A presence marker, not a new reservation: the hold and its reservation
    /// timestamp are untouched.
    pub fn mark_occupied(
        &self,
        caller: &Credential,
        segment_id: &SegmentId,
        vehicle_id: &VehicleId,
    ) -> ArteriaResult<()> {
        resolve_caller(&self.directory, caller)?;

        let mut segment = self.require_segment(segment_id)?;
        self.require_holder(&segment, vehicle_id)?;

        segment.mark_occupied();
        self.store.segment_put(&segment)?;
        self.events
            .publish(DomainEvent::SegmentOccupied { segment });
        Ok(())
    }

    // === Queries ===

    /// Get a recorded segment by id.
    pub fn get(&self, segment_id: &SegmentId) -> ArteriaResult<Segment> {
        self.require_segment(segment_id)
    }

    /// All recorded segments.
    pub fn list_all(&self) -> ArteriaResult<Vec<Segment>> {
        self.store.segment_list_all()
    }

    /// Recorded segments with a given status.
    pub fn list_by_status(&self, status: SegmentStatus) -> ArteriaResult<Vec<Segment>> {
        self.store.segment_list_by_status(status)
    }

    fn require_segment(&self, segment_id: &SegmentId) -> ArteriaResult<Segment> {
        self.store.segment_get(segment_id)?.ok_or_else(|| {
            StorageError::NotFound {
                kind: EntityKind::Segment,
                id: segment_id.to_string(),
            }
            .into()
        })
    }

    fn require_holder(&self, segment: &Segment, vehicle_id: &VehicleId) -> ArteriaResult<()> {
        match &segment.hold {
            None => Err(StateError::SegmentNotReserved {
                segment_id: segment.segment_id.clone(),
            }
            .into()),
            Some(hold) if &hold.vehicle_id != vehicle_id => Err(AuthError::NotHolder {
                segment_id: segment.segment_id.clone(),
                vehicle_id: vehicle_id.clone(),
            }
            .into()),
            Some(_) => Ok(()),
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use arteria_core::ArteriaError;
    use crate::test_fixtures::{medical_caller, police_caller, test_ledger_setup};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The arbitration ladder over every priority pair: the requester
        /// preempts iff it outranks the holder, ties produce exactly one
        /// pending conflict with the holder unchanged, and a lower-priority
        /// request is denied with the holder unchanged.
        #[test]
        fn prop_arbitration_ladder(p1 in 1u8..=5, p2 in 1u8..=5) {
            let (ledger, store, _sink) = test_ledger_setup();
            ledger.reserve(
                &medical_caller(),
                &SegmentId::from("S1"),
                &VehicleId::from("V1"),
                &MissionId::from("M1"),
                Priority::new(p1).unwrap(),
            ).unwrap();

            let result = ledger.reserve(
                &police_caller(),
                &SegmentId::from("S1"),
                &VehicleId::from("V2"),
                &MissionId::from("M2"),
                Priority::new(p2).unwrap(),
            );

            let segment = ledger.get(&SegmentId::from("S1")).unwrap();
            if p2 < p1 {
                prop_assert!(
                    matches!(result, Ok(ReservationOutcome::Preempted { .. })),
                    "expected Preempted"
                );
                prop_assert_eq!(segment.holder(), Some(&VehicleId::from("V2")));
            } else if p2 == p1 {
                prop_assert!(matches!(result, Ok(ReservationOutcome::Conflict(_))));
                prop_assert_eq!(segment.holder(), Some(&VehicleId::from("V1")));
                prop_assert_eq!(store.conflict_list_pending().unwrap().len(), 1);
            } else {
                prop_assert!(
                    matches!(
                        result,
                        Err(ArteriaError::Reservation(ReservationError::Denied { .. }))
                    ),
                    "expected Denied"
                );
                prop_assert_eq!(segment.holder(), Some(&VehicleId::from("V1")));
                prop_assert!(store.conflict_list_pending().unwrap().is_empty());
            }
        }

        /// A failed release leaves the segment exactly as it was.
        #[test]
        fn prop_failed_release_changes_nothing(holder_p in 1u8..=5) {
            let (ledger, _store, _sink) = test_ledger_setup();
            ledger.reserve(
                &medical_caller(),
                &SegmentId::from("S1"),
                &VehicleId::from("V1"),
                &MissionId::from("M1"),
                Priority::new(holder_p).unwrap(),
            ).unwrap();

            let before = ledger.get(&SegmentId::from("S1")).unwrap();
            let result = ledger.release(
                &medical_caller(),
                &SegmentId::from("S1"),
                &VehicleId::from("V2"),
            );
            prop_assert!(result.is_err());
            prop_assert_eq!(ledger.get(&SegmentId::from("S1")).unwrap(), before);
        }
    }
}

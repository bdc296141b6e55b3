//! Mission orchestrator
//!
//! Drives the mission lifecycle (pending → active → completed/aborted) and
//! the multi-segment reserve/rollback/reroute protocol on top of the segment
//! ledger. Multi-segment operations are sequences of independent single-key
//! transactions, never one atomic commit: partial completion is a
//! designed-for case handled by best-effort compensation, with each swallowed
//! failure collected into the returned report.

use crate::ledger::{ReservationOutcome, SegmentLedger};
use crate::registry::VehicleRegistry;
use crate::shared::{require_same_org, resolve_caller};
use arteria_core::{
    ArteriaResult, Conflict, Credential, DomainEvent, EntityKind, Mission, MissionId,
    MissionStatus, OrgDirectory, OrgId, SegmentId, StateError, StorageError, ValidationError,
    VehicleId, VehicleStatus, Warning,
};
use arteria_events::EventSink;
use arteria_storage::StateStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationReport {
    pub mission: Mission,
    /// Tie conflicts raised along the path. Non-grants: the mission does not
    /// hold these segments, activation succeeded regardless.
    pub conflicts: Vec<Conflict>,
    pub warnings: Vec<Warning>,
}

/// Result of a successful completion or abort.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub mission: Mission,
    pub warnings: Vec<Warning>,
}

/// Result of a successful reroute.
#[derive(Debug, Clone, PartialEq)]
pub struct RerouteReport {
    pub mission: Mission,
    /// Tie conflicts raised while reserving the added segments.
    pub conflicts: Vec<Conflict>,
    pub warnings: Vec<Warning>,
}

/// Composes the registry and ledger into the mission state machine.
#[derive(Clone)]
pub struct MissionOrchestrator {
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventSink>,
    directory: Arc<OrgDirectory>,
    ledger: SegmentLedger,
    registry: VehicleRegistry,
}

impl MissionOrchestrator {
    pub fn new(
        store: Arc<dyn StateStore>,
        events: Arc<dyn EventSink>,
        directory: Arc<OrgDirectory>,
    ) -> Self {
        let ledger = SegmentLedger::new(store.clone(), events.clone(), directory.clone());
        let registry = VehicleRegistry::new(store.clone(), events.clone(), directory.clone());
        Self {
            store,
            events,
            directory,
            ledger,
            registry,
        }
    }

    /// The ledger this orchestrator drives; shared so direct segment calls
    /// observe the same state.
    pub fn ledger(&self) -> &SegmentLedger {
        &self.ledger
    }

    /// Create a pending mission with an empty path.
    ///
    /// The vehicle's on-mission check is read-then-write: two concurrent
    /// creations against the same vehicle can both pass it, and the store's
    /// per-key commit detection is what serializes them.
    pub fn create(
        &self,
        caller: &Credential,
        mission_id: MissionId,
        vehicle_id: VehicleId,
        origin_node: &str,
        dest_node: &str,
    ) -> ArteriaResult<Mission> {
        if mission_id.as_str().is_empty() {
            return Err(ValidationError::EmptyId {
                kind: EntityKind::Mission,
            }
            .into());
        }
        if vehicle_id.is_empty() {
            return Err(ValidationError::EmptyId {
                kind: EntityKind::Vehicle,
            }
            .into());
        }
        if origin_node.is_empty() || dest_node.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "origin/destination nodes".to_string(),
            }
            .into());
        }

        if self.store.mission_get(&mission_id)?.is_some() {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Mission,
                id: mission_id.to_string(),
            }
            .into());
        }

        let caller_org = resolve_caller(&self.directory, caller)?;
        let vehicle = self.registry.get(&vehicle_id)?;
        require_same_org(&caller_org, &vehicle.org, "create mission")?;
        if vehicle.status == VehicleStatus::OnMission {
            return Err(StateError::VehicleOnMission { vehicle_id }.into());
        }

        let mission = Mission::new(
            mission_id,
            vehicle_id,
            vehicle.org.clone(),
            vehicle.priority,
            origin_node,
            dest_node,
            caller.clone(),
        );
        self.store.mission_insert(&mission)?;
        self.events.publish(DomainEvent::MissionCreated {
            mission: mission.clone(),
        });
        Ok(mission)
    }

    /// Activate a pending mission by reserving every segment in `path`, in
    /// order.
    ///
    /// On the first denied reservation, every segment this call successfully
    /// reserved is released best-effort (failures logged, not retried) and
    /// the denial is returned; the mission stays pending. A partially
    /// reserved path must never silently remain held.
    ///
    /// Tie conflicts along the way are non-grants: they are aggregated into
    /// the report for visibility but neither hold the segment for this
    /// mission nor abort the activation.
    pub fn activate(
        &self,
        caller: &Credential,
        mission_id: &MissionId,
        path: Vec<SegmentId>,
    ) -> ArteriaResult<ActivationReport> {
        let mut mission = self.require_mission(mission_id)?;
        if mission.status != MissionStatus::Pending {
            return Err(StateError::MissionNotPending {
                mission_id: mission_id.clone(),
                current: mission.status.to_string(),
            }
            .into());
        }
        let caller_org = resolve_caller(&self.directory, caller)?;
        require_same_org(&caller_org, &mission.org, "activate mission")?;
        if path.is_empty() {
            return Err(ValidationError::EmptyPath {
                mission_id: mission_id.clone(),
            }
            .into());
        }

        let mut reserved: Vec<SegmentId> = Vec::new();
        let mut conflicts: Vec<Conflict> = Vec::new();
        for segment_id in &path {
            match self.ledger.reserve(
                caller,
                segment_id,
                &mission.vehicle_id,
                mission_id,
                mission.priority,
            ) {
                Ok(ReservationOutcome::Granted) | Ok(ReservationOutcome::Preempted { .. }) => {
                    reserved.push(segment_id.clone());
                }
                Ok(ReservationOutcome::Conflict(conflict)) => {
                    conflicts.push(conflict);
                }
                Err(err) => {
                    self.rollback_reserved(caller, &reserved, &mission.vehicle_id);
                    return Err(err);
                }
            }
        }

        let mut warnings = Vec::new();
        mission.activate_with_path(path);
        self.store.mission_put(&mission)?;
        self.sync_vehicle_status(caller, &mission.vehicle_id, VehicleStatus::OnMission, &mut warnings);
        self.events.publish(DomainEvent::MissionActivated {
            mission: mission.clone(),
            conflicts: conflicts.clone(),
        });
        Ok(ActivationReport {
            mission,
            conflicts,
            warnings,
        })
    }

    /// Complete an active mission, releasing every segment in its path
    /// best-effort.
    ///
    /// A per-segment release failure (for example, the segment was already
    /// taken by direct preemption) is recorded as a warning, never escalated.
    pub fn complete(
        &self,
        caller: &Credential,
        mission_id: &MissionId,
    ) -> ArteriaResult<CompletionReport> {
        let mut mission = self.require_mission(mission_id)?;
        if mission.status != MissionStatus::Active {
            return Err(StateError::MissionNotActive {
                mission_id: mission_id.clone(),
                current: mission.status.to_string(),
            }
            .into());
        }
        let caller_org = resolve_caller(&self.directory, caller)?;
        require_same_org(&caller_org, &mission.org, "complete mission")?;

        let mut warnings = Vec::new();
        self.release_path(caller, &mission.path.clone(), &mission.vehicle_id, &mut warnings);

        mission.complete();
        self.store.mission_put(&mission)?;
        self.sync_vehicle_status(caller, &mission.vehicle_id, VehicleStatus::Active, &mut warnings);
        self.events.publish(DomainEvent::MissionCompleted {
            mission: mission.clone(),
        });
        Ok(CompletionReport { mission, warnings })
    }

    /// Abort a pending or active mission, recording the reason.
    ///
    /// An active mission gets the same best-effort release-and-restore as
    /// completion; a pending mission holds nothing and transitions directly.
    pub fn abort(
        &self,
        caller: &Credential,
        mission_id: &MissionId,
        reason: &str,
    ) -> ArteriaResult<CompletionReport> {
        let mut mission = self.require_mission(mission_id)?;
        if !mission.status.can_abort() {
            return Err(StateError::MissionNotAbortable {
                mission_id: mission_id.clone(),
                current: mission.status.to_string(),
            }
            .into());
        }
        let caller_org = resolve_caller(&self.directory, caller)?;
        require_same_org(&caller_org, &mission.org, "abort mission")?;

        let mut warnings = Vec::new();
        if mission.status == MissionStatus::Active {
            self.release_path(caller, &mission.path.clone(), &mission.vehicle_id, &mut warnings);
            self.sync_vehicle_status(caller, &mission.vehicle_id, VehicleStatus::Active, &mut warnings);
        }

        mission.abort(reason);
        self.store.mission_put(&mission)?;
        self.events.publish(DomainEvent::MissionAborted {
            mission: mission.clone(),
            reason: reason.to_string(),
        });
        Ok(CompletionReport { mission, warnings })
    }

    /// Replace an active mission's path.
    ///
    /// Releases the segments dropped by the new path first (best-effort),
    /// then reserves the added ones. A denial mid-reserve fails the call
    /// immediately and nothing already released or reserved by this call is
    /// rolled back - an intentional asymmetry versus activation's rollback,
    /// so a failed reroute can leave the mission holding a mixture of old and
    /// new segments.
    pub fn reroute(
        &self,
        caller: &Credential,
        mission_id: &MissionId,
        new_path: Vec<SegmentId>,
    ) -> ArteriaResult<RerouteReport> {
        let mut mission = self.require_mission(mission_id)?;
        if mission.status != MissionStatus::Active {
            return Err(StateError::MissionNotActive {
                mission_id: mission_id.clone(),
                current: mission.status.to_string(),
            }
            .into());
        }
        let caller_org = resolve_caller(&self.directory, caller)?;
        require_same_org(&caller_org, &mission.org, "reroute mission")?;

        let old_set: HashSet<&SegmentId> = mission.path.iter().collect();
        let new_set: HashSet<&SegmentId> = new_path.iter().collect();
        let to_release: Vec<SegmentId> = mission
            .path
            .iter()
            .filter(|s| !new_set.contains(*s))
            .cloned()
            .collect();
        let to_reserve: Vec<SegmentId> = new_path
            .iter()
            .filter(|s| !old_set.contains(*s))
            .cloned()
            .collect();

        let mut warnings = Vec::new();
        self.release_path(caller, &to_release, &mission.vehicle_id, &mut warnings);

        let mut conflicts = Vec::new();
        for segment_id in &to_reserve {
            match self.ledger.reserve(
                caller,
                segment_id,
                &mission.vehicle_id,
                mission_id,
                mission.priority,
            )? {
                ReservationOutcome::Granted | ReservationOutcome::Preempted { .. } => {}
                ReservationOutcome::Conflict(conflict) => conflicts.push(conflict),
            }
        }

        mission.path = new_path.clone();
        self.store.mission_put(&mission)?;
        self.events.publish(DomainEvent::MissionRerouted {
            mission_id: mission_id.clone(),
            new_path,
        });
        Ok(RerouteReport {
            mission,
            conflicts,
            warnings,
        })
    }

    // === Queries ===

    /// Get a mission by id.
    pub fn get(&self, mission_id: &MissionId) -> ArteriaResult<Mission> {
        self.require_mission(mission_id)
    }

    /// All missions.
    pub fn list_all(&self) -> ArteriaResult<Vec<Mission>> {
        self.store.mission_list_all()
    }

    /// Missions currently active.
    pub fn list_active(&self) -> ArteriaResult<Vec<Mission>> {
        self.store.mission_list_by_status(MissionStatus::Active)
    }

    /// Missions with a given lifecycle status.
    pub fn list_by_status(&self, status: MissionStatus) -> ArteriaResult<Vec<Mission>> {
        self.store.mission_list_by_status(status)
    }

    /// Missions belonging to an organization.
    pub fn list_by_org(&self, org: &OrgId) -> ArteriaResult<Vec<Mission>> {
        self.store.mission_list_by_org(org)
    }

    /// The active mission assigned to a vehicle, if any.
    pub fn vehicle_active_mission(
        &self,
        vehicle_id: &VehicleId,
    ) -> ArteriaResult<Option<Mission>> {
        self.store.mission_find_active_by_vehicle(vehicle_id)
    }

    // === Compensation helpers ===

    fn require_mission(&self, mission_id: &MissionId) -> ArteriaResult<Mission> {
        self.store.mission_get(mission_id)?.ok_or_else(|| {
            StorageError::NotFound {
                kind: EntityKind::Mission,
                id: mission_id.to_string(),
            }
            .into()
        })
    }

    /// Release segments reserved by a failed activation. Failures are logged
    /// only: the enclosing call already failed and the denial must reach the
    /// caller unchanged.
    fn rollback_reserved(
        &self,
        caller: &Credential,
        reserved: &[SegmentId],
        vehicle_id: &VehicleId,
    ) {
        for segment_id in reserved {
            if let Err(err) = self.ledger.release(caller, segment_id, vehicle_id) {
                warn!(
                    segment = %segment_id,
                    vehicle = %vehicle_id,
                    error = %err,
                    "rollback release failed"
                );
            }
        }
    }

    /// Best-effort release of a mission's segments, collecting failures as
    /// warnings.
    fn release_path(
        &self,
        caller: &Credential,
        segments: &[SegmentId],
        vehicle_id: &VehicleId,
        warnings: &mut Vec<Warning>,
    ) {
        for segment_id in segments {
            if let Err(err) = self.ledger.release(caller, segment_id, vehicle_id) {
                warn!(segment = %segment_id, error = %err, "segment release failed");
                warnings.push(Warning::new(format!("release segment {segment_id}"), err));
            }
        }
    }

    /// Best-effort vehicle status sync through the registry, recorded as a
    /// warning on failure; the mission transition is never rolled back
    /// because of it.
    fn sync_vehicle_status(
        &self,
        caller: &Credential,
        vehicle_id: &VehicleId,
        status: VehicleStatus,
        warnings: &mut Vec<Warning>,
    ) {
        if let Err(err) = self.registry.update_status(caller, vehicle_id, status) {
            warn!(vehicle = %vehicle_id, error = %err, "vehicle status sync failed");
            warnings.push(Warning::new(
                format!("set vehicle {vehicle_id} status to {status}"),
                err,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arteria_core::{ArteriaError, AuthError, Priority};
    use crate::test_fixtures::{medical_caller, police_caller, test_harness};

    #[test]
    fn test_create_requires_existing_vehicle() {
        let h = test_harness();
        let err = h
            .orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M1"),
                VehicleId::from("V404"),
                "N1",
                "N5",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ArteriaError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_create_copies_vehicle_priority() {
        let h = test_harness();
        h.register_vehicle(&medical_caller(), "V1", "medical", 3);

        let mission = h
            .orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M1"),
                VehicleId::from("V1"),
                "N1",
                "N5",
            )
            .unwrap();
        assert_eq!(mission.status, MissionStatus::Pending);
        assert_eq!(mission.priority, Priority::new(3).unwrap());
        assert!(mission.path.is_empty());
        assert_eq!(h.sink.records_of_type("MISSION_CREATED").len(), 1);
    }

    #[test]
    fn test_create_rejects_foreign_vehicle() {
        let h = test_harness();
        h.register_vehicle(&medical_caller(), "V1", "medical", 2);

        let err = h
            .orchestrator
            .create(
                &police_caller(),
                MissionId::from("M1"),
                VehicleId::from("V1"),
                "N1",
                "N5",
            )
            .unwrap_err();
        assert!(matches!(err, ArteriaError::Auth(AuthError::OrgMismatch { .. })));
    }

    #[test]
    fn test_create_rejects_vehicle_on_mission() {
        let h = test_harness();
        h.register_vehicle(&medical_caller(), "V1", "medical", 2);
        h.orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M1"),
                VehicleId::from("V1"),
                "N1",
                "N5",
            )
            .unwrap();
        h.orchestrator
            .activate(
                &medical_caller(),
                &MissionId::from("M1"),
                vec![SegmentId::from("S1")],
            )
            .unwrap();

        let err = h
            .orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M2"),
                VehicleId::from("V1"),
                "N2",
                "N6",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ArteriaError::State(StateError::VehicleOnMission { .. })
        ));
    }

    #[test]
    fn test_activate_requires_pending_and_path() {
        let h = test_harness();
        h.register_vehicle(&medical_caller(), "V1", "medical", 2);
        h.orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M1"),
                VehicleId::from("V1"),
                "N1",
                "N5",
            )
            .unwrap();

        let empty = h
            .orchestrator
            .activate(&medical_caller(), &MissionId::from("M1"), vec![])
            .unwrap_err();
        assert!(matches!(
            empty,
            ArteriaError::Validation(ValidationError::EmptyPath { .. })
        ));

        h.orchestrator
            .activate(
                &medical_caller(),
                &MissionId::from("M1"),
                vec![SegmentId::from("S1")],
            )
            .unwrap();
        let again = h
            .orchestrator
            .activate(
                &medical_caller(),
                &MissionId::from("M1"),
                vec![SegmentId::from("S2")],
            )
            .unwrap_err();
        assert!(matches!(
            again,
            ArteriaError::State(StateError::MissionNotPending { .. })
        ));
    }

    #[test]
    fn test_activate_sets_vehicle_on_mission() {
        let h = test_harness();
        h.register_vehicle(&medical_caller(), "V1", "medical", 2);
        h.orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M1"),
                VehicleId::from("V1"),
                "N1",
                "N5",
            )
            .unwrap();
        let report = h
            .orchestrator
            .activate(
                &medical_caller(),
                &MissionId::from("M1"),
                vec![SegmentId::from("S1"), SegmentId::from("S2")],
            )
            .unwrap();
        assert!(report.conflicts.is_empty());
        assert!(report.warnings.is_empty());
        assert!(report.mission.activated_at.is_some());

        let vehicle = h.store.vehicle_get(&VehicleId::from("V1")).unwrap().unwrap();
        assert_eq!(vehicle.status, VehicleStatus::OnMission);
        assert_eq!(
            h.orchestrator
                .vehicle_active_mission(&VehicleId::from("V1"))
                .unwrap()
                .unwrap()
                .mission_id,
            MissionId::from("M1")
        );
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let h = test_harness();
        h.register_vehicle(&medical_caller(), "V1", "medical", 2);
        h.orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M1"),
                VehicleId::from("V1"),
                "N1",
                "N5",
            )
            .unwrap();
        h.orchestrator
            .activate(
                &medical_caller(),
                &MissionId::from("M1"),
                vec![SegmentId::from("S1")],
            )
            .unwrap();
        h.orchestrator
            .complete(&medical_caller(), &MissionId::from("M1"))
            .unwrap();

        assert!(matches!(
            h.orchestrator
                .complete(&medical_caller(), &MissionId::from("M1"))
                .unwrap_err(),
            ArteriaError::State(StateError::MissionNotActive { .. })
        ));
        assert!(matches!(
            h.orchestrator
                .abort(&medical_caller(), &MissionId::from("M1"), "too late")
                .unwrap_err(),
            ArteriaError::State(StateError::MissionNotAbortable { .. })
        ));
    }

    #[test]
    fn test_abort_pending_mission_releases_nothing() {
        let h = test_harness();
        h.register_vehicle(&medical_caller(), "V1", "medical", 2);
        h.orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M1"),
                VehicleId::from("V1"),
                "N1",
                "N5",
            )
            .unwrap();

        let report = h
            .orchestrator
            .abort(&medical_caller(), &MissionId::from("M1"), "dispatcher recall")
            .unwrap();
        assert_eq!(report.mission.status, MissionStatus::Aborted);
        assert_eq!(
            report.mission.abort_reason.as_deref(),
            Some("dispatcher recall")
        );
        assert!(report.warnings.is_empty());
        assert!(h.sink.records_of_type("SEGMENT_RELEASED").is_empty());
    }

    #[test]
    fn test_queries_filter_by_status_and_org() {
        let h = test_harness();
        h.register_vehicle(&medical_caller(), "V1", "medical", 2);
        h.register_vehicle(&police_caller(), "P1", "police", 2);
        h.orchestrator
            .create(
                &medical_caller(),
                MissionId::from("M1"),
                VehicleId::from("V1"),
                "N1",
                "N5",
            )
            .unwrap();
        h.orchestrator
            .create(
                &police_caller(),
                MissionId::from("M2"),
                VehicleId::from("P1"),
                "N2",
                "N8",
            )
            .unwrap();
        h.orchestrator
            .activate(
                &police_caller(),
                &MissionId::from("M2"),
                vec![SegmentId::from("S9")],
            )
            .unwrap();

        assert_eq!(h.orchestrator.list_all().unwrap().len(), 2);
        assert_eq!(h.orchestrator.list_active().unwrap().len(), 1);
        assert_eq!(
            h.orchestrator
                .list_by_status(MissionStatus::Pending)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            h.orchestrator
                .list_by_org(&arteria_core::OrgId::from("police"))
                .unwrap()
                .len(),
            1
        );
    }
}

//! Conflict arbiter
//!
//! Owns the conflict records created by tie-priority contention. Resolution
//! is a record of intent only: it never mutates segment state. Realizing a
//! resolution (releasing the loser's hold, triggering a reroute) takes
//! explicit follow-up calls into the ledger or orchestrator.

use crate::shared::resolve_caller;
use arteria_core::{
    ArteriaResult, Conflict, ConflictId, ConflictResolution, ConflictStatus, Credential,
    DomainEvent, EntityKind, OrgDirectory, StateError, StorageError,
};
use arteria_events::EventSink;
use arteria_storage::StateStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct ConflictArbiter {
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventSink>,
    directory: Arc<OrgDirectory>,
}

impl ConflictArbiter {
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

    /// Record a resolution for a pending conflict.
    pub fn resolve(
        &self,
        caller: &Credential,
        conflict_id: &ConflictId,
        resolution: ConflictResolution,
    ) -> ArteriaResult<Conflict> {
        resolve_caller(&self.directory, caller)?;

        let mut conflict = self.store.conflict_get(conflict_id)?.ok_or_else(|| {
            StorageError::NotFound {
                kind: EntityKind::Conflict,
                id: conflict_id.to_string(),
            }
        })?;

        if conflict.status != ConflictStatus::Pending {
            return Err(StateError::ConflictAlreadyResolved {
                conflict_id: conflict_id.clone(),
            }
            .into());
        }

        conflict.resolve(resolution, caller.clone());
        self.store.conflict_put(&conflict)?;
        self.events.publish(DomainEvent::ConflictResolved {
            conflict: conflict.clone(),
        });
        Ok(conflict)
    }

    /// Conflicts still awaiting resolution.
    pub fn list_pending(&self) -> ArteriaResult<Vec<Conflict>> {
        self.store.conflict_list_pending()
    }

    /// Advisory first-come-first-served policy: the side with the better
    /// priority wins, and on a tie the incumbent (mission 1, the holder when
    /// the conflict was recorded) keeps the segment.
    ///
    /// Conflicts created by the ledger are always ties, so the non-tie arms
    /// only matter for records whose priorities were edited after creation.
    pub fn suggest_resolution(conflict: &Conflict) -> ConflictResolution {
        if conflict.priority1.outranks(conflict.priority2) {
            ConflictResolution::Mission1Wins
        } else if conflict.priority2.outranks(conflict.priority1) {
            ConflictResolution::Mission2Wins
        } else {
            ConflictResolution::Mission1Wins
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arteria_core::{ArteriaError, MissionId, Priority, SegmentId};
    use crate::test_fixtures::{medical_caller, test_arbiter_setup};

    fn make_tie_conflict() -> Conflict {
        Conflict::between(
            SegmentId::from("S5"),
            MissionId::from("M1"),
            Priority::new(2).unwrap(),
            MissionId::from("M2"),
            Priority::new(2).unwrap(),
        )
    }

    #[test]
    fn test_resolve_records_intent_only() {
        let (arbiter, store, sink) = test_arbiter_setup();
        let conflict = make_tie_conflict();
        store.conflict_insert(&conflict).unwrap();

        let resolved = arbiter
            .resolve(
                &medical_caller(),
                &conflict.conflict_id,
                ConflictResolution::Mission2Wins,
            )
            .unwrap();
        assert_eq!(resolved.status, ConflictStatus::Resolved);
        assert_eq!(resolved.resolution, Some(ConflictResolution::Mission2Wins));
        assert_eq!(resolved.resolved_by, Some(medical_caller()));
        assert!(resolved.resolved_at.is_some());
        assert_eq!(sink.records_of_type("CONFLICT_RESOLVED").len(), 1);

        // Advisory: no segment record was created or touched.
        assert!(store.segment_get(&SegmentId::from("S5")).unwrap().is_none());
    }

    #[test]
    fn test_resolve_requires_pending() {
        let (arbiter, store, _sink) = test_arbiter_setup();
        let conflict = make_tie_conflict();
        store.conflict_insert(&conflict).unwrap();

        arbiter
            .resolve(
                &medical_caller(),
                &conflict.conflict_id,
                ConflictResolution::BothReroute,
            )
            .unwrap();
        let err = arbiter
            .resolve(
                &medical_caller(),
                &conflict.conflict_id,
                ConflictResolution::Mission1Wins,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ArteriaError::State(StateError::ConflictAlreadyResolved { .. })
        ));
    }

    #[test]
    fn test_resolve_missing_conflict_not_found() {
        let (arbiter, _store, _sink) = test_arbiter_setup();
        let err = arbiter
            .resolve(
                &medical_caller(),
                &ConflictId::from("CONFLICT-S1-nope"),
                ConflictResolution::Mission1Wins,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ArteriaError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_pending_shrinks_after_resolution() {
        let (arbiter, store, _sink) = test_arbiter_setup();
        let a = make_tie_conflict();
        let b = make_tie_conflict();
        store.conflict_insert(&a).unwrap();
        store.conflict_insert(&b).unwrap();
        assert_eq!(arbiter.list_pending().unwrap().len(), 2);

        arbiter
            .resolve(&medical_caller(), &a.conflict_id, ConflictResolution::Mission1Wins)
            .unwrap();
        let pending = arbiter.list_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].conflict_id, b.conflict_id);
    }

    #[test]
    fn test_suggest_resolution_fcfs_on_tie() {
        let tie = make_tie_conflict();
        assert_eq!(
            ConflictArbiter::suggest_resolution(&tie),
            ConflictResolution::Mission1Wins
        );

        let mut challenger_wins = make_tie_conflict();
        challenger_wins.priority2 = Priority::new(1).unwrap();
        assert_eq!(
            ConflictArbiter::suggest_resolution(&challenger_wins),
            ConflictResolution::Mission2Wins
        );
    }
}

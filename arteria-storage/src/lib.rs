//! ARTERIA Storage - State Store Trait and In-Memory Implementation
//!
//! Defines the storage abstraction for ARTERIA entities. Every entity is
//! independently keyed and independently transactional: the store serializes
//! commits per key and knows nothing about cross-entity consistency, which is
//! maintained procedurally by `arteria-dispatch`.
//!
//! Writes follow the read-decide-write shape of the reservation protocol:
//! services load an entity, apply a transition, and put the whole entity
//! back. Implementations backed by an MVCC store surface
//! [`StorageError::VersionConflict`] to a writer that read a stale version;
//! retry policy belongs to the integration layer, never to this crate or the
//! services above it.

use arteria_core::{
    ArteriaResult, Conflict, ConflictId, ConflictStatus, EntityKind, Mission, MissionId,
    MissionStatus, OrgId, Segment, SegmentId, SegmentStatus, StorageError, Vehicle, VehicleId,
};
use std::collections::HashMap;
use std::sync::RwLock;

// ============================================================================
// STATE STORE TRAIT
// ============================================================================

/// Storage trait for ARTERIA entities.
///
/// `*_insert` rejects duplicates; `*_put` overwrites an existing record
/// (segments upsert, because segments materialize lazily and the first write
/// may be the first record). List operations correspond to the store's
/// indexed fields: entity kind, status, organization, vehicle id.
pub trait StateStore: Send + Sync {
    // === Vehicle Operations ===

    /// Insert a newly registered vehicle.
    fn vehicle_insert(&self, v: &Vehicle) -> ArteriaResult<()>;

    /// Get a vehicle by id.
    fn vehicle_get(&self, id: &VehicleId) -> ArteriaResult<Option<Vehicle>>;

    /// Overwrite an existing vehicle.
    fn vehicle_put(&self, v: &Vehicle) -> ArteriaResult<()>;

    /// Whether a vehicle record exists. Absence is not an error.
    fn vehicle_exists(&self, id: &VehicleId) -> ArteriaResult<bool>;

    /// List all vehicles.
    fn vehicle_list_all(&self) -> ArteriaResult<Vec<Vehicle>>;

    /// List vehicles belonging to an organization.
    fn vehicle_list_by_org(&self, org: &OrgId) -> ArteriaResult<Vec<Vehicle>>;

    // === Segment Operations ===

    /// Get a segment by id. `None` means no record: the segment is free but
    /// has never been written.
    fn segment_get(&self, id: &SegmentId) -> ArteriaResult<Option<Segment>>;

    /// Upsert a segment record.
    fn segment_put(&self, s: &Segment) -> ArteriaResult<()>;

    /// List all recorded segments.
    fn segment_list_all(&self) -> ArteriaResult<Vec<Segment>>;

    /// List recorded segments with a given status.
    fn segment_list_by_status(&self, status: SegmentStatus) -> ArteriaResult<Vec<Segment>>;

    // === Mission Operations ===

    /// Insert a newly created mission.
    fn mission_insert(&self, m: &Mission) -> ArteriaResult<()>;

    /// Get a mission by id.
    fn mission_get(&self, id: &MissionId) -> ArteriaResult<Option<Mission>>;

    /// Overwrite an existing mission.
    fn mission_put(&self, m: &Mission) -> ArteriaResult<()>;

    /// List all missions.
    fn mission_list_all(&self) -> ArteriaResult<Vec<Mission>>;

    /// List missions with a given lifecycle status.
    fn mission_list_by_status(&self, status: MissionStatus) -> ArteriaResult<Vec<Mission>>;

    /// List missions belonging to an organization.
    fn mission_list_by_org(&self, org: &OrgId) -> ArteriaResult<Vec<Mission>>;

    /// The active mission assigned to a vehicle, if any.
    fn mission_find_active_by_vehicle(&self, vehicle_id: &VehicleId)
        -> ArteriaResult<Option<Mission>>;

    // === Conflict Operations ===

    /// Insert a newly detected conflict.
    fn conflict_insert(&self, c: &Conflict) -> ArteriaResult<()>;

    /// Get a conflict by id.
    fn conflict_get(&self, id: &ConflictId) -> ArteriaResult<Option<Conflict>>;

    /// Overwrite an existing conflict.
    fn conflict_put(&self, c: &Conflict) -> ArteriaResult<()>;

    /// List conflicts still awaiting resolution.
    fn conflict_list_pending(&self) -> ArteriaResult<Vec<Conflict>>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory `StateStore` used by tests and single-process deployments.
///
/// Each entity kind lives in its own `RwLock`-guarded map, so every operation
/// is one serializable unit of work against the touched key; two concurrent
/// writers to the same segment serialize in whatever order they take the
/// write guard, which is exactly the commit-order guarantee the reservation
/// protocol assumes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    vehicles: RwLock<HashMap<VehicleId, Vehicle>>,
    segments: RwLock<HashMap<SegmentId, Segment>>,
    missions: RwLock<HashMap<MissionId, Mission>>,
    conflicts: RwLock<HashMap<ConflictId, Conflict>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded segments (free segments never referenced are not
    /// records and are not counted).
    pub fn segment_count(&self) -> usize {
        self.segments.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl StateStore for MemoryStore {
    // === Vehicle Operations ===

    fn vehicle_insert(&self, v: &Vehicle) -> ArteriaResult<()> {
        let mut vehicles = self.vehicles.write().map_err(|_| StorageError::LockPoisoned)?;
        if vehicles.contains_key(&v.vehicle_id) {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Vehicle,
                id: v.vehicle_id.to_string(),
            }
            .into());
        }
        vehicles.insert(v.vehicle_id.clone(), v.clone());
        Ok(())
    }

    fn vehicle_get(&self, id: &VehicleId) -> ArteriaResult<Option<Vehicle>> {
        let vehicles = self.vehicles.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(vehicles.get(id).cloned())
    }

    fn vehicle_put(&self, v: &Vehicle) -> ArteriaResult<()> {
        let mut vehicles = self.vehicles.write().map_err(|_| StorageError::LockPoisoned)?;
        if !vehicles.contains_key(&v.vehicle_id) {
            return Err(StorageError::NotFound {
                kind: EntityKind::Vehicle,
                id: v.vehicle_id.to_string(),
            }
            .into());
        }
        vehicles.insert(v.vehicle_id.clone(), v.clone());
        Ok(())
    }

    fn vehicle_exists(&self, id: &VehicleId) -> ArteriaResult<bool> {
        let vehicles = self.vehicles.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(vehicles.contains_key(id))
    }

    fn vehicle_list_all(&self) -> ArteriaResult<Vec<Vehicle>> {
        let vehicles = self.vehicles.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(vehicles.values().cloned().collect())
    }

    fn vehicle_list_by_org(&self, org: &OrgId) -> ArteriaResult<Vec<Vehicle>> {
        let vehicles = self.vehicles.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(vehicles.values().filter(|v| &v.org == org).cloned().collect())
    }

    // === Segment Operations ===

    fn segment_get(&self, id: &SegmentId) -> ArteriaResult<Option<Segment>> {
        let segments = self.segments.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(segments.get(id).cloned())
    }

    fn segment_put(&self, s: &Segment) -> ArteriaResult<()> {
        let mut segments = self.segments.write().map_err(|_| StorageError::LockPoisoned)?;
        segments.insert(s.segment_id.clone(), s.clone());
        Ok(())
    }

    fn segment_list_all(&self) -> ArteriaResult<Vec<Segment>> {
        let segments = self.segments.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(segments.values().cloned().collect())
    }

    fn segment_list_by_status(&self, status: SegmentStatus) -> ArteriaResult<Vec<Segment>> {
        let segments = self.segments.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(segments
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    // === Mission Operations ===

    fn mission_insert(&self, m: &Mission) -> ArteriaResult<()> {
        let mut missions = self.missions.write().map_err(|_| StorageError::LockPoisoned)?;
        if missions.contains_key(&m.mission_id) {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Mission,
                id: m.mission_id.to_string(),
            }
            .into());
        }
        missions.insert(m.mission_id.clone(), m.clone());
        Ok(())
    }

    fn mission_get(&self, id: &MissionId) -> ArteriaResult<Option<Mission>> {
        let missions = self.missions.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(missions.get(id).cloned())
    }

    fn mission_put(&self, m: &Mission) -> ArteriaResult<()> {
        let mut missions = self.missions.write().map_err(|_| StorageError::LockPoisoned)?;
        if !missions.contains_key(&m.mission_id) {
            return Err(StorageError::NotFound {
                kind: EntityKind::Mission,
                id: m.mission_id.to_string(),
            }
            .into());
        }
        missions.insert(m.mission_id.clone(), m.clone());
        Ok(())
    }

    fn mission_list_all(&self) -> ArteriaResult<Vec<Mission>> {
        let missions = self.missions.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(missions.values().cloned().collect())
    }

    fn mission_list_by_status(&self, status: MissionStatus) -> ArteriaResult<Vec<Mission>> {
        let missions = self.missions.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(missions
            .values()
            .filter(|m| m.status == status)
            .cloned()
            .collect())
    }

    fn mission_list_by_org(&self, org: &OrgId) -> ArteriaResult<Vec<Mission>> {
        let missions = self.missions.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(missions.values().filter(|m| &m.org == org).cloned().collect())
    }

    fn mission_find_active_by_vehicle(
        &self,
        vehicle_id: &VehicleId,
    ) -> ArteriaResult<Option<Mission>> {
        let missions = self.missions.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(missions
            .values()
            .find(|m| &m.vehicle_id == vehicle_id && m.status == MissionStatus::Active)
            .cloned())
    }

    // === Conflict Operations ===

    fn conflict_insert(&self, c: &Conflict) -> ArteriaResult<()> {
        let mut conflicts = self.conflicts.write().map_err(|_| StorageError::LockPoisoned)?;
        if conflicts.contains_key(&c.conflict_id) {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Conflict,
                id: c.conflict_id.to_string(),
            }
            .into());
        }
        conflicts.insert(c.conflict_id.clone(), c.clone());
        Ok(())
    }

    fn conflict_get(&self, id: &ConflictId) -> ArteriaResult<Option<Conflict>> {
        let conflicts = self.conflicts.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(conflicts.get(id).cloned())
    }

    fn conflict_put(&self, c: &Conflict) -> ArteriaResult<()> {
        let mut conflicts = self.conflicts.write().map_err(|_| StorageError::LockPoisoned)?;
        if !conflicts.contains_key(&c.conflict_id) {
            return Err(StorageError::NotFound {
                kind: EntityKind::Conflict,
                id: c.conflict_id.to_string(),
            }
            .into());
        }
        conflicts.insert(c.conflict_id.clone(), c.clone());
        Ok(())
    }

    fn conflict_list_pending(&self) -> ArteriaResult<Vec<Conflict>> {
        let conflicts = self.conflicts.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(conflicts
            .values()
            .filter(|c| c.status == ConflictStatus::Pending)
            .cloned()
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

//! ARTERIA Test Utilities
//!
//! Centralized test infrastructure for the workspace: wired-up service
//! bundles against an in-memory store and a recording sink, plus the stock
//! caller credentials. Service crates keep entity-level fixtures local; this
//! crate owns the cross-crate wiring so scenario tests read the same way
//! everywhere.

use arteria_core::{Credential, OrgDirectory, OrgId, Vehicle, VehicleId};
use arteria_dispatch::{ConflictArbiter, MissionOrchestrator, SegmentLedger, VehicleRegistry};
use arteria_events::RecordingSink;
use arteria_storage::MemoryStore;
use std::sync::Arc;

/// Credential for the stock medical organization.
pub fn medical_caller() -> Credential {
    Credential::from("MedicalMSP")
}

/// Credential for the stock police organization.
pub fn police_caller() -> Credential {
    Credential::from("PoliceMSP")
}

/// The stock two-organization directory, shared.
pub fn standard_directory() -> Arc<OrgDirectory> {
    Arc::new(OrgDirectory::standard().clone())
}

/// Fresh empty store.
pub fn test_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Fresh recording sink.
pub fn test_sink() -> Arc<RecordingSink> {
    Arc::new(RecordingSink::new())
}

/// A ledger wired to a fresh store and sink.
pub fn test_ledger_setup() -> (SegmentLedger, Arc<MemoryStore>, Arc<RecordingSink>) {
    let store = test_store();
    let sink = test_sink();
    let ledger = SegmentLedger::new(store.clone(), sink.clone(), standard_directory());
    (ledger, store, sink)
}

/// A registry wired to a fresh store and sink.
pub fn test_registry_setup() -> (VehicleRegistry, Arc<MemoryStore>, Arc<RecordingSink>) {
    let store = test_store();
    let sink = test_sink();
    let registry = VehicleRegistry::new(store.clone(), sink.clone(), standard_directory());
    (registry, store, sink)
}

/// An arbiter wired to a fresh store and sink.
pub fn test_arbiter_setup() -> (ConflictArbiter, Arc<MemoryStore>, Arc<RecordingSink>) {
    let store = test_store();
    let sink = test_sink();
    let arbiter = ConflictArbiter::new(store.clone(), sink.clone(), standard_directory());
    (arbiter, store, sink)
}

/// Every service wired against one shared store and sink.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
    pub registry: VehicleRegistry,
    pub orchestrator: MissionOrchestrator,
    pub arbiter: ConflictArbiter,
}

impl TestHarness {
    /// Register a vehicle, panicking on failure; scenario tests use this for
    /// setup they are not themselves exercising.
    pub fn register_vehicle(
        &self,
        caller: &Credential,
        id: &str,
        org: &str,
        priority: u8,
    ) -> Vehicle {
        self.registry
            .register(caller, VehicleId::from(id), OrgId::from(org), "ambulance", priority)
            .expect("fixture vehicle registration failed")
    }
}

/// Build a full harness on a fresh store and sink.
pub fn test_harness() -> TestHarness {
    let store = test_store();
    let sink = test_sink();
    let directory = standard_directory();
    TestHarness {
        registry: VehicleRegistry::new(store.clone(), sink.clone(), directory.clone()),
        orchestrator: MissionOrchestrator::new(store.clone(), sink.clone(), directory.clone()),
        arbiter: ConflictArbiter::new(store.clone(), sink.clone(), directory),
        store,
        sink,
    }
}

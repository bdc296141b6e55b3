//! Vehicle registry
//!
//! Owns vehicle identity, organization, priority, and availability status.
//! An organization may only register and update its own vehicles.

use crate::shared::{require_same_org, resolve_caller};
use arteria_core::{
    ArteriaResult, Credential, DomainEvent, EntityKind, OrgDirectory, OrgId, Priority,
    StorageError, ValidationError, Vehicle, VehicleId, VehicleStatus,
};
use arteria_events::EventSink;
use arteria_storage::StateStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct VehicleRegistry {
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventSink>,
    directory: Arc<OrgDirectory>,
}

impl VehicleRegistry {
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

    /// Register a new vehicle for the caller's own organization.
    pub fn register(
        &self,
        caller: &Credential,
        vehicle_id: VehicleId,
        org: OrgId,
        vehicle_type: &str,
        priority_level: u8,
    ) -> ArteriaResult<Vehicle> {
        if vehicle_id.is_empty() {
            return Err(ValidationError::EmptyId {
                kind: EntityKind::Vehicle,
            }
            .into());
        }
        if !self.directory.is_known_org(&org) {
            return Err(ValidationError::UnknownOrganization {
                org: org.to_string(),
            }
            .into());
        }
        let priority = Priority::new(priority_level)?;

        if self.store.vehicle_exists(&vehicle_id)? {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Vehicle,
                id: vehicle_id.to_string(),
            }
            .into());
        }

        let caller_org = resolve_caller(&self.directory, caller)?;
        require_same_org(&caller_org, &org, "register vehicle")?;

        let vehicle = Vehicle::new(vehicle_id, org, vehicle_type, priority, caller.clone());
        self.store.vehicle_insert(&vehicle)?;
        self.events.publish(DomainEvent::VehicleRegistered {
            vehicle: vehicle.clone(),
        });
        Ok(vehicle)
    }

    /// Overwrite a vehicle's availability status.
    pub fn update_status(
        &self,
        caller: &Credential,
        vehicle_id: &VehicleId,
        status: VehicleStatus,
    ) -> ArteriaResult<Vehicle> {
        let mut vehicle = self.get(vehicle_id)?;
        let caller_org = resolve_caller(&self.directory, caller)?;
        require_same_org(&caller_org, &vehicle.org, "update vehicle status")?;

        vehicle.status = status;
        self.store.vehicle_put(&vehicle)?;
        self.events.publish(DomainEvent::VehicleUpdated {
            vehicle: vehicle.clone(),
        });
        Ok(vehicle)
    }

    /// Overwrite a vehicle's priority level.
    pub fn update_priority(
        &self,
        caller: &Credential,
        vehicle_id: &VehicleId,
        priority_level: u8,
    ) -> ArteriaResult<Vehicle> {
        let priority = Priority::new(priority_level)?;

        let mut vehicle = self.get(vehicle_id)?;
        let caller_org = resolve_caller(&self.directory, caller)?;
        require_same_org(&caller_org, &vehicle.org, "update vehicle priority")?;

        vehicle.priority = priority;
        self.store.vehicle_put(&vehicle)?;
        self.events.publish(DomainEvent::VehicleUpdated {
            vehicle: vehicle.clone(),
        });
        Ok(vehicle)
    }

    // === Queries ===

    /// Get a vehicle by id.
    pub fn get(&self, vehicle_id: &VehicleId) -> ArteriaResult<Vehicle> {
        self.store.vehicle_get(vehicle_id)?.ok_or_else(|| {
            StorageError::NotFound {
                kind: EntityKind::Vehicle,
                id: vehicle_id.to_string(),
            }
            .into()
        })
    }

    /// All registered vehicles.
    pub fn list_all(&self) -> ArteriaResult<Vec<Vehicle>> {
        self.store.vehicle_list_all()
    }

    /// Vehicles belonging to an organization.
    pub fn list_by_org(&self, org: &OrgId) -> ArteriaResult<Vec<Vehicle>> {
        self.store.vehicle_list_by_org(org)
    }

    /// Whether a vehicle is registered. Absence is not an error.
    pub fn exists(&self, vehicle_id: &VehicleId) -> ArteriaResult<bool> {
        self.store.vehicle_exists(vehicle_id)
    }
}

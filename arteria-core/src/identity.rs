//! Identity types for ARTERIA entities
//!
//! Identifiers are caller-supplied, externally addressable strings: the road
//! network, fleet inventories, and dispatch consoles all refer to the same
//! ids, so the core never generates vehicle/segment/mission ids itself.
//! Conflict ids are the one exception (created internally on tie contention).

use crate::error::AuthError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Strongly-typed identifier for vehicles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Strongly-typed identifier for road segments.
///
/// Opaque to the core: adjacency and geometry live in an external map store
/// consulted only by path-computing callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(String);

impl SegmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SegmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Strongly-typed identifier for missions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(String);

impl MissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MissionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Strongly-typed identifier for conflict records.
///
/// Generated by the ledger when two equal-priority missions contend for the
/// same segment. The UUIDv7 suffix keeps ids timestamp-sortable while avoiding
/// same-instant collisions on a busy segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictId(String);

impl ConflictId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh conflict id for a contested segment.
    pub fn generate(segment_id: &SegmentId) -> Self {
        Self(format!("CONFLICT-{}-{}", segment_id, Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConflictId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// CALLER IDENTITY
// ============================================================================

/// Opaque caller credential, e.g. the MSP id presented by a gateway
/// ("MedicalMSP"). The core never inspects its contents; it is resolved to an
/// organization through an [`OrgDirectory`] on every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Organization identifier ("medical", "police", ...).
///
/// Organizations are mutually distrusting: every mutating operation compares
/// the caller's resolved organization against the owning organization of the
/// touched resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// ORG DIRECTORY
// ============================================================================

/// Table-driven credential→organization lookup.
///
/// Built once from configuration and injected into every service; adding an
/// organization is a table entry, never a code change in reservation logic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrgDirectory {
    by_credential: HashMap<String, OrgId>,
}

static STANDARD: Lazy<OrgDirectory> = Lazy::new(|| {
    OrgDirectory::new()
        .with_mapping("MedicalMSP", "medical")
        .with_mapping("PoliceMSP", "police")
});

impl OrgDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock two-organization directory (medical, police).
    pub fn standard() -> &'static OrgDirectory {
        &STANDARD
    }

    /// Add a credential→organization mapping.
    pub fn with_mapping(
        mut self,
        credential: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        self.by_credential
            .insert(credential.into(), OrgId::new(organization));
        self
    }

    /// Resolve a caller credential to its organization.
    ///
    /// An unmapped credential is fatal: no operation proceeds on behalf of an
    /// unrecognized caller.
    pub fn resolve(&self, credential: &Credential) -> Result<OrgId, AuthError> {
        self.by_credential
            .get(credential.as_str())
            .cloned()
            .ok_or_else(|| AuthError::UnknownCredential {
                credential: credential.as_str().to_string(),
            })
    }

    /// Whether the organization appears anywhere in the table.
    pub fn is_known_org(&self, org: &OrgId) -> bool {
        self.by_credential.values().any(|o| o == org)
    }

    /// All distinct organizations in the table.
    pub fn organizations(&self) -> Vec<OrgId> {
        let mut orgs: Vec<OrgId> = self.by_credential.values().cloned().collect();
        orgs.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        orgs.dedup();
        orgs
    }
}

//! ARTERIA Events - Event Sink Trait and Audit Trail
//!
//! Defines the fire-and-forget publication boundary. The core publishes a
//! [`DomainEvent`] for every grant, preemption, conflict, and lifecycle
//! transition and assumes nothing about delivery; audit persistence and
//! notification fan-out are entirely external consumers.

use arteria_core::{DomainEvent, MissionId, Timestamp};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

// ============================================================================
// EVENT SINK TRAIT
// ============================================================================

/// Fire-and-forget event publication.
///
/// `publish` must not fail and must not block the calling operation: a sink
/// that needs durable delivery buffers internally and reconciles on its own
/// schedule.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Sink that drops every event. For callers that do not audit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: DomainEvent) {}
}

// ============================================================================
// RECORDING SINK
// ============================================================================

/// One recorded event in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedEvent {
    /// Monotonic sequence number, 1-based, gap-free in publication order.
    pub seq: u64,
    /// Stable wire name, e.g. "PREEMPTION_TRIGGERED".
    pub event_type: &'static str,
    /// When the sink accepted the event.
    pub recorded_at: Timestamp,
    pub event: DomainEvent,
}

/// In-memory sink that keeps an ordered audit trail.
///
/// Used by tests and single-process deployments; doubles as the reference for
/// what an external audit consumer sees.
#[derive(Debug, Default)]
pub struct RecordingSink {
    next_seq: AtomicU64,
    records: RwLock<Vec<RecordedEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in publication order.
    pub fn records(&self) -> Vec<RecordedEvent> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Records with a given wire name, in publication order.
    pub fn records_of_type(&self, event_type: &str) -> Vec<RecordedEvent> {
        self.records()
            .into_iter()
            .filter(|r| r.event_type == event_type)
            .collect()
    }

    /// Records concerning a single mission, in publication order.
    pub fn records_for_mission(&self, mission_id: &MissionId) -> Vec<RecordedEvent> {
        self.records()
            .into_iter()
            .filter(|r| r.event.mission_id() == Some(mission_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: DomainEvent) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let record = RecordedEvent {
            seq,
            event_type: event.event_type(),
            recorded_at: Utc::now(),
            event,
        };
        // Fire-and-forget: a poisoned trail drops the event rather than
        // failing the publishing operation.
        if let Ok(mut records) = self.records.write() {
            records.push(record);
        }
    }
}

//! Event types for operator observability
//!
//! The reconciler publishes one event per observable transition of a monitor
//! or its workload.

use crate::ObjectKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all monitor events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Event severity
    pub severity: EventSeverity,

    /// Monitor the event is about
    pub monitor: ObjectKey,

    /// The actual event
    pub event: MonitorEvent,
}

impl MonitorEventEnvelope {
    /// Wrap an event, deriving the severity from its kind
    pub fn new(monitor: ObjectKey, event: MonitorEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            severity: event.severity(),
            monitor,
            event,
        }
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// Monitor lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorEvent {
    /// Monitor entered the degraded state
    Degraded { reason: String },

    /// Monitor left the degraded state
    Recovered,

    /// Workload created for a healthy monitor
    WorkloadCreated { workload: ObjectKey },

    /// Workload spec restored after drift
    WorkloadUpdated { workload: ObjectKey },

    /// Workload removed because the monitor became degraded
    WorkloadDeleted { workload: ObjectKey },

    /// A reconciliation pass failed and will be retried
    ReconcileFailed { reason: String },
}

impl MonitorEvent {
    pub fn severity(&self) -> EventSeverity {
        match self {
            MonitorEvent::Degraded { .. } | MonitorEvent::WorkloadDeleted { .. } => {
                EventSeverity::Warning
            }
            MonitorEvent::ReconcileFailed { .. } => EventSeverity::Error,
            _ => EventSeverity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_severity_follows_event() {
        let key = ObjectKey::new("ns", "m");
        let degraded = MonitorEventEnvelope::new(
            key.clone(),
            MonitorEvent::Degraded {
                reason: "conflict".into(),
            },
        );
        assert_eq!(degraded.severity, EventSeverity::Warning);

        let recovered = MonitorEventEnvelope::new(key, MonitorEvent::Recovered);
        assert_eq!(recovered.severity, EventSeverity::Info);
        assert_ne!(degraded.id, recovered.id);
    }
}

//! Admission gate for monitor writes
//!
//! Rejects malformed interface lists and claims that collide with a healthy
//! monitor before they are persisted. Structural checks never touch the store.

use crate::error::Result;
use crate::store::{bounded, MonitorStore};
use relay_types::LacpMonitor;
use relay_validation::{find_conflict, validate_interfaces};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Non-fatal admission notes; currently always empty
pub type Warnings = Vec<String>;

/// Admit `candidate` against a snapshot of existing monitors
pub fn admit<'a, I>(candidate: &LacpMonitor, existing: I) -> Result<Warnings>
where
    I: IntoIterator<Item = &'a LacpMonitor>,
{
    validate_interfaces(&candidate.spec.interfaces)?;
    find_conflict(candidate, existing)?;
    Ok(Warnings::new())
}

/// Store-backed admission entry points
#[derive(Clone)]
pub struct AdmissionGate {
    monitors: Arc<dyn MonitorStore>,
    list_timeout: Duration,
}

impl AdmissionGate {
    pub fn new(monitors: Arc<dyn MonitorStore>, list_timeout: Duration) -> Self {
        Self {
            monitors,
            list_timeout,
        }
    }

    #[instrument(skip(self, candidate), fields(monitor = %candidate.key()))]
    pub async fn validate_create(&self, candidate: &LacpMonitor) -> Result<Warnings> {
        self.validate(candidate).await
    }

    #[instrument(skip(self, _old, new), fields(monitor = %new.key()))]
    pub async fn validate_update(&self, _old: &LacpMonitor, new: &LacpMonitor) -> Result<Warnings> {
        self.validate(new).await
    }

    /// Deletion is always admitted
    pub async fn validate_delete(&self, monitor: &LacpMonitor) -> Result<Warnings> {
        debug!(monitor = %monitor.key(), "Admitting delete");
        Ok(Warnings::new())
    }

    async fn validate(&self, candidate: &LacpMonitor) -> Result<Warnings> {
        validate_interfaces(&candidate.spec.interfaces).map_err(|e| {
            warn!(error = %e, "Rejected malformed monitor");
            e
        })?;

        let existing = bounded(
            "list monitors",
            self.list_timeout,
            self.monitors.list_monitors(Some(candidate.namespace())),
        )
        .await?;

        find_conflict(candidate, &existing).map_err(|e| {
            warn!(error = %e, "Rejected conflicting monitor");
            e
        })?;

        Ok(Warnings::new())
    }
}

//! Workload synchronization

use crate::desired::{controller_reference, desired_workload, workload_key};
use crate::error::Result;
use crate::image::ImageSource;
use crate::store::{bounded, WorkloadStore};
use relay_types::{LacpMonitor, ObjectKey};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// What a sync did to the workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Workload was absent and has been created
    Created(ObjectKey),
    /// Workload spec had drifted and has been restored
    Updated(ObjectKey),
    /// Workload already matched; nothing was written
    Unchanged(ObjectKey),
}

impl SyncOutcome {
    pub fn workload(&self) -> &ObjectKey {
        match self {
            SyncOutcome::Created(key) | SyncOutcome::Updated(key) | SyncOutcome::Unchanged(key) => {
                key
            }
        }
    }
}

/// Converges the managed workload of a monitor onto its desired state
#[derive(Clone)]
pub struct WorkloadSynchronizer {
    workloads: Arc<dyn WorkloadStore>,
    images: Arc<dyn ImageSource>,
    timeout: Duration,
}

impl WorkloadSynchronizer {
    pub fn new(
        workloads: Arc<dyn WorkloadStore>,
        images: Arc<dyn ImageSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            workloads,
            images,
            timeout,
        }
    }

    /// Create, update or leave alone the workload of `monitor`
    ///
    /// Specs are compared structurally; an equal spec means no write.
    #[instrument(skip(self, monitor), fields(monitor = %monitor.key()))]
    pub async fn sync(&self, monitor: &LacpMonitor) -> Result<SyncOutcome> {
        let image = self.images.require()?;
        let desired = desired_workload(monitor, &image);
        let key = desired.key();

        let current = bounded(
            "get workload",
            self.timeout,
            self.workloads.get_workload(&key),
        )
        .await?;

        match current {
            None => {
                let mut workload = desired;
                workload
                    .metadata
                    .owner_references
                    .push(controller_reference(monitor)?);

                bounded(
                    "create workload",
                    self.timeout,
                    self.workloads.create_workload(workload),
                )
                .await?;

                info!(workload = %key, "Workload created");
                Ok(SyncOutcome::Created(key))
            }
            Some(current) if current.spec == desired.spec => {
                debug!(workload = %key, "Workload up to date");
                Ok(SyncOutcome::Unchanged(key))
            }
            Some(mut current) => {
                current.spec = desired.spec;
                bounded(
                    "update workload",
                    self.timeout,
                    self.workloads.update_workload(current),
                )
                .await?;

                info!(workload = %key, "Workload updated");
                Ok(SyncOutcome::Updated(key))
            }
        }
    }

    /// Delete the workload of `monitor`, reporting whether one existed
    #[instrument(skip(self, monitor), fields(monitor = %monitor.key()))]
    pub async fn delete(&self, monitor: &LacpMonitor) -> Result<bool> {
        let key = workload_key(monitor);

        let current = bounded(
            "get workload",
            self.timeout,
            self.workloads.get_workload(&key),
        )
        .await?;
        if current.is_none() {
            return Ok(false);
        }

        let deleted = bounded(
            "delete workload",
            self.timeout,
            self.workloads.delete_workload(&key),
        )
        .await?;

        if deleted {
            info!(workload = %key, "Workload deleted");
        }
        Ok(deleted)
    }
}

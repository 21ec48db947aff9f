//! Operator wiring
//!
//! Builds the admission gate, reconciler and controller over one pair of
//! stores and one event channel.

use crate::admission::AdmissionGate;
use crate::config::OperatorConfig;
use crate::controller::Controller;
use crate::image::{EnvImageSource, ImageSource, StaticImageSource};
use crate::reconciler::Reconciler;
use crate::store::{MonitorStore, WorkloadStore};
use crate::sync::WorkloadSynchronizer;
use relay_types::MonitorEventEnvelope;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Channel capacity for monitor events
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Fully wired operator
pub struct Operator {
    config: OperatorConfig,
    admission: AdmissionGate,
    reconciler: Reconciler,
    controller: Arc<Controller>,
    events: broadcast::Sender<MonitorEventEnvelope>,
}

impl Operator {
    /// Wire an operator, taking the image from the config or the environment
    pub fn new(
        config: OperatorConfig,
        monitors: Arc<dyn MonitorStore>,
        workloads: Arc<dyn WorkloadStore>,
    ) -> Self {
        let images: Arc<dyn ImageSource> = match &config.image {
            Some(image) => Arc::new(StaticImageSource::new(image.clone())),
            None => Arc::new(EnvImageSource::new()),
        };
        Self::with_image_source(config, monitors, workloads, images)
    }

    pub fn with_image_source(
        config: OperatorConfig,
        monitors: Arc<dyn MonitorStore>,
        workloads: Arc<dyn WorkloadStore>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store_timeout = config.controller.store_timeout();

        let admission = AdmissionGate::new(monitors.clone(), config.admission.list_timeout());
        let synchronizer = WorkloadSynchronizer::new(workloads, images, store_timeout);
        let reconciler = Reconciler::new(
            monitors.clone(),
            synchronizer,
            events.clone(),
            store_timeout,
        );
        let controller = Arc::new(Controller::new(
            reconciler.clone(),
            monitors,
            config.controller.clone(),
        ));

        Self {
            config,
            admission,
            reconciler,
            controller,
            events,
        }
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    pub fn admission(&self) -> &AdmissionGate {
        &self.admission
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn controller(&self) -> Arc<Controller> {
        self.controller.clone()
    }

    /// Subscribe to monitor events
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEventEnvelope> {
        self.events.subscribe()
    }
}

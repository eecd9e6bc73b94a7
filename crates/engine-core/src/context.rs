use crate::{connectors::ConnectionProvider, progress::ProgressReporter};
use model::{core::identifiers::RunId, entity::registry::EntityRegistry};
use std::{sync::Arc, time::Duration};

/// Everything a run needs, built once and handed down to the dispatcher,
/// the pool and every worker.
pub struct ReplicationContext<P: ConnectionProvider> {
    pub run_id: RunId,
    pub provider: Arc<P>,
    pub registry: Arc<EntityRegistry>,
    pub progress: ProgressReporter,
    pub job_timeout: Option<Duration>,
}

impl<P: ConnectionProvider> ReplicationContext<P> {
    pub fn new(provider: P, registry: EntityRegistry) -> Self {
        Self {
            run_id: RunId::generate(),
            provider: Arc::new(provider),
            registry: Arc::new(registry),
            progress: ProgressReporter::new(),
            job_timeout: None,
        }
    }

    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }
}

impl<P: ConnectionProvider> Clone for ReplicationContext<P> {
    fn clone(&self) -> Self {
        Self {
            run_id: self.run_id.clone(),
            provider: Arc::clone(&self.provider),
            registry: Arc::clone(&self.registry),
            progress: self.progress.clone(),
            job_timeout: self.job_timeout,
        }
    }
}

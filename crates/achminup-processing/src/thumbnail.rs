use crate::error::ProcessingResult;
use crate::job::ProcessingJob;
use crate::log::JobLog;
use crate::processor::{promote, Processor};
use achminup_storage::OwnershipRegistry;
use async_trait::async_trait;

/// Thumbnails are published as uploaded.
pub struct ThumbnailProcessor {
    registry: OwnershipRegistry,
}

impl ThumbnailProcessor {
    pub fn new(registry: OwnershipRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Processor for ThumbnailProcessor {
    async fn process(&self, job: &ProcessingJob, log: &mut JobLog) -> ProcessingResult<()> {
        promote(
            &self.registry,
            job,
            job.src(),
            vec![job.src(), job.serve()],
            log,
        )
        .await
    }
}

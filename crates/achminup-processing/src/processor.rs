//! Format dispatch
//!
//! Each asset format has exactly one [`Processor`]. [`ProcessorSet`] resolves
//! the processor for a job and wraps the run with the start and outcome lines
//! every job log carries.

use crate::error::{ProcessingError, ProcessingResult};
use crate::job::ProcessingJob;
use crate::log::JobLog;
use crate::thumbnail::ThumbnailProcessor;
use crate::tool::ToolRunner;
use crate::video::VideoProcessor;
use achminup_core::AssetFormat;
use achminup_storage::{discard_all, move_file, OwnershipRegistry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, job: &ProcessingJob, log: &mut JobLog) -> ProcessingResult<()>;
}

/// Executables the standard processors shell out to.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub transcoder: String,
    pub probe: String,
}

#[derive(Clone, Default)]
pub struct ProcessorSet {
    processors: HashMap<AssetFormat, Arc<dyn Processor>>,
}

impl ProcessorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Video and thumbnail processors sharing one runner and registry.
    pub fn standard(
        runner: Arc<dyn ToolRunner>,
        registry: OwnershipRegistry,
        tools: &ToolPaths,
    ) -> Self {
        Self::new()
            .with(
                AssetFormat::Video,
                Arc::new(VideoProcessor::new(runner, registry.clone(), tools)),
            )
            .with(
                AssetFormat::Thumbnail,
                Arc::new(ThumbnailProcessor::new(registry)),
            )
    }

    pub fn with(mut self, format: AssetFormat, processor: Arc<dyn Processor>) -> Self {
        self.processors.insert(format, processor);
        self
    }

    pub fn get(&self, format: AssetFormat) -> Option<Arc<dyn Processor>> {
        self.processors.get(&format).cloned()
    }

    pub async fn process(&self, job: &ProcessingJob, log: &mut JobLog) -> ProcessingResult<()> {
        log.line(format!("Starting processing for '{}'", job.format()));
        log.line(format!("src: {}", job.src().display()));
        log.line(format!("dst: {}", job.dst().display()));
        log.line(format!("srv: {}", job.serve().display()));

        let start = Instant::now();
        let result = match self.get(job.format()) {
            Some(processor) => processor.process(job, log).await,
            None => Err(ProcessingError::UnsupportedFormat(job.format().to_string())),
        };
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(()) => log.line(format!("Succeeded ({:.2}s)", elapsed)),
            Err(e) => log.line(format!("Failed ({:.2}s): {}", elapsed, e)),
        }
        result
    }
}

/// Move `from` into the serve stage if the owner record still exists;
/// otherwise remove every path in `discard` and report the deletion.
pub(crate) async fn promote(
    registry: &OwnershipRegistry,
    job: &ProcessingJob,
    from: PathBuf,
    discard: Vec<PathBuf>,
    log: &mut JobLog,
) -> ProcessingResult<()> {
    let serve = job.serve();
    let target = serve.clone();
    let source = from.clone();

    let (exists, moved) = registry
        .check_and_act(&job.owner(), |exists| async move {
            if exists {
                move_file(&source, &target).await
            } else {
                let paths: Vec<&std::path::Path> = discard.iter().map(|p| p.as_path()).collect();
                discard_all(&paths).await;
                Ok(())
            }
        })
        .await;

    if !exists {
        log.line("Owner record gone, discarded artifacts");
        return Err(ProcessingError::DeletedDuringProcessing(job.key().to_string()));
    }

    match moved {
        Ok(()) => {
            log.line(format!("Moved {} -> {}", from.display(), serve.display()));
            Ok(())
        }
        Err(e) => {
            log.line(format!("Failed to move {}: {}", from.display(), e));
            Err(e.into())
        }
    }
}

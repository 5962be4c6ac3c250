use crate::error::{ProcessingError, ProcessingResult};
use crate::job::ProcessingJob;
use crate::log::JobLog;
use crate::processor::{promote, Processor, ToolPaths};
use crate::tool::ToolRunner;
use crate::video::rotation::RotationProbe;
use crate::video::transcoder::{Quality, Transcoder};
use achminup_storage::{discard_all, remove_if_exists, OwnershipRegistry};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
enum VideoStep {
    RotationProbe,
    Pass { rotation: u32, quality: Quality },
    /// Carries the high-quality failure, if any, reported once `src` is gone.
    Cleanup { failure: Option<ProcessingError> },
}

/// Rotation-aware two-pass transcoder.
///
/// A fast low-quality pass is published first so the asset is watchable
/// early, then a high-quality pass from the same source replaces it. Both
/// publications are gated on the owner record.
pub struct VideoProcessor {
    runner: Arc<dyn ToolRunner>,
    registry: OwnershipRegistry,
    transcoder: Transcoder,
    probe: RotationProbe,
}

impl VideoProcessor {
    pub fn new(runner: Arc<dyn ToolRunner>, registry: OwnershipRegistry, tools: &ToolPaths) -> Self {
        Self {
            runner,
            registry,
            transcoder: Transcoder::new(tools.transcoder.clone()),
            probe: RotationProbe::new(tools.probe.clone()),
        }
    }

    /// Transcode one pass and publish it. A transcoder failure is returned as
    /// `Ok(Some(_))` after dropping the pass output; `Err` means the job is
    /// over (owner record gone, or promotion failed).
    async fn run_pass(
        &self,
        job: &ProcessingJob,
        rotation: u32,
        quality: Quality,
        log: &mut JobLog,
    ) -> ProcessingResult<Option<ProcessingError>> {
        log.line(format!("Transcoding {} video", quality.label()));

        let output = self
            .transcoder
            .transcode(
                self.runner.as_ref(),
                &job.src(),
                &job.dst(),
                rotation,
                quality,
                log,
            )
            .await;

        let failure = match output {
            Ok(output) if output.success => None,
            Ok(output) => Some(ProcessingError::ToolFailed {
                program: self.transcoder.program().to_string(),
                status: output.status(),
            }),
            Err(e) => Some(e),
        };

        if let Some(e) = failure {
            log.line(format!("Transcoding {} video failed: {}", quality.label(), e));
            discard_all(&[job.dst().as_path()]).await;
            return Ok(Some(e));
        }

        promote(
            &self.registry,
            job,
            job.dst(),
            vec![job.src(), job.dst(), job.serve()],
            log,
        )
        .await?;
        Ok(None)
    }
}

#[async_trait]
impl Processor for VideoProcessor {
    async fn process(&self, job: &ProcessingJob, log: &mut JobLog) -> ProcessingResult<()> {
        let mut step = VideoStep::RotationProbe;

        loop {
            step = match step {
                VideoStep::RotationProbe => {
                    let rotation = self.probe.probe(self.runner.as_ref(), &job.src(), log).await;
                    VideoStep::Pass {
                        rotation,
                        quality: Quality::Low,
                    }
                }
                VideoStep::Pass { rotation, quality } => {
                    let failure = self.run_pass(job, rotation, quality, log).await?;
                    match quality {
                        // The draft is optional, the final pass still runs
                        Quality::Low => VideoStep::Pass {
                            rotation,
                            quality: Quality::High,
                        },
                        Quality::High => VideoStep::Cleanup { failure },
                    }
                }
                VideoStep::Cleanup { failure } => {
                    remove_if_exists(&job.src()).await?;
                    tracing::debug!(asset = %job.key(), "Video processing finished");
                    return match failure {
                        Some(e) => Err(e),
                        None => Ok(()),
                    };
                }
            };
        }
    }
}

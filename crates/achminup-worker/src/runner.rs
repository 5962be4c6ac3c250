//! Job runner: one detached task per accepted upload.
//!
//! There is no pool, queue or retry. A job runs until its processor returns and
//! is lost if the process exits first.

use achminup_processing::{JobLog, ProcessingJob, ProcessingResult, ProcessorSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Process-wide job number, used only to correlate log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p-{}", self.0)
    }
}

/// Handle to a spawned job. Dropping it detaches the job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    handle: JoinHandle<ProcessingResult<()>>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Wait for the job to finish. Request handling never calls this.
    pub async fn wait(self) -> Result<ProcessingResult<()>, tokio::task::JoinError> {
        self.handle.await
    }
}

#[derive(Clone)]
pub struct JobRunner {
    processors: Arc<ProcessorSet>,
    next_id: Arc<AtomicU64>,
}

impl JobRunner {
    pub fn new(processors: Arc<ProcessorSet>) -> Self {
        Self {
            processors,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start `job` on the runtime and return immediately.
    pub fn spawn(&self, job: ProcessingJob) -> JobHandle {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let processors = self.processors.clone();

        tracing::debug!(job_id = %id, asset = %job.key(), "Spawning processing job");

        let handle = tokio::spawn(async move {
            let mut log = JobLog::new();
            let start = Instant::now();
            let result = processors.process(&job, &mut log).await;
            let elapsed_secs = start.elapsed().as_secs_f64();

            let outcome = match &result {
                Ok(()) => "succeeded",
                Err(_) => "failed",
            };
            tracing::info!(
                job_id = %id,
                asset = %job.key(),
                outcome,
                elapsed_secs,
                "Output for process {}\n{}",
                id,
                log.render()
            );

            result
        });

        JobHandle { id, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use achminup_core::{AssetFormat, AssetId, AssetKey, StageRoots};
    use achminup_processing::{ProcessingError, Processor};
    use achminup_storage::Stager;
    use async_trait::async_trait;
    use std::path::Path;
    use tokio::sync::{oneshot, Mutex};
    use uuid::Uuid;

    struct GatedProcessor {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl Processor for GatedProcessor {
        async fn process(&self, _job: &ProcessingJob, log: &mut JobLog) -> ProcessingResult<()> {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            log.line("released");
            Ok(())
        }
    }

    struct FailingProcessor;

    #[async_trait]
    impl Processor for FailingProcessor {
        async fn process(&self, job: &ProcessingJob, _log: &mut JobLog) -> ProcessingResult<()> {
            Err(ProcessingError::DeletedDuringProcessing(job.key().to_string()))
        }
    }

    fn job(format: AssetFormat) -> ProcessingJob {
        let stager = Stager::new(StageRoots::new("/d", Path::new("/p"), "/s"));
        ProcessingJob::new(stager.paths(AssetKey::new(format, AssetId::new(Uuid::new_v4()))))
    }

    #[tokio::test]
    async fn test_job_ids_are_monotonic() {
        let runner = JobRunner::new(Arc::new(
            ProcessorSet::new().with(AssetFormat::Thumbnail, Arc::new(FailingProcessor)),
        ));

        let first = runner.spawn(job(AssetFormat::Thumbnail));
        let second = runner.clone().spawn(job(AssetFormat::Thumbnail));

        assert_eq!(first.id().to_string(), "p-1");
        assert_eq!(second.id().to_string(), "p-2");
        assert!(first.id() < second.id());

        first.wait().await.unwrap().unwrap_err();
        second.wait().await.unwrap().unwrap_err();
    }

    #[tokio::test]
    async fn test_spawn_does_not_wait_for_job() {
        let (release, gate) = oneshot::channel();
        let runner = JobRunner::new(Arc::new(ProcessorSet::new().with(
            AssetFormat::Video,
            Arc::new(GatedProcessor {
                gate: Mutex::new(Some(gate)),
            }),
        )));

        let handle = runner.spawn(job(AssetFormat::Video));
        release.send(()).unwrap();

        assert!(handle.wait().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_failure_is_returned_through_handle() {
        let runner = JobRunner::new(Arc::new(
            ProcessorSet::new().with(AssetFormat::Video, Arc::new(FailingProcessor)),
        ));

        let result = runner.spawn(job(AssetFormat::Video)).wait().await.unwrap();
        assert!(matches!(
            result,
            Err(ProcessingError::DeletedDuringProcessing(_))
        ));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn test_job_log_is_flushed_as_one_record() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let runner = JobRunner::new(Arc::new(ProcessorSet::new().with(
            AssetFormat::Video,
            Arc::new(GatedProcessor {
                gate: Mutex::new(None),
            }),
        )));
        runner
            .spawn(job(AssetFormat::Video))
            .wait()
            .await
            .unwrap()
            .unwrap();

        let output = logs.contents();
        assert_eq!(output.matches("Output for process").count(), 1, "{}", output);
        assert!(output.contains("Output for process p-1"));
        assert!(output.contains("job_id=p-1"));
        assert!(output.contains("outcome=\"succeeded\""));
        assert!(output.contains("Starting processing for 'videos'"));
        assert!(output.contains("released"));
        assert!(output.contains("Succeeded ("));
    }
}

//! Upload and delete orchestration
//!
//! Upload claims the asset by publishing its owner record before any
//! processing starts, then hands the payload to a background job. Delete
//! consumes the owner record through the ownership registry, which is what
//! makes a racing job discard its output instead of publishing it.

use achminup_core::{AppError, AssetKey, DeleteMismatchPolicy, Identity};
use achminup_processing::ProcessingJob;
use achminup_storage::{
    move_file, remove_if_exists, OwnershipRegistry, Stage, StagedPaths, Stager, StorageError,
};
use achminup_worker::JobRunner;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Per-request number used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestNumber(u64);

impl fmt::Display for RequestNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r-{}", self.0)
    }
}

/// Result of a delete that did not fail on I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// No owner record: never uploaded or already deleted.
    AlreadyAbsent,
    /// The caller is not the owner. `removed` tells whether the asset was
    /// removed anyway under [`DeleteMismatchPolicy::Cleanup`].
    OwnerMismatch { removed: bool },
}

impl DeleteOutcome {
    /// A non-owner is refused even when the asset was removed.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            DeleteOutcome::Deleted | DeleteOutcome::AlreadyAbsent => Ok(()),
            DeleteOutcome::OwnerMismatch { .. } => Err(AppError::Forbidden(
                "User not authorized to delete".to_string(),
            )),
        }
    }
}

#[derive(Clone)]
pub struct AssetService {
    stager: Stager,
    registry: OwnershipRegistry,
    runner: JobRunner,
    public_base_url: String,
    public_path: String,
    mismatch_policy: DeleteMismatchPolicy,
    next_request: Arc<AtomicU64>,
}

impl AssetService {
    pub fn new(
        stager: Stager,
        registry: OwnershipRegistry,
        runner: JobRunner,
        public_base_url: impl Into<String>,
        public_path: impl Into<String>,
        mismatch_policy: DeleteMismatchPolicy,
    ) -> Self {
        Self {
            stager,
            registry,
            runner,
            public_base_url: public_base_url.into(),
            public_path: public_path.into(),
            mismatch_policy,
            next_request: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn next_request(&self) -> RequestNumber {
        RequestNumber(self.next_request.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// `{public_base_url}{public_path}/{format}/{id}{ext}`
    pub fn public_url(&self, key: &AssetKey) -> String {
        format!(
            "{}{}/{}/{}",
            self.public_base_url,
            self.public_path,
            key.format,
            key.payload_file_name()
        )
    }

    /// Stage `body` as `key` owned by `owner`, start processing and return the
    /// URL the asset will be served at. Nothing is spawned if any step fails.
    pub async fn upload<R>(
        &self,
        key: AssetKey,
        owner: &Identity,
        body: &mut R,
    ) -> Result<String, StorageError>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        tracing::info!(asset = %key, "Uploading");

        let paths = self.stager.paths(key);
        self.stager.ensure_unclaimed(&paths).await?;

        let download_owner = paths.owner(Stage::Download);
        self.stager
            .write_owner_record(&download_owner, owner)
            .await?;

        let size_bytes = self
            .stager
            .write_stream(&paths.payload(Stage::Download), body)
            .await?;
        tracing::debug!(size_bytes, "Downloaded resource");

        self.registry
            .publish(&download_owner, &paths.owner(Stage::Serve))
            .await?;
        tracing::debug!(path = %paths.owner(Stage::Serve).display(), "Published owner");

        move_file(&paths.payload(Stage::Download), &paths.payload(Stage::Src)).await?;

        let url = self.public_url(&key);
        let job = self.runner.spawn(ProcessingJob::new(paths));
        tracing::info!(job_id = %job.id(), url = %url, "Upload accepted");

        Ok(url)
    }

    /// Delete `key` on behalf of `caller`.
    pub async fn delete(
        &self,
        key: AssetKey,
        caller: &Identity,
    ) -> Result<DeleteOutcome, StorageError> {
        tracing::info!(asset = %key, "Deleting");

        let paths = self.stager.paths(key);
        let owner_record = paths.owner(Stage::Serve);

        let (_, outcome) = self
            .registry
            .check_and_act(&owner_record, |exists| {
                self.delete_claimed(&paths, caller, exists)
            })
            .await;

        let outcome = outcome?;
        match outcome {
            DeleteOutcome::Deleted => tracing::info!("Deleted"),
            DeleteOutcome::AlreadyAbsent => {
                tracing::info!(path = %owner_record.display(), "Owner not found, already deleted")
            }
            DeleteOutcome::OwnerMismatch { removed } => {
                tracing::warn!(removed, "Delete requested by non-owner")
            }
        }
        Ok(outcome)
    }

    /// Runs under the registry lock.
    async fn delete_claimed(
        &self,
        paths: &StagedPaths,
        caller: &Identity,
        exists: bool,
    ) -> Result<DeleteOutcome, StorageError> {
        if !exists {
            return Ok(DeleteOutcome::AlreadyAbsent);
        }

        let owner_record = paths.owner(Stage::Serve);
        // An unreadable record is still removed, then reported
        let stored = self.stager.read_owner_record(&owner_record).await;
        let is_owner = matches!(&stored, Ok(owner) if owner == caller.as_str());

        if stored.is_ok() && !is_owner && self.mismatch_policy == DeleteMismatchPolicy::Preserve {
            return Ok(DeleteOutcome::OwnerMismatch { removed: false });
        }

        let payload = paths.payload(Stage::Serve);
        if remove_if_exists(&payload).await? {
            tracing::debug!(path = %payload.display(), "Deleted resource");
        }
        remove_if_exists(&owner_record).await?;
        tracing::debug!(path = %owner_record.display(), "Deleted owner");

        stored?;
        if is_owner {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::OwnerMismatch { removed: true })
        }
    }
}

//! Ownership registry
//!
//! The serve-stage owner record decides whether an asset is still claimed. A
//! processor promoting output and a delete removing the asset both look at that
//! record and then mutate the serve stage, so the look and the mutation have to
//! happen under one process-wide lock or a deleted asset can reappear.

use crate::error::{StorageError, StorageResult};
use crate::stager::move_file;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Clone, Debug)]
pub struct OwnershipRegistry {
    lock: Arc<Mutex<()>>,
}

impl OwnershipRegistry {
    /// Build a registry around a shared lock. Every component that mutates the
    /// serve stage must hold a registry built from the same lock.
    pub fn new(lock: Arc<Mutex<()>>) -> Self {
        Self { lock }
    }

    /// Check whether `record` exists and run `action` with the answer, all
    /// while holding the lock. Returns the observed existence along with the
    /// action's result. An unreadable record counts as absent.
    pub async fn check_and_act<F, Fut, R>(&self, record: &Path, action: F) -> (bool, R)
    where
        F: FnOnce(bool) -> Fut,
        Fut: Future<Output = R>,
    {
        let _guard = self.lock.lock().await;
        let exists = fs::try_exists(record).await.unwrap_or(false);
        let result = action(exists).await;
        (exists, result)
    }

    /// Publish an owner record by renaming it into place under the lock.
    /// Fails with [`StorageError::AlreadyExists`] if `to` is already
    /// published, so two uploads of the same id cannot both claim it.
    pub async fn publish(&self, from: &Path, to: &Path) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        if fs::try_exists(to).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(to.to_path_buf()));
        }
        move_file(from, to).await
    }
}

impl Default for OwnershipRegistry {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(())))
    }
}

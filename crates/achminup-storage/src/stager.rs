use crate::error::{StorageError, StorageResult};
use achminup_core::{AssetFormat, AssetKey, Identity, StageRoots};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// The four mutually exclusive stages a payload passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Src,
    Dst,
    Serve,
}

/// Every path an asset can occupy, computed purely from its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPaths {
    pub key: AssetKey,
    download_dir: PathBuf,
    src_dir: PathBuf,
    dst_dir: PathBuf,
    serve_dir: PathBuf,
}

impl StagedPaths {
    fn dir(&self, stage: Stage) -> &Path {
        match stage {
            Stage::Download => &self.download_dir,
            Stage::Src => &self.src_dir,
            Stage::Dst => &self.dst_dir,
            Stage::Serve => &self.serve_dir,
        }
    }

    /// `{stage}/{format}/{id}{ext}`
    pub fn payload(&self, stage: Stage) -> PathBuf {
        self.dir(stage).join(self.key.payload_file_name())
    }

    /// `{stage}/{format}/{id}.owner.txt`
    pub fn owner(&self, stage: Stage) -> PathBuf {
        self.dir(stage).join(self.key.owner_file_name())
    }
}

/// Local filesystem stager
#[derive(Clone, Debug)]
pub struct Stager {
    roots: StageRoots,
}

impl Stager {
    pub fn new(roots: StageRoots) -> Self {
        Self { roots }
    }

    /// Create `{root}/{format}` for every stage root and format.
    pub async fn ensure_layout(&self) -> StorageResult<()> {
        for root in self.roots.all() {
            for format in AssetFormat::ALL {
                let dir = root.join(format.dir_name());
                fs::create_dir_all(&dir).await.map_err(|e| {
                    StorageError::WriteFailed(format!(
                        "Failed to create stage directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        tracing::debug!(
            download = %self.roots.download.display(),
            src = %self.roots.src.display(),
            dst = %self.roots.dst.display(),
            serve = %self.roots.serve.display(),
            "Stage directories ready"
        );
        Ok(())
    }

    pub fn paths(&self, key: AssetKey) -> StagedPaths {
        let format = key.format.dir_name();
        StagedPaths {
            key,
            download_dir: self.roots.download.join(format),
            src_dir: self.roots.src.join(format),
            dst_dir: self.roots.dst.join(format),
            serve_dir: self.roots.serve.join(format),
        }
    }

    /// Fail with [`StorageError::AlreadyExists`] when the asset already has a
    /// published owner record.
    pub async fn ensure_unclaimed(&self, paths: &StagedPaths) -> StorageResult<()> {
        let owner = paths.owner(Stage::Serve);
        if fs::try_exists(&owner).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(owner));
        }
        Ok(())
    }

    /// Write the owner record. Its only content is the identity string.
    pub async fn write_owner_record(&self, path: &Path, identity: &Identity) -> StorageResult<()> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create owner {}: {}", path.display(), e))
        })?;
        file.write_all(identity.as_str().as_bytes())
            .await
            .map_err(|e| {
                StorageError::WriteFailed(format!("Failed to write owner {}: {}", path.display(), e))
            })?;
        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync owner {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "Created owner record");
        Ok(())
    }

    /// Stream `reader` into `path` until EOF and return the number of bytes written.
    pub async fn write_stream<R>(&self, path: &Path, reader: &mut R) -> StorageResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let start = std::time::Instant::now();

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(reader, &mut file).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Payload received"
        );

        Ok(bytes_copied)
    }

    pub async fn read_owner_record(&self, path: &Path) -> StorageResult<String> {
        fs::read_to_string(path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read owner {}: {}", path.display(), e))
        })
    }
}

/// Move a file between stages. This is a plain rename: a failure (for example
/// because two stage roots sit on different devices) is returned, never retried
/// or replaced by a copy.
pub async fn move_file(from: &Path, to: &Path) -> StorageResult<()> {
    fs::rename(from, to)
        .await
        .map_err(|source| StorageError::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;

    tracing::debug!(from = %from.display(), to = %to.display(), "Moved");
    Ok(())
}

/// Remove a file, treating "already gone" as success. Returns whether a file was removed.
pub async fn remove_if_exists(path: &Path) -> StorageResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::DeleteFailed(format!(
            "Failed to delete {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Best-effort removal of every path, logging failures instead of returning them.
pub async fn discard_all(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = remove_if_exists(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to discard artifact");
        }
    }
}

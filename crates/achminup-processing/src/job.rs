use achminup_core::{AssetFormat, AssetKey};
use achminup_storage::{Stage, StagedPaths};
use std::path::PathBuf;

/// In-memory unit of background work for one uploaded asset.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    paths: StagedPaths,
}

impl ProcessingJob {
    pub fn new(paths: StagedPaths) -> Self {
        Self { paths }
    }

    pub fn key(&self) -> AssetKey {
        self.paths.key
    }

    pub fn format(&self) -> AssetFormat {
        self.paths.key.format
    }

    pub fn src(&self) -> PathBuf {
        self.paths.payload(Stage::Src)
    }

    pub fn dst(&self) -> PathBuf {
        self.paths.payload(Stage::Dst)
    }

    pub fn serve(&self) -> PathBuf {
        self.paths.payload(Stage::Serve)
    }

    /// The serve-stage owner record gating every promotion.
    pub fn owner(&self) -> PathBuf {
        self.paths.owner(Stage::Serve)
    }
}

//! Test fixtures shared by the processor tests.

use crate::error::ProcessingError;
use crate::job::ProcessingJob;
use crate::processor::ToolPaths;
use crate::tool::{ToolOutput, ToolRunner};
use achminup_core::{AssetFormat, AssetId, AssetKey, Identity, StageRoots};
use achminup_storage::{OwnershipRegistry, Stage, Stager};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;
use uuid::Uuid;

/// Stage roots in a temp dir with one claimed asset waiting in `src`.
pub struct Fixture {
    _dir: TempDir,
    pub registry: OwnershipRegistry,
    pub job: ProcessingJob,
}

impl Fixture {
    pub async fn new(format: AssetFormat) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(StageRoots::new(
            dir.path().join("download"),
            &dir.path().join("process"),
            dir.path().join("serve"),
        ));
        stager.ensure_layout().await.unwrap();

        let paths = stager.paths(AssetKey::new(format, AssetId::new(Uuid::new_v4())));
        stager
            .write_owner_record(&paths.owner(Stage::Serve), &Identity::new("alice"))
            .await
            .unwrap();
        std::fs::write(paths.payload(Stage::Src), b"bytes").unwrap();

        Self {
            _dir: dir,
            registry: OwnershipRegistry::default(),
            job: ProcessingJob::new(paths),
        }
    }

    pub fn tools(&self) -> ToolPaths {
        ToolPaths {
            transcoder: "avconv".to_string(),
            probe: "exiftool".to_string(),
        }
    }
}

/// Fake tools. The transcoder writes the name of its preset flag to the
/// output path so tests can tell which pass produced a file.
#[derive(Default)]
pub struct ScriptedRunner {
    probe_stdout: String,
    probe_fails: bool,
    failing: Vec<String>,
    removals: Vec<(String, PathBuf)>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn with_probe_stdout(stdout: &str) -> Self {
        Self {
            probe_stdout: stdout.to_string(),
            ..Self::default()
        }
    }

    pub fn failing_probe(mut self) -> Self {
        self.probe_fails = true;
        self
    }

    /// Transcoder runs whose arguments contain `marker` exit non-zero.
    pub fn failing_preset(mut self, marker: &str) -> Self {
        self.failing.push(marker.to_string());
        self
    }

    /// Remove `path` while the transcoder run containing `marker` is in flight.
    pub fn removing_during(mut self, marker: &str, path: PathBuf) -> Self {
        self.removals.push((marker.to_string(), path));
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ProcessingError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        if args.first().map(String::as_str) == Some("-Rotation") {
            if self.probe_fails {
                return Err(ProcessingError::ToolSpawn {
                    program: program.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
                });
            }
            return Ok(ToolOutput {
                success: true,
                status_code: Some(0),
                stdout: self.probe_stdout.clone(),
                combined: self.probe_stdout.clone(),
            });
        }

        for (marker, path) in &self.removals {
            if args.contains(marker) {
                let _ = std::fs::remove_file(path);
            }
        }

        if self.failing.iter().any(|marker| args.contains(marker)) {
            return Ok(ToolOutput {
                success: false,
                status_code: Some(1),
                stdout: String::new(),
                combined: "Conversion failed!\n".to_string(),
            });
        }

        let preset = if args.iter().any(|a| a == "-qscale") {
            "-qscale"
        } else {
            "ultrafast"
        };
        if let Some(dst) = args.last() {
            std::fs::write(dst, preset).unwrap();
        }
        Ok(ToolOutput {
            success: true,
            status_code: Some(0),
            stdout: String::new(),
            combined: format!("encoded with {}\n", preset),
        })
    }
}

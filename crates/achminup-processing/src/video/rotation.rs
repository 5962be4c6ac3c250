//! Rotation probe and compensation table.

use crate::log::JobLog;
use crate::tool::{command_line, ToolRunner};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static ROTATION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Rotation\s*:\s*(\d+)").ok());

/// Extract the rotation angle from probe output (`Rotation : 90`).
pub fn parse_rotation(output: &str) -> Option<u32> {
    let pattern = ROTATION_PATTERN.as_ref()?;
    let captures = pattern.captures(output)?;
    captures.get(1)?.as_str().parse::<u32>().ok()
}

/// Transcoder arguments undoing a recorded rotation. Angles outside
/// 0/90/180/270 get no compensation.
pub fn compensation_args(rotation: u32) -> Vec<String> {
    let filter = match rotation {
        90 => "transpose=1",
        180 => "vflip,hflip",
        270 => "transpose=3",
        _ => return Vec::new(),
    };
    vec!["-vf".to_string(), filter.to_string()]
}

/// Reads the rotation tag of a video with the metadata tool.
#[derive(Debug, Clone)]
pub struct RotationProbe {
    program: String,
}

impl RotationProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn args(src: &Path) -> Vec<String> {
        vec!["-Rotation".to_string(), src.to_string_lossy().into_owned()]
    }

    /// Probe `src`, falling back to 0 whenever the tool fails or prints no
    /// usable rotation.
    pub async fn probe(&self, runner: &dyn ToolRunner, src: &Path, log: &mut JobLog) -> u32 {
        let args = Self::args(src);
        log.line(format!("> {}", command_line(&self.program, &args)));

        let output = match runner.run(&self.program, &args).await {
            Ok(output) => output,
            Err(e) => {
                log.line(format!("Failed to extract rotation: {}", e));
                return 0;
            }
        };
        log.output(&output.combined);

        if !output.success {
            log.line(format!(
                "Failed to extract rotation: exit status {}",
                output.status()
            ));
            return 0;
        }

        match parse_rotation(&output.stdout) {
            Some(rotation) => {
                log.line(format!("Found rotation {}", rotation));
                rotation
            }
            None => {
                log.line("Did not find rotation");
                0
            }
        }
    }
}

use crate::error::ProcessingResult;
use crate::log::JobLog;
use crate::tool::{command_line, ToolOutput, ToolRunner};
use crate::video::rotation::compensation_args;
use std::path::Path;

/// Transcoder quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// Fast draft served while the final pass runs.
    Low,
    High,
}

impl Quality {
    pub fn preset_args(self) -> [&'static str; 2] {
        match self {
            Quality::Low => ["-preset", "ultrafast"],
            Quality::High => ["-qscale", "1"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Low => "low-quality",
            Quality::High => "high-quality",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transcoder {
    program: String,
}

impl Transcoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Audio is copied, video is always re-encoded to h264.
    pub fn args(src: &Path, dst: &Path, rotation: u32, quality: Quality) -> Vec<String> {
        let mut args = vec!["-i".to_string(), src.to_string_lossy().into_owned()];
        args.extend(
            ["-y", "-c:a", "copy", "-c:v", "h264", "-v", "warning"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.extend(compensation_args(rotation));
        args.extend(quality.preset_args().iter().map(|s| s.to_string()));
        args.push(dst.to_string_lossy().into_owned());
        args
    }

    /// Run one pass, recording the invocation and its output in `log`.
    pub async fn transcode(
        &self,
        runner: &dyn ToolRunner,
        src: &Path,
        dst: &Path,
        rotation: u32,
        quality: Quality,
        log: &mut JobLog,
    ) -> ProcessingResult<ToolOutput> {
        let args = Self::args(src, dst, rotation, quality);
        log.line(format!("> {}", command_line(&self.program, &args)));

        let output = runner.run(&self.program, &args).await?;
        log.output(&output.combined);
        Ok(output)
    }
}

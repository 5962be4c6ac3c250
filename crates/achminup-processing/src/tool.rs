//! External tool seam
//!
//! The transcoder and metadata probe are opaque executables. Processors reach
//! them only through [`ToolRunner`], so tests can script their behaviour.

use crate::error::ProcessingError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one external process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub status_code: Option<i32>,
    pub stdout: String,
    /// stdout followed by stderr
    pub combined: String,
}

impl ToolOutput {
    pub fn status(&self) -> String {
        match self.status_code {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }
}

#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args` to completion. Only a failure to start the
    /// process is an error; a non-zero exit is reported through [`ToolOutput`].
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ProcessingError>;
}

/// Runs tools as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ProcessingError> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ProcessingError::ToolSpawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let mut combined = stdout.clone();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ToolOutput {
            success: output.status.success(),
            status_code: output.status.code(),
            stdout,
            combined,
        })
    }
}

/// Render a command line for logs.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

//! Achminup command-line tools.
//!
//! `achminup-transcode` runs the same rotation-aware transcode the service
//! applies to uploaded videos, against a local file.

use achminup_core::constants::{DEFAULT_PROBE, DEFAULT_TRANSCODER};
use achminup_processing::{JobLog, ProcessRunner, Quality, RotationProbe, Transcoder};
use anyhow::bail;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "achminup-transcode")]
#[command(about = "Transcode a video, compensating for its recorded rotation")]
pub struct TranscodeArgs {
    /// Input file
    pub in_file: PathBuf,

    /// Output file
    pub out_file: PathBuf,

    #[arg(long, value_enum, default_value = "high")]
    pub quality: QualityArg,

    /// Transcoder executable
    #[arg(long, default_value = DEFAULT_TRANSCODER)]
    pub transcoder: String,

    /// Metadata probe executable
    #[arg(long, default_value = DEFAULT_PROBE)]
    pub probe: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    High,
    Low,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::High => Quality::High,
            QualityArg::Low => Quality::Low,
        }
    }
}

/// Probe and transcode `args.in_file`. The invocation log is printed to
/// stdout whether or not the transcoder succeeds.
pub async fn transcode(args: &TranscodeArgs) -> anyhow::Result<()> {
    let runner = ProcessRunner;
    let mut log = JobLog::new();

    let rotation = RotationProbe::new(&args.probe)
        .probe(&runner, &args.in_file, &mut log)
        .await;

    let result = Transcoder::new(&args.transcoder)
        .transcode(
            &runner,
            &args.in_file,
            &args.out_file,
            rotation,
            args.quality.into(),
            &mut log,
        )
        .await;

    println!("{}", log.render());

    let output = result?;
    if !output.success {
        bail!("{} exited with status {}", args.transcoder, output.status());
    }
    tracing::info!(out = %args.out_file.display(), rotation, "Transcoded");
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

use achminup_cli::{init_tracing, transcode, TranscodeArgs};
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = TranscodeArgs::parse();
    transcode(&args).await
}

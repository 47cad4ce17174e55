// Record a few seconds of audio to a file.
//
// Usage:
//   RUST_LOG=debug cargo run --example record_to_file -- --seconds 5 out.wav

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use lpcm_record::{record, RecordConfig};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Parser)]
struct Args {
    /// Output file for the captured audio.
    output: PathBuf,

    /// How long to record before stopping.
    #[arg(long, default_value_t = 5)]
    seconds: u64,

    /// Capture backend: arecord, rec, or sox.
    #[arg(long)]
    backend: Option<String>,

    /// Capture device identifier.
    #[arg(long)]
    device: Option<String>,

    /// Sample rate in Hz.
    #[arg(long, default_value_t = 16000)]
    sample_rate: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = RecordConfig {
        backend: args.backend,
        device: args.device,
        sample_rate: args.sample_rate,
        ..RecordConfig::default()
    };

    let mut session = record(config)?;
    info!("recording with `{}`", session.command().command_line());

    let mut out = File::create(&args.output)
        .await
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut written = 0usize;

    let stop_at = tokio::time::Instant::now() + Duration::from_secs(args.seconds);
    let mut stopped = false;

    loop {
        if !stopped && tokio::time::Instant::now() >= stop_at {
            session.stop()?;
            stopped = true;
        }

        let event = if stopped {
            // Drain whatever the pipe still buffered.
            session.stream()?.recv().await
        } else {
            let timed = tokio::time::timeout_at(stop_at, session.stream()?.recv()).await;
            match timed {
                Ok(event) => event,
                Err(_) => continue, // deadline hit; stop on the next pass
            }
        };

        match event {
            Some(Ok(chunk)) => {
                written += chunk.len();
                out.write_all(&chunk).await?;
            }
            Some(Err(e)) => {
                eprintln!("{e}");
                break;
            }
            None => break,
        }
    }

    info!("wrote {} bytes to {}", written, args.output.display());
    Ok(())
}

// Exercise pause/resume against a live capture process.
//
// Records for two seconds, pauses for two, resumes for two more, then
// stops and reports how many bytes arrived in each phase.

use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use lpcm_record::{record, RecordConfig};
use tokio::time::sleep;
use tracing::info;

async fn drain_for(session: &mut lpcm_record::RecordingSession, window: Duration) -> Result<usize> {
    let mut bytes = 0usize;
    let deadline = tokio::time::Instant::now() + window;

    loop {
        match tokio::time::timeout_at(deadline, session.stream()?.next()).await {
            Ok(Some(Ok(chunk))) => bytes += chunk.len(),
            Ok(Some(Err(e))) => {
                eprintln!("{e}");
                break;
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }

    Ok(bytes)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut session = record(RecordConfig::default())?;
    info!("recording with `{}`", session.command().command_line());

    let recorded = drain_for(&mut session, Duration::from_secs(2)).await?;
    info!("captured {} bytes while recording", recorded);

    session.pause()?;
    info!("paused: {}", session.is_paused()?);
    let while_paused = drain_for(&mut session, Duration::from_secs(2)).await?;
    info!("captured {} bytes while paused", while_paused);

    session.resume()?;
    info!("paused: {}", session.is_paused()?);
    let resumed = drain_for(&mut session, Duration::from_secs(2)).await?;
    info!("captured {} bytes after resuming", resumed);

    session.stop()?;
    let tail = drain_for(&mut session, Duration::from_secs(2)).await?;
    info!("drained {} buffered bytes after stop", tail);

    Ok(())
}

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::error::RecordError;

/// A chunk of raw audio bytes, exactly as the capture tool wrote them.
pub type AudioChunk = Vec<u8>;

/// Readable output stream of a recording session.
///
/// Yields raw audio bytes as the capture process writes them; the crate
/// relays them without decoding or transcoding. A non-zero process exit
/// arrives as an `Err` item. The stream ends once the process closes its
/// stdout: lazy, finite once stopped, not restartable.
#[derive(Debug)]
pub struct RecordStream {
    rx: mpsc::Receiver<Result<AudioChunk, RecordError>>,
}

impl RecordStream {
    pub(crate) fn new(rx: mpsc::Receiver<Result<AudioChunk, RecordError>>) -> Self {
        Self { rx }
    }

    /// Receive the next chunk or error event; `None` once the recording has
    /// ended.
    pub async fn recv(&mut self) -> Option<Result<AudioChunk, RecordError>> {
        self.rx.recv().await
    }
}

impl Stream for RecordStream {
    type Item = Result<AudioChunk, RecordError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

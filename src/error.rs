use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors raised by configuration handling and recording sessions.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The configuration named a backend with no registered command builder.
    #[error("unknown recording backend: {0}")]
    UnknownBackend(String),

    /// A lifecycle method was called on a session that was never started.
    #[error("recording not yet started")]
    NotStarted,

    /// The capture executable could not be spawned.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The capture process exited with a non-zero code.
    ///
    /// Delivered as an event on the session's output stream, not returned
    /// from a lifecycle call.
    #[error("{command} has exited with error code {code}.\n\nEnable debug logging with the environment variable RUST_LOG=debug.")]
    BackendExit { command: String, code: i32 },

    /// Suspend/continue signals are not available on this platform.
    #[error("process suspend/continue signals are not supported on this platform")]
    SignalUnsupported,

    /// A control signal could not be delivered to the capture process.
    #[error("failed to signal capture process: {0}")]
    Signal(#[source] io::Error),
}

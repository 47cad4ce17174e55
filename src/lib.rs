pub mod backend;
pub mod config;
pub mod error;
pub mod session;
pub mod stream;

pub use backend::{Backend, BackendCommand};
pub use config::RecordConfig;
pub use error::{RecordError, Result};
pub use session::{record, RecordingSession};
pub use stream::{AudioChunk, RecordStream};

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::Result;

/// Options for a recording session.
///
/// Every field has a default, so a caller only names what it wants to
/// change:
///
/// ```
/// use lpcm_record::RecordConfig;
///
/// let config = RecordConfig {
///     sample_rate: 44100,
///     device: Some("hw:1,0".to_string()),
///     ..RecordConfig::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Capture backend to invoke: "arecord", "rec", or "sox".
    pub backend: Option<String>,

    /// Legacy alias for `backend`, honored only when `backend` is unset.
    pub recorder: Option<String>,

    /// Sample rate in Hz, passed to the backend verbatim.
    pub sample_rate: u32,

    /// Channel count (1 = mono, 2 = stereo), passed to the backend verbatim.
    pub channels: u16,

    /// Accepted for compatibility; no backend currently uses it.
    pub compress: bool,

    /// Shared silence threshold in percent, used for both silence edges
    /// unless overridden.
    pub threshold: f64,

    /// "Sound starts" threshold, used verbatim in place of `threshold`.
    pub threshold_start: Option<String>,

    /// "Sound ends" threshold, used verbatim in place of `threshold`.
    pub threshold_end: Option<String>,

    /// Seconds of silence before auto-stop, e.g. "1.0".
    pub silence: String,

    /// End the recording once the input goes silent.
    pub end_on_silence: bool,

    /// Audio container/type flag value.
    pub audio_type: String,

    /// Capture device identifier; the backend's default device when unset.
    pub device: Option<String>,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            backend: None,
            recorder: None,
            sample_rate: 16000,
            channels: 1,
            compress: false,
            threshold: 0.5,
            threshold_start: None,
            threshold_end: None,
            silence: "1.0".to_string(),
            end_on_silence: false,
            audio_type: "wav".to_string(),
            device: None,
        }
    }
}

impl RecordConfig {
    /// Resolve the effective backend: `backend`, else the legacy `recorder`
    /// alias, else sox. Unknown names fail here, before anything is spawned.
    pub fn resolved_backend(&self) -> Result<Backend> {
        match self.backend.as_deref().or(self.recorder.as_deref()) {
            Some(name) => name.parse(),
            None => Ok(Backend::Sox),
        }
    }
}

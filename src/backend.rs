use std::fmt;
use std::str::FromStr;

use crate::config::RecordConfig;
use crate::error::RecordError;

/// Supported capture backends.
///
/// Command construction dispatches over these variants with an exhaustive
/// match, so a variant without a builder cannot slip through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// ALSA `arecord`.
    Arecord,
    /// SoX's `rec` shorthand.
    Rec,
    /// SoX invoked directly.
    Sox,
}

impl Backend {
    /// Executable name for this backend.
    pub fn program(&self) -> &'static str {
        match self {
            Backend::Arecord => "arecord",
            Backend::Rec => "rec",
            Backend::Sox => "sox",
        }
    }

    /// Build the invocation for this backend from `config`.
    ///
    /// Pure and deterministic; computed once per session. Flag values are
    /// taken from the configuration verbatim, with no range validation:
    /// out-of-range values are the capture tool's to reject.
    pub fn command(&self, config: &RecordConfig) -> BackendCommand {
        match self {
            Backend::Arecord => arecord_command(config),
            Backend::Rec => rec_command(config),
            Backend::Sox => sox_command(config),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for Backend {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arecord" => Ok(Backend::Arecord),
            "rec" => Ok(Backend::Rec),
            "sox" => Ok(Backend::Sox),
            other => Err(RecordError::UnknownBackend(other.to_string())),
        }
    }
}

/// A fully built backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    /// Executable name.
    pub program: &'static str,

    /// Ordered argument vector; the order is backend-specific and fixed.
    pub args: Vec<String>,

    /// Whether the invocation must run through a shell. Only sox sets this,
    /// and only when a device is quoted inside a composite flag.
    pub shell: bool,
}

impl BackendCommand {
    /// The invocation as a single command line, as handed to `sh -c` and as
    /// quoted in diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

fn arecord_command(config: &RecordConfig) -> BackendCommand {
    let mut args = vec![
        "-q".to_string(), // no progress output
        "-r".to_string(),
        config.sample_rate.to_string(),
        "-c".to_string(),
        config.channels.to_string(),
        "-t".to_string(),
        config.audio_type.clone(),
        "-f".to_string(),
        "S16_LE".to_string(), // 16-bit signed little-endian
        "-".to_string(),      // write to stdout
    ];

    // The device flag must come first or arecord rejects it.
    if let Some(device) = &config.device {
        args.insert(0, device.clone());
        args.insert(0, "-D".to_string());
    }

    BackendCommand {
        program: "arecord",
        args,
        shell: false,
    }
}

fn rec_command(config: &RecordConfig) -> BackendCommand {
    let mut args = vec![
        "-q".to_string(), // no progress output
        "-r".to_string(),
        config.sample_rate.to_string(),
        "-c".to_string(),
        config.channels.to_string(),
        "-e".to_string(),
        "signed-integer".to_string(),
        "-b".to_string(),
        "16".to_string(),
        "-t".to_string(),
        config.audio_type.clone(),
        "-".to_string(), // write to stdout
    ];

    // rec selects its input device through the environment, not a flag.
    if config.end_on_silence {
        args.extend(silence_clause(config));
    }

    BackendCommand {
        program: "rec",
        args,
        shell: false,
    }
}

fn sox_command(config: &RecordConfig) -> BackendCommand {
    let mut args = vec![
        "--no-show-progress".to_string(),
        "--rate".to_string(),
        config.sample_rate.to_string(),
        "--channels".to_string(),
        config.channels.to_string(),
        "--encoding".to_string(),
        "signed-integer".to_string(),
        "--bits".to_string(),
        "16".to_string(),
        "--type".to_string(),
        config.audio_type.clone(),
        "-".to_string(), // write to stdout
    ];

    // Exactly one input specifier: an explicit device as a composite quoted
    // token right before the three output arguments, or the default device
    // up front. The quoted form only survives a shell invocation.
    let shell = match &config.device {
        Some(device) => {
            let at = args.len() - 3;
            args.insert(at, format!("--type waveaudio \"{}\"", device));
            true
        }
        None => {
            args.insert(0, "--default-device".to_string());
            false
        }
    };

    // The silence effect comes after the output file in sox's grammar.
    if config.end_on_silence {
        args.extend(silence_clause(config));
    }

    BackendCommand {
        program: "sox",
        args,
        shell,
    }
}

/// Silence-based auto-stop clause: start edge over a near-zero window, then
/// end edge after the configured silence duration.
fn silence_clause(config: &RecordConfig) -> Vec<String> {
    let shared = format!("{}%", config.threshold);
    let start = config
        .threshold_start
        .clone()
        .unwrap_or_else(|| shared.clone());
    let end = config.threshold_end.clone().unwrap_or(shared);

    vec![
        "silence".to_string(),
        "1".to_string(),
        "0.1".to_string(),
        start,
        "1".to_string(),
        config.silence.clone(),
        end,
    ]
}

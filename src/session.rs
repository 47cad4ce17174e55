use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::backend::BackendCommand;
use crate::config::RecordConfig;
use crate::error::{RecordError, Result};
use crate::stream::{AudioChunk, RecordStream};

/// Chunks buffered in the stream channel before back-pressure reaches the
/// capture process's pipe.
const STREAM_CAPACITY: usize = 64;

const READ_BUF_SIZE: usize = 8 * 1024;

/// Start recording with `config` and return the running session.
///
/// Shorthand for [`RecordingSession::new`] followed by
/// [`RecordingSession::start`].
pub fn record(config: RecordConfig) -> Result<RecordingSession> {
    let mut session = RecordingSession::new(config)?;
    session.start()?;
    Ok(session)
}

/// One recording backed by one spawned capture process.
///
/// The session owns the process for its lifetime and keeps the process's
/// suspend state and the output stream's pause state in lockstep. Lifecycle
/// changes must go through the session's methods; the stream and the process
/// id are exposed for read access only.
#[derive(Debug)]
pub struct RecordingSession {
    config: RecordConfig,
    command: BackendCommand,
    pid: Option<u32>,
    stream: Option<RecordStream>,
    pause_gate: Option<watch::Sender<bool>>,
}

impl RecordingSession {
    /// Resolve the backend and build its invocation, without spawning
    /// anything. An unknown backend name fails here.
    pub fn new(config: RecordConfig) -> Result<Self> {
        let backend = config.resolved_backend()?;
        let command = backend.command(&config);

        Ok(Self {
            config,
            command,
            pid: None,
            stream: None,
            pause_gate: None,
        })
    }

    /// Spawn the capture process and wire up observation.
    ///
    /// The process starts producing audio immediately; consume it through
    /// [`stream`](Self::stream). Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.pid.is_some() {
            warn!("recording already started");
            return Ok(());
        }

        debug!(config = ?self.config, "starting recording");
        debug!("spawning `{}`", self.command.command_line());

        // A composite quoted device flag is only honored by a shell.
        let mut cmd = if self.command.shell {
            let mut shell = Command::new("sh");
            shell.arg("-c").arg(self.command.command_line());
            shell
        } else {
            let mut direct = Command::new(self.command.program);
            direct.args(&self.command.args);
            direct
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| RecordError::Spawn {
            program: self.command.program.to_string(),
            source,
        })?;

        self.pid = child.id();

        // Capture-tool chatter goes to the diagnostic sink, never to the
        // caller-visible stream.
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("stderr: {}", line);
                }
            });
        }

        let (pause_tx, pause_rx) = watch::channel(false);
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);

        tokio::spawn(relay(child, pause_rx, tx, self.command.command_line()));

        self.stream = Some(RecordStream::new(rx));
        self.pause_gate = Some(pause_tx);

        Ok(())
    }

    /// Terminate the capture process with the default termination signal.
    ///
    /// Chunks already delivered to the stream remain consumable; nothing
    /// beyond what the pipe buffered is drained.
    pub fn stop(&mut self) -> Result<()> {
        let pid = self.started_pid()?;
        signal::terminate(pid)?;
        debug!("stopped recording");
        Ok(())
    }

    /// Suspend the capture process and pause stream delivery.
    ///
    /// Both halves belong together: a suspended process with a live stream
    /// (or the reverse) is not a supported state.
    pub fn pause(&mut self) -> Result<()> {
        let pid = self.started_pid()?;
        let gate = self.pause_gate.as_ref().ok_or(RecordError::NotStarted)?;

        signal::suspend(pid)?;
        gate.send_replace(true);
        debug!("paused recording");
        Ok(())
    }

    /// Continue the capture process and resume stream delivery; the
    /// symmetric inverse of [`pause`](Self::pause).
    pub fn resume(&mut self) -> Result<()> {
        let pid = self.started_pid()?;
        let gate = self.pause_gate.as_ref().ok_or(RecordError::NotStarted)?;

        signal::resume(pid)?;
        gate.send_replace(false);
        debug!("resumed recording");
        Ok(())
    }

    /// Whether stream delivery is currently paused.
    ///
    /// Pause and resume keep the process's suspend state in lockstep with
    /// the stream, so this also reports whether the process is suspended.
    pub fn is_paused(&self) -> Result<bool> {
        let gate = self.pause_gate.as_ref().ok_or(RecordError::NotStarted)?;
        Ok(*gate.borrow())
    }

    /// The readable output stream of raw audio bytes.
    pub fn stream(&mut self) -> Result<&mut RecordStream> {
        self.stream.as_mut().ok_or(RecordError::NotStarted)
    }

    /// OS process id of the capture process, once started.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// The invocation this session runs.
    pub fn command(&self) -> &BackendCommand {
        &self.command
    }

    fn started_pid(&self) -> Result<u32> {
        self.pid.ok_or(RecordError::NotStarted)
    }
}

/// Relay the capture process's stdout into the stream channel and translate
/// its exit status into at most one error event.
///
/// Owns the child: reads until EOF (holding off while the pause gate is
/// closed), then reaps it. If the session and stream are gone the child is
/// killed rather than left writing into a full pipe.
async fn relay(
    mut child: Child,
    mut pause_rx: watch::Receiver<bool>,
    tx: mpsc::Sender<std::result::Result<AudioChunk, RecordError>>,
    command_line: String,
) {
    let mut abandoned = false;

    if let Some(mut stdout) = child.stdout.take() {
        let mut buf = vec![0u8; READ_BUF_SIZE];

        loop {
            let paused = *pause_rx.borrow();
            if paused && pause_rx.wait_for(|paused| !*paused).await.is_err() {
                // Gate dropped: the session is gone.
                abandoned = true;
                break;
            }

            match stdout.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    debug!("recording {} bytes", n);
                    if tx.send(Ok(buf[..n].to_vec())).await.is_err() {
                        abandoned = true;
                        break;
                    }
                }
                Err(e) => {
                    warn!("failed to read capture output: {}", e);
                    break;
                }
            }
        }
    }

    debug!("recording ended");

    if abandoned {
        let _ = child.start_kill();
    }

    match child.wait().await {
        Ok(status) => match status.code() {
            Some(code) if code != 0 => {
                debug!("capture process exited with code {}", code);
                let event = RecordError::BackendExit {
                    command: command_line,
                    code,
                };
                if tx.send(Err(event)).await.is_err() {
                    warn!("capture process failed with code {} but the stream is gone", code);
                }
            }
            Some(_) => {}
            // Killed by a signal, the expected outcome of stop().
            None => debug!("capture process terminated by signal"),
        },
        Err(e) => warn!("failed to reap capture process: {}", e),
    }
}

#[cfg(unix)]
mod signal {
    use crate::error::{RecordError, Result};

    pub fn terminate(pid: u32) -> Result<()> {
        deliver(pid, libc::SIGTERM)
    }

    pub fn suspend(pid: u32) -> Result<()> {
        deliver(pid, libc::SIGSTOP)
    }

    pub fn resume(pid: u32) -> Result<()> {
        deliver(pid, libc::SIGCONT)
    }

    fn deliver(pid: u32, signal: libc::c_int) -> Result<()> {
        // SAFETY: kill only touches the target's process-table entry.
        let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
        if rc == 0 {
            Ok(())
        } else {
            Err(RecordError::Signal(std::io::Error::last_os_error()))
        }
    }
}

#[cfg(not(unix))]
mod signal {
    use crate::error::{RecordError, Result};

    pub fn terminate(_pid: u32) -> Result<()> {
        Err(RecordError::SignalUnsupported)
    }

    pub fn suspend(_pid: u32) -> Result<()> {
        Err(RecordError::SignalUnsupported)
    }

    pub fn resume(_pid: u32) -> Result<()> {
        Err(RecordError::SignalUnsupported)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Session wired to an arbitrary command, sidestepping the closed
    /// backend set so exits and signals can be driven deterministically.
    fn stub_session(script: &str) -> RecordingSession {
        RecordingSession {
            config: RecordConfig::default(),
            command: BackendCommand {
                program: "sh",
                args: vec!["-c".to_string(), script.to_string()],
                shell: false,
            },
            pid: None,
            stream: None,
            pause_gate: None,
        }
    }

    #[tokio::test]
    async fn nonzero_exit_emits_exactly_one_error_event() {
        let mut session = stub_session("exit 2");
        session.start().unwrap();

        let mut events = Vec::new();
        while let Some(event) = session.stream().unwrap().recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), 1);
        let err = events[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            RecordError::BackendExit { code: 2, .. }
        ));
        assert!(err.to_string().contains("error code 2"));
    }

    #[tokio::test]
    async fn clean_exit_is_silent() {
        let mut session = stub_session("exit 0");
        session.start().unwrap();

        while let Some(event) = session.stream().unwrap().recv().await {
            assert!(event.is_ok(), "clean exit must not produce an error event");
        }
    }

    #[tokio::test]
    async fn stdout_bytes_are_relayed_verbatim() {
        let mut session = stub_session("printf 'raw audio bytes'");
        session.start().unwrap();

        let mut collected = Vec::new();
        while let Some(event) = session.stream().unwrap().recv().await {
            collected.extend(event.unwrap());
        }

        assert_eq!(collected, b"raw audio bytes");
    }

    #[tokio::test]
    async fn pause_and_resume_toggle_the_stream_state() {
        let mut session = stub_session("exec sleep 5");
        session.start().unwrap();

        assert!(!session.is_paused().unwrap());
        session.pause().unwrap();
        assert!(session.is_paused().unwrap());
        session.resume().unwrap();
        assert!(!session.is_paused().unwrap());

        session.stop().unwrap();
        while let Some(event) = session.stream().unwrap().recv().await {
            assert!(event.is_ok(), "stop() must not surface an error event");
        }
    }

    #[tokio::test]
    async fn stop_terminates_the_process_and_ends_the_stream() {
        let mut session = stub_session("exec sleep 30");
        session.start().unwrap();
        assert!(session.pid().is_some());

        session.stop().unwrap();

        // Stream end proves the process is gone; no data follows it.
        while session.stream().unwrap().recv().await.is_some() {}
    }
}

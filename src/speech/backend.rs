//! Speech synthesizer backends
//!
//! The synthesizer is an external, stateful engine: it accepts text, reports
//! whether it is currently speaking, and announces state changes as events.
//! [`CommandBackend`] drives a system synthesizer process such as
//! `espeak-ng` or `spd-say`.

use crate::{Result, SquawkError};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Synthesizer state as reported by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendState {
    /// Idle and able to accept text
    Ready,

    /// Currently playing an utterance
    Speaking,

    /// The last request could not be started
    Error,
}

impl BackendState {
    pub fn is_speaking(self) -> bool {
        self == BackendState::Speaking
    }

    pub fn is_ready(self) -> bool {
        self == BackendState::Ready
    }
}

/// Notification emitted by a backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    StateChanged(BackendState),
}

/// A text-to-speech engine
///
/// Implementations announce every state transition on the event sender they
/// were constructed with.
pub trait SpeechBackend: Send {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Current state
    fn state(&self) -> BackendState;

    /// Start speaking `text`; returns once playback has been handed off
    fn say(&mut self, text: &str) -> Result<()>;
}

/// Configuration for the system synthesizer backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Whether to use a synthesizer at all
    pub enabled: bool,

    /// Program name or path
    pub program: String,

    /// Extra arguments placed before the voice and the text
    pub args: Vec<String>,

    /// Flag used to select the voice
    pub voice_flag: String,

    /// Voice to force; status messages are always English
    pub voice: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "espeak-ng".to_string(),
            args: Vec::new(),
            voice_flag: "-v".to_string(),
            voice: Some("en-us".to_string()),
        }
    }
}

impl BackendConfig {
    /// Create a config for the given program with no voice selection
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            voice: None,
            ..Default::default()
        }
    }

    /// A config that never creates a backend
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Append an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the voice and the flag that selects it
    pub fn with_voice(mut self, flag: impl Into<String>, voice: impl Into<String>) -> Self {
        self.voice_flag = flag.into();
        self.voice = Some(voice.into());
        self
    }

    /// Full argument list placed before the text
    pub fn command_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(voice) = &self.voice {
            args.push(self.voice_flag.clone());
            args.push(voice.clone());
        }
        args
    }
}

/// Find `program` on `PATH`, or check it directly when it contains a path
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Backend that runs one synthesizer process per utterance
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
    state: Arc<Mutex<BackendState>>,
    events: Sender<BackendEvent>,
}

impl CommandBackend {
    /// Create a backend, failing if the synthesizer program cannot be found
    pub fn new(config: &BackendConfig, events: Sender<BackendEvent>) -> Result<Self> {
        if !config.enabled {
            return Err(SquawkError::BackendUnavailable(
                "speech output disabled".into(),
            ));
        }

        let program = resolve_program(&config.program).ok_or_else(|| {
            SquawkError::BackendUnavailable(format!("{} not found on PATH", config.program))
        })?;

        info!("Using speech synthesizer: {}", program.display());

        Ok(Self {
            program,
            args: config.command_args(),
            state: Arc::new(Mutex::new(BackendState::Ready)),
            events,
        })
    }

    fn set_state(state: &Mutex<BackendState>, events: &Sender<BackendEvent>, next: BackendState) {
        *state.lock() = next;
        if events.send(BackendEvent::StateChanged(next)).is_err() {
            debug!("No subscriber for backend state {:?}", next);
        }
    }
}

impl SpeechBackend for CommandBackend {
    fn name(&self) -> &str {
        "command"
    }

    fn state(&self) -> BackendState {
        *self.state.lock()
    }

    fn say(&mut self, text: &str) -> Result<()> {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                Self::set_state(&self.state, &self.events, BackendState::Error);
                return Err(SquawkError::BackendError(format!(
                    "Failed to start {}: {}",
                    self.program.display(),
                    e
                )));
            }
        };

        Self::set_state(&self.state, &self.events, BackendState::Speaking);

        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        thread::spawn(move || {
            match child.wait() {
                Ok(status) if !status.success() => {
                    warn!("Speech synthesizer exited with {}", status);
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to wait for speech synthesizer: {}", e),
            }
            // Ready even after a failure so queued messages keep flowing
            Self::set_state(&state, &events, BackendState::Ready);
        });

        Ok(())
    }
}

//! Speech dispatcher
//!
//! Turns raw status messages into speech: normalizes and translates the text,
//! then either hands it to the synthesizer straight away or parks it in the
//! pending queue until the synthesizer reports it is ready again.
//!
//! All methods are expected to be called from a single thread, interleaved
//! with the backend's state notifications.

use super::backend::{BackendState, SpeechBackend};
use super::normalize::normalize_text_for_speech;
use super::queue::{EnqueueOutcome, PendingQueue, DEFAULT_QUEUE_LIMIT};
use super::translate::Translator;
use crate::settings::MuteSource;
use tracing::{debug, info, warn};

/// Dispatcher behaviour switches
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatcherOptions {
    /// When false (tests, batch runs) nothing is ever spoken
    pub interactive: bool,

    /// See [`PendingQueue::new`]
    pub queue_limit: usize,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            interactive: true,
            queue_limit: DEFAULT_QUEUE_LIMIT,
        }
    }
}

/// What [`SpeechDispatcher::say`] did with a message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SayOutcome {
    /// No usable backend; the text went to the log instead
    Logged,

    /// Muted or non-interactive; dropped
    Suppressed,

    /// Handed to the backend for immediate playback
    Spoken,

    /// Waiting for the backend to become ready
    Queued,

    /// Same text already waiting; dropped
    Duplicate,

    /// Queued after dropping the oldest waiting message
    Evicted(String),
}

pub struct SpeechDispatcher {
    backend: Option<Box<dyn SpeechBackend>>,
    translator: Translator,
    mute: Box<dyn MuteSource>,
    interactive: bool,
    pending: PendingQueue,
    // Last state the backend announced, updated on every submit
    backend_state: BackendState,
}

impl SpeechDispatcher {
    /// Create a dispatcher
    ///
    /// With `backend` set to `None` the dispatcher only logs what it would
    /// have said.
    pub fn new(
        backend: Option<Box<dyn SpeechBackend>>,
        translator: Translator,
        mute: Box<dyn MuteSource>,
        options: DispatcherOptions,
    ) -> Self {
        match &backend {
            Some(backend) => info!("Speech dispatcher using {} backend", backend.name()),
            None => info!("Speech dispatcher running without a backend"),
        }

        let backend_state = backend
            .as_ref()
            .map(|backend| backend.state())
            .unwrap_or(BackendState::Ready);

        Self {
            backend,
            translator,
            mute,
            interactive: options.interactive,
            pending: PendingQueue::new(options.queue_limit),
            backend_state,
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Backend state as of the last notification handled
    pub fn backend_state(&self) -> BackendState {
        self.backend_state
    }

    /// Messages waiting for the backend
    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// Normalize and translate a raw message
    pub fn prepare(&self, raw: &str) -> String {
        let normalized = normalize_text_for_speech(raw);
        debug!("Status message normalized: {}", normalized);

        let translated = self.translator.translate(&normalized);
        debug!("Status message translated: {}", translated);

        translated
    }

    /// Speak a raw status message, queueing it if the backend is busy
    pub fn say(&mut self, raw: &str) -> SayOutcome {
        if self.backend.is_none() {
            info!("say: {}", raw);
            return SayOutcome::Logged;
        }

        if !self.interactive || self.mute.is_muted() {
            debug!("Speech suppressed: {}", raw);
            return SayOutcome::Suppressed;
        }

        let text = self.prepare(raw);

        // The backend may already be idle while its Ready notification is
        // still in flight; until that is handled the queue keeps priority.
        if !self.backend_state.is_speaking() {
            return self.submit(text);
        }

        match self.pending.push(text) {
            EnqueueOutcome::Queued => SayOutcome::Queued,
            EnqueueOutcome::Duplicate => SayOutcome::Duplicate,
            EnqueueOutcome::Evicted(oldest) => {
                debug!("Pending queue full, dropped: {}", oldest);
                SayOutcome::Evicted(oldest)
            }
        }
    }

    /// React to a backend state notification
    ///
    /// When the backend becomes ready the oldest pending message is spoken
    /// and returned.
    pub fn on_backend_state_changed(&mut self, state: BackendState) -> Option<String> {
        self.backend_state = state;
        if !state.is_ready() || self.backend.is_none() {
            return None;
        }

        let text = self.pending.pop()?;
        match self.submit(text.clone()) {
            SayOutcome::Spoken => Some(text),
            _ => None,
        }
    }

    fn submit(&mut self, text: String) -> SayOutcome {
        let Some(backend) = self.backend.as_mut() else {
            info!("say: {}", text);
            return SayOutcome::Logged;
        };

        match backend.say(&text) {
            Ok(()) => {
                self.backend_state = BackendState::Speaking;
                SayOutcome::Spoken
            }
            Err(e) => {
                warn!("{} backend failed: {}", backend.name(), e);
                if !e.is_recoverable() {
                    warn!("{}", e.user_message());
                    self.backend = None;
                    self.pending.clear();
                }
                info!("say: {}", text);
                SayOutcome::Logged
            }
        }
    }
}

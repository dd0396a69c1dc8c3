//! Speech service
//!
//! Runs the dispatcher on a single control thread. Status messages from the
//! telemetry layer and state notifications from the synthesizer arrive on
//! two channels and are handled one at a time, so the dispatcher never sees
//! concurrent calls.

use crate::integration::config::SquawkConfig;
use crate::settings::AudioSettings;
use crate::speech::backend::{BackendConfig, BackendEvent, CommandBackend, SpeechBackend};
use crate::speech::dispatcher::{SayOutcome, SpeechDispatcher};
use crate::{Result, SquawkError};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Commands accepted by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCommand {
    /// Speak a raw status message
    Say(String),

    /// Stop once every queued message has been handed to the backend
    Drain,

    /// Stop the service thread
    Shutdown,
}

/// Events emitted by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// A status message was processed
    Handled { message: String, outcome: SayOutcome },

    /// A queued message was handed to the backend
    Dequeued(String),

    /// The service thread has stopped
    Shutdown,
}

/// Handle for feeding the service from other threads
#[derive(Clone)]
pub struct SpeechHandle {
    command_tx: Sender<SpeechCommand>,
    event_rx: Receiver<SpeechEvent>,
    settings: AudioSettings,
}

impl SpeechHandle {
    /// Queue a status message for speech
    pub fn say(&self, message: impl Into<String>) -> Result<()> {
        self.send_command(SpeechCommand::Say(message.into()))
    }

    /// Ask the service thread to stop
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(SpeechCommand::Shutdown)
    }

    /// Ask the service thread to stop after the pending queue empties
    pub fn drain(&self) -> Result<()> {
        self.send_command(SpeechCommand::Drain)
    }

    pub fn send_command(&self, command: SpeechCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| SquawkError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Shared audio settings (mute flag)
    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    /// Try to receive an event from the service
    pub fn try_recv_event(&self) -> Option<SpeechEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SpeechEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// The speech service: dispatcher plus its inbound channels
pub struct SpeechService {
    dispatcher: SpeechDispatcher,
    command_rx: Receiver<SpeechCommand>,
    backend_rx: Receiver<BackendEvent>,
    // Keeps the backend channel connected when no backend holds a sender
    _backend_tx: Sender<BackendEvent>,
    event_tx: Sender<SpeechEvent>,
}

impl SpeechService {
    /// Create a service using the system synthesizer from `config`
    ///
    /// A synthesizer that cannot be found is not an error: the service falls
    /// back to logging messages as text.
    pub fn new(config: SquawkConfig, settings: AudioSettings) -> Result<(Self, SpeechHandle)> {
        Self::with_backend(config, settings, |backend_config, events| {
            match CommandBackend::new(backend_config, events) {
                Ok(backend) => Some(Box::new(backend) as Box<dyn SpeechBackend>),
                Err(e) => {
                    warn!("{}", e);
                    warn!("{}", e.user_message());
                    None
                }
            }
        })
    }

    /// Create a service with a backend built by `factory`
    ///
    /// The factory receives the backend configuration and the sender the
    /// backend must use for its state notifications. It is not called when
    /// the backend is disabled.
    pub fn with_backend<F>(
        config: SquawkConfig,
        settings: AudioSettings,
        factory: F,
    ) -> Result<(Self, SpeechHandle)>
    where
        F: FnOnce(&BackendConfig, Sender<BackendEvent>) -> Option<Box<dyn SpeechBackend>>,
    {
        config.validate()?;

        let (command_tx, command_rx) = bounded(config.channel_capacity);
        let (event_tx, event_rx) = bounded(config.channel_capacity);
        // Unbounded: backends notify from inside `say`, on the service thread
        let (backend_tx, backend_rx) = unbounded();

        let backend = if config.backend.enabled {
            factory(&config.backend, backend_tx.clone())
        } else {
            info!("Speech backend disabled by configuration");
            None
        };

        let dispatcher = SpeechDispatcher::new(
            backend,
            config.translator(),
            Box::new(settings.clone()),
            config.dispatcher_options(),
        );

        let handle = SpeechHandle {
            command_tx,
            event_rx,
            settings,
        };

        let service = Self {
            dispatcher,
            command_rx,
            backend_rx,
            _backend_tx: backend_tx,
            event_tx,
        };

        Ok((service, handle))
    }

    pub fn dispatcher(&self) -> &SpeechDispatcher {
        &self.dispatcher
    }

    /// Run the service on its own thread
    pub fn start(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    /// Process commands and backend notifications until shutdown
    pub fn run(mut self) {
        info!("Speech service started");
        let mut draining = false;

        loop {
            let running = select! {
                recv(self.command_rx) -> command => match command {
                    Ok(SpeechCommand::Say(message)) => {
                        debug!("Status message received: {}", message);
                        let outcome = self.dispatcher.say(&message);
                        self.emit(SpeechEvent::Handled { message, outcome });
                        true
                    }
                    Ok(SpeechCommand::Drain) => {
                        debug!("Draining {} pending messages", self.dispatcher.pending().len());
                        draining = true;
                        true
                    }
                    Ok(SpeechCommand::Shutdown) => {
                        info!("Speech service shutdown requested");
                        false
                    }
                    Err(_) => {
                        debug!("All speech handles dropped");
                        false
                    }
                },
                recv(self.backend_rx) -> event => {
                    if let Ok(BackendEvent::StateChanged(state)) = event {
                        debug!("Backend state changed: {:?}", state);
                        if let Some(text) = self.dispatcher.on_backend_state_changed(state) {
                            self.emit(SpeechEvent::Dequeued(text));
                        }
                    }
                    true
                }
            };

            if !running || (draining && self.dispatcher.pending().is_empty()) {
                break;
            }
        }

        if !self.dispatcher.pending().is_empty() {
            info!(
                "Speech service stopping with {} messages unspoken",
                self.dispatcher.pending().len()
            );
        }
        self.emit(SpeechEvent::Shutdown);
        info!("Speech service stopped");
    }

    fn emit(&self, event: SpeechEvent) {
        if let Err(TrySendError::Full(event)) = self.event_tx.try_send(event) {
            debug!("Event buffer full, dropping {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MuteSource;

    #[test]
    fn test_service_creation_without_backend() {
        let config = SquawkConfig::default().without_backend();
        let (service, handle) = SpeechService::new(config, AudioSettings::default()).unwrap();

        assert!(!service.dispatcher().has_backend());
        assert!(!handle.settings().is_muted());
    }

    #[test]
    fn test_factory_not_called_when_disabled() {
        let config = SquawkConfig::default().without_backend();
        let result = SpeechService::with_backend(config, AudioSettings::default(), |_, _| {
            panic!("factory called for a disabled backend")
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SquawkConfig::default().with_queue_limit(0);
        let result = SpeechService::new(config, AudioSettings::default());
        assert!(matches!(result, Err(SquawkError::ConfigError(_))));
    }

    #[test]
    fn test_missing_synthesizer_degrades() {
        let config = SquawkConfig::default()
            .with_backend(BackendConfig::new("squawk-no-such-synthesizer"));
        let (service, _handle) = SpeechService::new(config, AudioSettings::default()).unwrap();
        assert!(!service.dispatcher().has_backend());
    }

    #[test]
    fn test_run_logs_and_shuts_down() {
        let config = SquawkConfig::default().without_backend();
        let (service, handle) = SpeechService::new(config, AudioSettings::default()).unwrap();
        let thread = service.start();

        handle.say("armed").unwrap();
        handle.shutdown().unwrap();

        let timeout = Duration::from_secs(5);
        assert_eq!(
            handle.recv_event_timeout(timeout),
            Some(SpeechEvent::Handled {
                message: "armed".to_string(),
                outcome: SayOutcome::Logged,
            })
        );
        assert_eq!(handle.recv_event_timeout(timeout), Some(SpeechEvent::Shutdown));
        thread.join().unwrap();
    }
}

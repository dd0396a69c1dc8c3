pub mod integration;
pub mod settings;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SquawkError {
    #[error("Speech backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Speech backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for SquawkError {
    fn from(e: std::io::Error) -> Self {
        SquawkError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for SquawkError {
    fn from(e: serde_json::Error) -> Self {
        SquawkError::ConfigError(e.to_string())
    }
}

impl SquawkError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // No synthesizer means we stay in text-only mode for the whole run
            SquawkError::BackendUnavailable(_) => false,
            // A single failed utterance does not stop the next one
            SquawkError::BackendError(_) => true,
            SquawkError::ConfigError(_) => false,
            SquawkError::ChannelError(_) => false,
            SquawkError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            SquawkError::BackendUnavailable(_) => {
                "No speech synthesizer found. Messages will be logged as text.".to_string()
            }
            SquawkError::BackendError(_) => {
                "Speech playback failed. Message was logged as text.".to_string()
            }
            SquawkError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            SquawkError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            SquawkError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SquawkError>;

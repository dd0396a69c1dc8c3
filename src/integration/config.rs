//! Configuration for the speech service
//!
//! Provides centralized configuration for all components. Values can come
//! from a JSON file and are then overridden by command-line flags.

use crate::speech::backend::BackendConfig;
use crate::speech::dispatcher::DispatcherOptions;
use crate::speech::queue::DEFAULT_QUEUE_LIMIT;
use crate::speech::translate::{PhraseTable, Translator};
use crate::{Result, SquawkError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for the complete speech service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquawkConfig {
    /// Initial value of the "audio muted" setting
    pub muted: bool,

    /// Whether messages may be spoken at all (false for tests and batch runs)
    pub interactive: bool,

    /// Whether to apply the Spanish phrase rules
    pub translate: bool,

    /// Pending queue eviction threshold
    pub queue_limit: usize,

    /// Capacity of the command and event channels
    pub channel_capacity: usize,

    /// Extra flight mode translations, merged over the built-in ones
    pub mode_phrases: BTreeMap<String, String>,

    /// Synthesizer backend
    pub backend: BackendConfig,
}

impl Default for SquawkConfig {
    fn default() -> Self {
        Self {
            muted: false,
            interactive: true,
            translate: true,
            queue_limit: DEFAULT_QUEUE_LIMIT,
            channel_capacity: 100,
            mode_phrases: BTreeMap::new(),
            backend: BackendConfig::default(),
        }
    }
}

impl SquawkConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Start muted
    pub fn muted(mut self) -> Self {
        self.muted = true;
        self
    }

    /// Never speak (tests, batch runs)
    pub fn headless(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// Run without a synthesizer (text-only mode)
    pub fn without_backend(mut self) -> Self {
        self.backend.enabled = false;
        self
    }

    /// Speak normalized English text
    pub fn without_translation(mut self) -> Self {
        self.translate = false;
        self
    }

    pub fn with_queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = limit;
        self
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_mode_phrase(mut self, mode: impl Into<String>, phrase: impl Into<String>) -> Self {
        self.mode_phrases.insert(mode.into(), phrase.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.queue_limit == 0 {
            return Err(SquawkError::ConfigError(
                "queue_limit must be at least 1".to_string(),
            ));
        }

        if self.channel_capacity == 0 {
            return Err(SquawkError::ConfigError(
                "channel_capacity must be at least 1".to_string(),
            ));
        }

        if self.backend.enabled && self.backend.program.trim().is_empty() {
            return Err(SquawkError::ConfigError(
                "backend program is required when the backend is enabled".to_string(),
            ));
        }

        if let Some(mode) = self.mode_phrases.keys().find(|mode| mode.trim().is_empty()) {
            return Err(SquawkError::ConfigError(format!(
                "empty flight mode name in mode_phrases: {:?}",
                mode
            )));
        }

        Ok(())
    }

    /// Build the translator described by this configuration
    pub fn translator(&self) -> Translator {
        if !self.translate {
            return Translator::passthrough();
        }

        let mut phrases = PhraseTable::with_defaults();
        phrases.extend(self.mode_phrases.iter());
        Translator::new(phrases)
    }

    pub fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            interactive: self.interactive,
            queue_limit: self.queue_limit,
        }
    }
}

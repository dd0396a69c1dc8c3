//! Speech output for flight-telemetry status messages
//!
//! This module provides:
//! - Text normalization (abbreviations, numbers, units, durations)
//! - Fixed-phrase translation to Spanish
//! - A dispatcher that serializes messages against a stateful synthesizer

pub mod backend;
pub mod dispatcher;
pub mod normalize;
pub mod queue;
pub mod translate;

// Re-export commonly used types
pub use backend::{
    BackendConfig, BackendEvent, BackendState, CommandBackend, SpeechBackend,
};
pub use dispatcher::{DispatcherOptions, SayOutcome, SpeechDispatcher};
pub use normalize::{normalize_text_for_speech, PatternRule, ABBREVIATIONS};
pub use queue::{EnqueueOutcome, PendingQueue, DEFAULT_QUEUE_LIMIT};
pub use translate::{PhraseTable, Translator};

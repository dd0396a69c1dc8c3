//! Service layer
//!
//! Connects the telemetry message source, the audio settings and the speech
//! backend around a single dispatcher thread.

mod config;
mod service;

pub use config::SquawkConfig;
pub use service::{SpeechCommand, SpeechEvent, SpeechHandle, SpeechService};

//! Application audio settings shared with the speech dispatcher

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source of the "audio muted" setting, read on every message
pub trait MuteSource: Send {
    fn is_muted(&self) -> bool;
}

/// Shared, cloneable audio settings
///
/// Clones refer to the same flag, so a UI can mute speech while the
/// dispatcher runs on its own thread.
#[derive(Clone, Debug, Default)]
pub struct AudioSettings {
    muted: Arc<AtomicBool>,
}

impl AudioSettings {
    pub fn new(muted: bool) -> Self {
        Self {
            muted: Arc::new(AtomicBool::new(muted)),
        }
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    /// Flip the flag and return the new value
    pub fn toggle_muted(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::SeqCst)
    }
}

impl MuteSource for AudioSettings {
    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }
}

impl MuteSource for bool {
    fn is_muted(&self) -> bool {
        *self
    }
}

use std::time::{Duration, Instant};
use log::warn;

/// Error notifications allowed per second before suppression kicks in.
const MAX_ERRORS_PER_SECOND: u32 = 5;

/// Tracks error-notification state for a single session. Repeating the same
/// rejection back-to-back, or flooding rejections within one second, is
/// suppressed instead of echoed to the client.
pub struct ErrorThrottle {
    last_error: Option<String>,
    last_tick: Instant,
    errors_this_tick: u32,
}

impl ErrorThrottle {
    pub fn new() -> Self {
        Self {
            last_error: None,
            last_tick: Instant::now(),
            errors_this_tick: 0,
        }
    }

    /// Call before sending an error notification. Returns true if the error
    /// should actually be sent.
    pub fn should_send(&mut self, message: &str) -> bool {
        self.tick();
        if self.last_error.as_deref() == Some(message) {
            warn!("[Throttle] suppressed duplicate error '{message}'");
            return false;
        }
        self.errors_this_tick += 1;
        if self.errors_this_tick > MAX_ERRORS_PER_SECOND {
            warn!("[Throttle] suppressed error flood");
            return false;
        }
        self.last_error = Some(message.to_string());
        true
    }

    /// Call when the session performs a valid action, re-arming duplicate
    /// suppression.
    pub fn reset(&mut self) {
        self.last_error = None;
    }

    fn tick(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_secs(1) {
            self.last_tick = now;
            self.errors_this_tick = 0;
        }
    }
}

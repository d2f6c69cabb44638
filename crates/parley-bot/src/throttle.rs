use tokio::time::{Duration, Instant};

/// Time-based gate for in-place edits of a streaming reply
///
/// An edit is allowed once more than `delay` has passed since the previous
/// one (or since the throttle was created). A disabled throttle never
/// allows intermediate edits; only the final edit is issued.
#[derive(Debug)]
pub struct EditThrottle {
    delay: Duration,
    last_edit: Instant,
    enabled: bool,
}

impl EditThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_edit: Instant::now(),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    /// Returns true and restarts the clock if an edit is due
    pub fn ready(&mut self) -> bool {
        if !self.enabled || self.last_edit.elapsed() <= self.delay {
            return false;
        }
        self.last_edit = Instant::now();
        true
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

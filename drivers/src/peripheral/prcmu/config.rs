use core::time::Duration;

/// Engine tuning.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrcmuConfig {
    /// Polls of the "previous request consumed" flag before a submission
    /// gives up with `Busy`.
    pub busy_wait_bound: u32,
    /// Consecutive `Busy` submissions after which the coprocessor is
    /// declared dead.
    pub fatal_busy_streak: u32,
    /// Deadline for acquiring mailbox 0 when posting a message, and for
    /// deferred work.
    pub post_timeout: Duration,
}

impl PrcmuConfig {
    pub const fn new() -> Self {
        Self {
            busy_wait_bound: 100_000,
            fatal_busy_streak: 8,
            post_timeout: Duration::from_millis(10),
        }
    }

    pub const fn with_busy_wait_bound(mut self, bound: u32) -> Self {
        self.busy_wait_bound = bound;
        self
    }

    pub const fn with_fatal_busy_streak(mut self, streak: u32) -> Self {
        self.fatal_busy_streak = streak;
        self
    }

    pub const fn with_post_timeout(mut self, timeout: Duration) -> Self {
        self.post_timeout = timeout;
        self
    }
}

impl Default for PrcmuConfig {
    fn default() -> Self {
        Self::new()
    }
}

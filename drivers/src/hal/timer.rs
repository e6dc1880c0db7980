//! Timer Hardware Abstraction Layer.
//!
//! This module defines platform-independent traits for hardware timers.

/// Hardware timer trait.
///
/// A timer peripheral that can raise an interrupt after an interval.
pub trait Timer {
    /// Which timer or compare channel to use.
    type Handle: Copy + Clone;

    /// Error type for timer operations.
    type Error: core::fmt::Debug;

    /// Start a one-shot timer with the given interval.
    fn start(&mut self, handle: Self::Handle, interval_us: u32) -> Result<(), Self::Error>;

    /// Stop a timer. A stopped timer raises no further interrupts.
    fn stop(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;

    /// Clear a pending interrupt.
    fn clear_interrupt(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;

    /// Check if a timer has a pending interrupt.
    fn is_pending(&self, handle: Self::Handle) -> Result<bool, Self::Error>;
}

/// Extension trait for timers that support periodic mode.
pub trait PeriodicTimer: Timer {
    /// Start a timer that reloads itself and fires every `interval_us`.
    fn start_periodic(
        &mut self,
        handle: Self::Handle,
        interval_us: u32,
    ) -> Result<(), Self::Error>;
}

/// A free-running microsecond clock.
///
/// Deadlines in the mailbox engine are absolute values of `now_us()`.
pub trait CountingTimer {
    /// Read the counter, in microseconds. Never goes backwards.
    fn now_us(&self) -> u64;
}

//! Periodic kick of the coprocessor's A9 watchdog.
//!
//! While at least one user holds the kicker, a periodic timer fires and
//! the timer's interrupt handler calls [`WatchdogKicker::on_tick`], which
//! fires a kick on mailbox 4 without waiting for its ack.

use common::sync::IrqSpinLock;
use log::{debug, warn};

use super::Prcmu;
use super::error::CallError;
use super::messages::Request;
use crate::hal::mmio::RegisterBlock;
use crate::hal::timer::{CountingTimer, PeriodicTimer};

/// One second.
pub const DEFAULT_KICK_INTERVAL_US: u32 = 1_000_000;

struct KickerState<T: PeriodicTimer> {
    timer: T,
    handle: T::Handle,
    users: u32,
}

pub struct WatchdogKicker<T: PeriodicTimer> {
    state: IrqSpinLock<KickerState<T>>,
    interval_us: u32,
    watchdog_id: u8,
}

impl<T: PeriodicTimer> WatchdogKicker<T> {
    pub fn new(timer: T, handle: T::Handle, interval_us: u32, watchdog_id: u8) -> Self {
        Self {
            state: IrqSpinLock::new(KickerState {
                timer,
                handle,
                users: 0,
            }),
            interval_us,
            watchdog_id,
        }
    }

    pub fn interval_us(&self) -> u32 {
        self.interval_us
    }

    /// Register a user. The first one starts the timer.
    pub fn acquire(&self) -> Result<(), T::Error> {
        let mut state = self.state.lock();
        if state.users == 0 {
            let handle = state.handle;
            state.timer.start_periodic(handle, self.interval_us)?;
        }
        state.users += 1;
        Ok(())
    }

    /// Drop a user. The last one stops the timer; extra releases are
    /// ignored.
    pub fn release(&self) -> Result<(), T::Error> {
        let mut state = self.state.lock();
        match state.users {
            0 => return Ok(()),
            1 => {
                let handle = state.handle;
                state.timer.stop(handle)?;
            }
            _ => {}
        }
        state.users -= 1;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().users > 0
    }

    /// Timer interrupt entry point.
    ///
    /// Returns `Ok(true)` if a kick went out. A mailbox still busy with the
    /// previous kick skips this tick.
    pub fn on_tick<R: RegisterBlock, C: CountingTimer>(
        &self,
        prcmu: &Prcmu<R, C>,
    ) -> Result<bool, CallError> {
        {
            let mut state = self.state.lock();
            let handle = state.handle;
            if let Err(err) = state.timer.clear_interrupt(handle) {
                warn!("prcmu: watchdog timer clear failed: {err:?}");
            }
            if state.users == 0 {
                return Ok(false);
            }
        }

        match prcmu.request_nowait(&Request::WatchdogKick {
            id: self.watchdog_id,
        }) {
            Ok(()) => Ok(true),
            Err(CallError::Busy) => {
                debug!("prcmu: watchdog {} kick skipped, mailbox busy", self.watchdog_id);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

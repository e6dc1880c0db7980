//! Wakeup-source aggregation.
//!
//! Independent subsystems each ask for the sources they care about; the
//! coprocessor only ever sees the union, and only when it changed.

use log::debug;

use super::Prcmu;
use super::dispatch::DeferredWork;
use super::error::CallError;
use super::messages::{Request, WakeupSources};
use crate::hal::mmio::RegisterBlock;
use crate::hal::timer::CountingTimer;

pub(crate) struct WakeupAggregate {
    requested: WakeupSources,
    /// What the coprocessor was last told. It boots with nothing enabled.
    transmitted: WakeupSources,
}

impl WakeupAggregate {
    pub const fn new() -> Self {
        Self {
            requested: WakeupSources::empty(),
            transmitted: WakeupSources::empty(),
        }
    }

    fn update(&mut self, requested: WakeupSources) -> bool {
        self.requested = requested;
        self.requested != self.transmitted
    }
}

impl<R: RegisterBlock, C: CountingTimer> Prcmu<R, C> {
    /// Add `sources` to the aggregate.
    ///
    /// Returns `true` when a configuration write is now pending; it goes
    /// out on the next [`run_deferred`](Self::run_deferred) or
    /// [`flush_wakeups`](Self::flush_wakeups).
    pub fn enable_wakeup_source(&self, sources: WakeupSources) -> bool {
        let mut aggregate = self.wakeups.lock();
        let requested = aggregate.requested | sources;
        self.reconfigure(aggregate.update(requested))
    }

    /// Remove `sources` from the aggregate. See
    /// [`enable_wakeup_source`](Self::enable_wakeup_source).
    pub fn disable_wakeup_source(&self, sources: WakeupSources) -> bool {
        let mut aggregate = self.wakeups.lock();
        let requested = aggregate.requested - sources;
        self.reconfigure(aggregate.update(requested))
    }

    fn reconfigure(&self, changed: bool) -> bool {
        if changed {
            self.schedule(DeferredWork::FLUSH_WAKEUPS);
        }
        changed
    }

    /// Transmit the aggregate if it differs from the last transmission.
    ///
    /// Returns whether anything was sent. The aggregate stays locked until
    /// the write is out, so concurrent changes land in the next flush.
    pub fn flush_wakeups(&self) -> Result<bool, CallError> {
        let mut aggregate = self.wakeups.lock();
        let sources = aggregate.requested;
        if sources == aggregate.transmitted {
            debug!("prcmu: wakeup sources unchanged ({:#010x})", sources.bits());
            return Ok(false);
        }

        let request = Request::ConfigWakeups {
            sleep: false,
            sources,
        };
        self.request(&request, self.config.post_timeout)?;
        aggregate.transmitted = sources;
        Ok(true)
    }

    /// Sources currently requested by all subsystems together.
    pub fn wakeup_sources(&self) -> WakeupSources {
        self.wakeups.lock().requested
    }
}

//! Hardware Driver Subsystem
//!
//! This module provides a layered architecture for hardware abstraction:
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions
//! - [`peripheral`]: Peripheral drivers built on those traits
//!
//! # Design Principles
//!
//! 1. **Separation of Concerns**: drivers never touch an address directly,
//!    only a [`RegisterBlock`]
//! 2. **Zero-Cost Abstractions**: HAL traits compile to direct hardware access
//! 3. **Testability**: every driver runs against RAM-backed windows on the host
//!
//! # Usage Example
//!
//! ```no_run
//! use core::time::Duration;
//! use drivers::hal::mmio::RamRegion;
//! use drivers::peripheral::prcmu::{Prcmu, PrcmuConfig, WakeupSources};
//! # use drivers::hal::timer::CountingTimer;
//! # struct Clock;
//! # impl CountingTimer for Clock { fn now_us(&self) -> u64 { 0 } }
//!
//! let regs = RamRegion::new(0x498);
//! let tcdm = RamRegion::new(0x548);
//! let prcmu = Prcmu::new(regs, tcdm, Clock, PrcmuConfig::default());
//!
//! prcmu.enable_wakeup_source(WakeupSources::RTC | WakeupSources::USB);
//! prcmu.run_deferred()?;
//! # Ok::<(), drivers::peripheral::prcmu::CallError>(())
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod hal;
pub mod peripheral;

// Re-export commonly used types
pub use hal::mmio::{Mmio, RamRegion, RegisterBlock};
pub use hal::timer::{CountingTimer, PeriodicTimer, Timer};
pub use peripheral::prcmu::{CallError, Prcmu, PrcmuConfig};

//! Peripheral Drivers
//!
//! Drivers for devices that sit behind a [`RegisterBlock`] window and can
//! be instantiated on any platform that maps them.
//!
//! # Available Peripherals
//!
//! - [`prcmu`]: Power/clock management coprocessor mailboxes
//!
//! [`RegisterBlock`]: crate::hal::mmio::RegisterBlock

pub mod prcmu;

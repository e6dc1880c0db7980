//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! The mailbox engine never touches an address directly. It talks to
//! register windows through [`mmio::RegisterBlock`] and reads time through
//! [`timer::CountingTimer`], so the same engine runs against real MMIO on
//! the SoC and against RAM-backed windows in a host simulation.
//!
//! # Available Interfaces
//!
//! - [`mmio`]: Byte/word access to a memory-mapped window
//! - [`timer`]: Hardware timers and free-running clocks

pub mod mmio;
pub mod timer;

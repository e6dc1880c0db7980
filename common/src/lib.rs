//! Architecture glue and synchronization primitives shared by the driver
//! crates.
//!
//! Everything here is usable from both thread and interrupt context and
//! compiles without `std`.

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod sync;

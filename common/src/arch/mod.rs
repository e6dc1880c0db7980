//! Per-target CPU interrupt masking.
//!
//! `CpuIrq` is the [`IrqControl`](crate::sync::irq::IrqControl)
//! implementation for the target being built. Bare-metal ARM masks IRQs
//! through the CPSR; hosted builds (simulation, tests) have nothing to mask.

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "arm", target_os = "none"))] {
        pub mod arm;
        pub use arm::irq::ArmIrq as CpuIrq;
    } else {
        pub mod host;
        pub use host::HostIrq as CpuIrq;
    }
}

use core::fmt::Debug;

/// CPU interrupt masking, implemented once per architecture.
///
/// See [`crate::arch::CpuIrq`] for the implementation selected for the
/// current target.
pub trait IrqControl {
    /// Whatever must be remembered to undo a `disable()`.
    type State: Copy + Debug;

    /// Mask interrupts on the current CPU and return the previous state.
    fn disable() -> Self::State;

    /// Put the interrupt mask back the way `disable()` found it.
    fn restore(state: Self::State);
}

use crate::sync::irq::IrqControl;

/// Interrupt control for hosted builds.
///
/// The "interrupt handler" of a simulated device is an ordinary function
/// call on some thread, so there is no CPU mask to save or restore.
#[derive(Debug)]
pub struct HostIrq;

impl IrqControl for HostIrq {
    type State = ();

    #[inline(always)]
    fn disable() {}

    #[inline(always)]
    fn restore(_state: ()) {}
}

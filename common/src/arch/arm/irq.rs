use crate::sync::irq::IrqControl;

/// IRQ disable bit in the CPSR.
const CPSR_I: u32 = 1 << 7;

/// CPSR-based IRQ masking for ARMv6/v7 cores.
///
/// The saved state is whether IRQs were enabled before `disable()`, so
/// nested critical sections only re-enable on the outermost restore.
#[derive(Debug)]
pub struct ArmIrq;

impl IrqControl for ArmIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let cpsr: u32;
        unsafe {
            core::arch::asm!(
                "mrs {0}, cpsr",
                "cpsid i",
                out(reg) cpsr,
                options(nomem, nostack)
            );
        }
        cpsr & CPSR_I == 0
    }

    #[inline(always)]
    fn restore(was_enabled: bool) {
        if was_enabled {
            unsafe {
                core::arch::asm!("cpsie i", options(nomem, nostack));
            }
        }
    }
}

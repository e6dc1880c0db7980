pub mod irq;
pub mod irq_spinlock;
pub mod wait;

pub use irq_spinlock::{IrqSpinLock, IrqSpinLockGuard};
pub use wait::{Expired, wait_until};

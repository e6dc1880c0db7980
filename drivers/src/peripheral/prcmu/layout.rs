//! Register bank and shared-region (TCDM) layout.
//!
//! These offsets are the wire contract with the coprocessor firmware. They
//! change only together with the firmware.

use core::fmt;

/// Number of mailboxes. Doorbell bit `n` belongs to mailbox `n`.
pub const MAILBOX_COUNT: usize = 8;

/// Size of a request or response header in the shared region.
pub const HEADER_SIZE: usize = 8;

/// Largest payload any mailbox can carry.
pub const MAX_PAYLOAD: usize = 372;

/// Register bank offsets.
pub mod reg {
    /// Bit n set while mailbox n holds a request the coprocessor has not consumed.
    pub const MBOX_CPU_VAL: usize = 0x0FC;
    /// Write bit n to ring doorbell n.
    pub const MBOX_CPU_SET: usize = 0x100;
    /// Write bit n to clear pending coprocessor interrupt n.
    pub const ARM_IT1_CLR: usize = 0x48C;
    /// Bit n set while the coprocessor has raised mailbox n.
    pub const ARM_IT1_VAL: usize = 0x494;
    /// Size of the register window.
    pub const SPAN: usize = 0x498;
}

/// Byte offsets of the fields inside a request or response header.
///
/// ```text
/// request:  [service][command][  -   ][state][  -  ][  -  ][ len (LE) ]
/// response: [service][command][status][state][ nfy ][  -  ][ len (LE) ]
/// ```
pub mod field {
    pub const SERVICE: usize = 0;
    pub const COMMAND: usize = 1;
    pub const STATUS: usize = 2;
    pub const STATE: usize = 3;
    pub const NFY_STATE: usize = 4;
    pub const LENGTH: usize = 6;
}

/// Where one mailbox's slots live in the shared region.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MailboxLayout {
    pub request_header: usize,
    pub request_payload: usize,
    pub response_header: usize,
    pub response_payload: usize,
    /// Payload capacity of each direction.
    pub capacity: usize,
}

const fn slot(request_header: usize, capacity: usize) -> MailboxLayout {
    MailboxLayout {
        request_header,
        request_payload: request_header + HEADER_SIZE,
        response_header: request_header + HEADER_SIZE + capacity,
        response_payload: request_header + 2 * HEADER_SIZE + capacity,
        capacity,
    }
}

pub static TCDM_LAYOUT: [MailboxLayout; MAILBOX_COUNT] = [
    slot(0x000, 32),
    slot(0x050, 16),
    slot(0x080, 372),
    slot(0x378, 16),
    slot(0x3A8, 64),
    slot(0x438, 64),
    slot(0x4C8, 16),
    slot(0x4F8, 32),
];

/// Size of the shared region.
pub const TCDM_SPAN: usize = 0x548;

/// A validated mailbox number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MailboxId(pub(crate) u8);

impl MailboxId {
    /// Power-state transitions and wakeup configuration.
    pub const POWER: MailboxId = MailboxId(0);
    pub const DVFS: MailboxId = MailboxId(1);
    pub const REGULATOR: MailboxId = MailboxId(2);
    pub const CLOCK: MailboxId = MailboxId(3);
    /// Memory, thermal and A9 watchdog.
    pub const THERMAL: MailboxId = MailboxId(4);
    pub const I2C: MailboxId = MailboxId(5);
    pub const USB: MailboxId = MailboxId(6);
    pub const MODEM: MailboxId = MailboxId(7);

    pub const fn new(id: u8) -> Option<Self> {
        if (id as usize) < MAILBOX_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Doorbell / interrupt bit of this mailbox.
    pub const fn bit(self) -> u32 {
        1 << self.0
    }

    pub fn layout(self) -> &'static MailboxLayout {
        &TCDM_LAYOUT[self.index()]
    }

    pub fn all() -> impl Iterator<Item = MailboxId> {
        (0..MAILBOX_COUNT as u8).map(MailboxId)
    }
}

impl From<MailboxId> for u8 {
    fn from(id: MailboxId) -> u8 {
        id.0
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mb{}", self.0)
    }
}

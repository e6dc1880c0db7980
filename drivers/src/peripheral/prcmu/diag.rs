//! State dump for when the coprocessor stops answering.

use alloc::vec::Vec;
use core::fmt;

use super::Prcmu;
use super::layout::MailboxId;
use super::mailbox::MailboxState;
use super::transport::{RequestHeader, ResponseHeader};
use crate::hal::mmio::RegisterBlock;
use crate::hal::timer::CountingTimer;

/// One mailbox as seen by [`Prcmu::snapshot`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MailboxSnapshot {
    pub id: MailboxId,
    /// Logical state kept by the driver.
    pub state: MailboxState,
    /// A caller is blocked on this mailbox.
    pub waiter: bool,
    /// Request header as last written.
    pub request: RequestHeader,
    /// Response header as the coprocessor left it.
    pub response: ResponseHeader,
}

/// Register bank and every mailbox, read at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Doorbells the coprocessor has not consumed.
    pub doorbells: u32,
    /// Mailboxes the coprocessor has raised.
    pub pending_interrupts: u32,
    pub faulted: bool,
    /// Indexed by mailbox id.
    pub mailboxes: Vec<MailboxSnapshot>,
}

impl<R: RegisterBlock, C: CountingTimer> Prcmu<R, C> {
    /// Read the register bank and every mailbox's headers.
    pub fn snapshot(&self) -> Snapshot {
        let mailboxes = self
            .mailboxes
            .iter()
            .map(|mailbox| {
                let id = mailbox.id();
                MailboxSnapshot {
                    id,
                    state: mailbox.state(),
                    waiter: mailbox.has_waiter(),
                    request: self.transport.read_request_header(id),
                    response: self.transport.read_response_header(id),
                }
            })
            .collect();
        Snapshot {
            doorbells: self.transport.doorbells(),
            pending_interrupts: self.transport.pending_interrupts(),
            faulted: self.transport.is_faulted(),
            mailboxes,
        }
    }
}

impl fmt::Display for MailboxSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (req, rsp) = (&self.request, &self.response);
        write!(
            f,
            "{} {:?}{} req {:02x}/{:02x} st {} len {}",
            self.id,
            self.state,
            if self.waiter { " (waiter)" } else { "" },
            req.service_id,
            req.command_id,
            req.state,
            req.len,
        )?;
        write!(
            f,
            " | rsp {:02x}/{:02x} status {:02x} st {} nfy {} len {}",
            rsp.service_id, rsp.command_id, rsp.status, rsp.state, rsp.nfy_state, rsp.len,
        )
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "prcmu snapshot: doorbells {:#04x} it1 {:#04x}{}",
            self.doorbells,
            self.pending_interrupts,
            if self.faulted { " FAULTED" } else { "" }
        )?;
        for mailbox in &self.mailboxes {
            writeln!(f, "  {mailbox}")?;
        }
        Ok(())
    }
}

//! Interrupt fast path and the deferred work it hands off.

use core::sync::atomic::Ordering;

use bitflags::bitflags;
use log::{debug, warn};

use super::error::CallError;
use super::layout::{MAX_PAYLOAD, MailboxId};
use super::mailbox::{MailboxState, NotifyState};
use super::messages::Request;
use super::protocol::{Direction, Message};
use super::transport::ResponseHeader;
use super::{Notification, Prcmu};
use crate::hal::mmio::RegisterBlock;
use crate::hal::timer::CountingTimer;

bitflags! {
    /// Follow-up work the dispatcher may not do in interrupt context.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
    pub struct DeferredWork: u8 {
        /// Acknowledge a wakeup notification (read-wakeup-ack on mailbox 0).
        const WAKEUP_ACK = 1 << 0;
        /// Transmit the aggregated wakeup configuration.
        const FLUSH_WAKEUPS = 1 << 1;
    }
}

const MAILBOX_MASK: u32 = (1 << super::MAILBOX_COUNT) - 1;

/// What one pass of [`Prcmu::handle_irq`] did.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct IrqStatus {
    /// Mailbox bits handled and cleared.
    pub handled: u8,
    /// Work this pass scheduled. Non-empty means the worker should call
    /// [`Prcmu::run_deferred`].
    pub deferred: DeferredWork,
}

impl<R: RegisterBlock, C: CountingTimer> Prcmu<R, C> {
    /// Service the coprocessor interrupt.
    ///
    /// Reads the pending mask once, handles every raised mailbox and then
    /// clears exactly those bits. Never blocks.
    pub fn handle_irq(&self) -> IrqStatus {
        let pending = self.transport.pending_interrupts() & MAILBOX_MASK;
        let mut deferred = DeferredWork::empty();
        for id in MailboxId::all().filter(|id| pending & id.bit() != 0) {
            deferred |= self.handle_mailbox(id);
        }
        if pending != 0 {
            self.transport.clear_interrupts(pending);
        }
        self.schedule(deferred);
        IrqStatus {
            handled: pending as u8,
            deferred,
        }
    }

    fn handle_mailbox(&self, id: MailboxId) -> DeferredWork {
        let header = self.transport.read_response_header(id);
        let state = MailboxState::try_from(header.state);
        let nfy = NotifyState::try_from(header.nfy_state);

        match (state, nfy) {
            (Ok(MailboxState::AckSent), _) => self.complete_ack(id, &header),
            (_, Ok(NotifyState::Sent)) => return self.deliver_notification(id, &header),
            (Ok(MailboxState::Executing), _) => self.mailboxes.get(id).observe_executing(),
            (Ok(_), Ok(NotifyState::Idle)) => debug!("prcmu: {id} raised with nothing to do"),
            _ => warn!(
                "prcmu: {id} unknown message: state {:#04x} nfy_state {:#04x}",
                header.state, header.nfy_state
            ),
        }
        DeferredWork::empty()
    }

    /// Hand an ack to its waiter. A known message that is not what the
    /// caller sent is left for the caller's echo check to reject.
    fn complete_ack(&self, id: MailboxId, header: &ResponseHeader) {
        let outcome = match Message::lookup(id, header.service_id, header.command_id) {
            Some(_) => self.transport.read_ack(id, header).ok_or_else(|| {
                warn!("prcmu: {id} ack claims {} payload bytes", header.len);
                CallError::ProtocolMismatch
            }),
            None => {
                warn!(
                    "prcmu: {id} unknown message: ack {:#04x}/{:#04x}",
                    header.service_id, header.command_id
                );
                Err(CallError::UnknownMessage)
            }
        };

        // Take the waiter before the mailbox goes Idle, so a new request
        // can never be handed this ack.
        let mailbox = self.mailboxes.get(id);
        let waiter = mailbox.take_pending();
        self.transport.release_ack(id);
        mailbox.set_state(MailboxState::Idle);

        match waiter {
            Some(completion) => completion.complete(outcome),
            None => debug!(
                "prcmu: {id} discarded ack {:#04x}/{:#04x} with no waiter",
                header.service_id, header.command_id
            ),
        }
    }

    fn deliver_notification(&self, id: MailboxId, header: &ResponseHeader) -> DeferredWork {
        let mut data = [0u8; MAX_PAYLOAD];
        let mut deferred = DeferredWork::empty();
        let message = Message::lookup(id, header.service_id, header.command_id);
        let len = self.transport.read_response_payload(id, header, &mut data);

        match (message, len) {
            (None, _) => warn!(
                "prcmu: {id} unknown message: notification {:#04x}/{:#04x}",
                header.service_id, header.command_id
            ),
            (Some(message), Some(len)) if message.direction() == Direction::Notify => {
                let notification = Notification {
                    mailbox: id,
                    message,
                    service_id: header.service_id,
                    command_id: header.command_id,
                    payload: &data[..len],
                };
                for subscriber in self
                    .subscribers
                    .lock()
                    .iter()
                    .filter(|s| s.service_id == header.service_id)
                {
                    (subscriber.handler)(&notification);
                }
                if matches!(message, Message::WakeupExec | Message::WakeupSleep) {
                    deferred |= DeferredWork::WAKEUP_ACK;
                }
            }
            (Some(message), _) => warn!(
                "prcmu: {id} malformed notification: {message:?} len {}",
                header.len
            ),
        }
        self.transport.release_notification(id);
        deferred
    }

    pub(crate) fn schedule(&self, work: DeferredWork) {
        if !work.is_empty() {
            self.deferred.fetch_or(work.bits(), Ordering::AcqRel);
        }
    }

    /// Work scheduled but not yet run.
    pub fn pending_work(&self) -> DeferredWork {
        DeferredWork::from_bits_truncate(self.deferred.load(Ordering::Acquire))
    }

    /// Run deferred work. Call from thread context after
    /// [`handle_irq`](Self::handle_irq) or a wakeup-source change.
    ///
    /// Work that fails stays scheduled; the first error is returned.
    pub fn run_deferred(&self) -> Result<DeferredWork, CallError> {
        let work = DeferredWork::from_bits_truncate(self.deferred.swap(0, Ordering::AcqRel));
        let mut done = DeferredWork::empty();
        let mut first_error = None;

        if work.contains(DeferredWork::WAKEUP_ACK) {
            match self.request(&Request::ReadWakeupAck, self.config.post_timeout) {
                Ok(_) => done |= DeferredWork::WAKEUP_ACK,
                Err(err) => {
                    self.schedule(DeferredWork::WAKEUP_ACK);
                    first_error.get_or_insert(err);
                }
            }
        }
        if work.contains(DeferredWork::FLUSH_WAKEUPS) {
            match self.flush_wakeups() {
                Ok(_) => done |= DeferredWork::FLUSH_WAKEUPS,
                Err(err) => {
                    self.schedule(DeferredWork::FLUSH_WAKEUPS);
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(done),
        }
    }
}

//! Per-mailbox state machine and the caller/dispatcher rendezvous.
//!
//! ```text
//! Idle --caller rings--> RequestSent --fw--> Executing --fw--> AckSent --dispatcher--> Idle
//! ```
//!
//! A caller holds the mailbox's `caller` lock for the whole round trip, so
//! at most one request per mailbox is ever outstanding.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use common::sync::IrqSpinLock;
use spin::MutexGuard;

use super::error::CallError;
use super::layout::{MAILBOX_COUNT, MailboxId};
use super::transport::AckFrame;
use crate::hal::timer::CountingTimer;

/// Logical state of a mailbox. The same encoding is used for the state
/// byte of both headers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum MailboxState {
    /// No request outstanding; a caller may submit.
    Idle = 0,
    /// A request was written and its doorbell rung.
    RequestSent = 1,
    /// The coprocessor picked the request up.
    Executing = 2,
    /// The coprocessor left an acknowledgement in the response slot.
    AckSent = 3,
}

impl TryFrom<u8> for MailboxState {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, u8> {
        match raw {
            0 => Ok(MailboxState::Idle),
            1 => Ok(MailboxState::RequestSent),
            2 => Ok(MailboxState::Executing),
            3 => Ok(MailboxState::AckSent),
            other => Err(other),
        }
    }
}

/// Notification slot state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum NotifyState {
    /// Slot free for the coprocessor.
    Idle = 0,
    /// A notification is waiting to be consumed.
    Sent = 1,
}

impl TryFrom<u8> for NotifyState {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, u8> {
        match raw {
            0 => Ok(NotifyState::Idle),
            1 => Ok(NotifyState::Sent),
            other => Err(other),
        }
    }
}

type Outcome = Result<AckFrame, CallError>;

/// Where the dispatcher drops an acknowledgement for a waiting caller.
pub(crate) struct Completion {
    done: AtomicBool,
    outcome: IrqSpinLock<Option<Outcome>>,
}

impl Completion {
    fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            outcome: IrqSpinLock::new(None),
        }
    }

    pub fn complete(&self, outcome: Outcome) {
        *self.outcome.lock() = Some(outcome);
        self.done.store(true, Ordering::Release);
    }

    fn take(&self) -> Option<Outcome> {
        if self.done.load(Ordering::Acquire) {
            self.outcome.lock().take()
        } else {
            None
        }
    }
}

pub struct Mailbox {
    id: MailboxId,
    state: AtomicU8,
    caller: spin::Mutex<()>,
    pending: IrqSpinLock<Option<Arc<Completion>>>,
}

impl Mailbox {
    fn new(id: MailboxId) -> Self {
        Self {
            id,
            state: AtomicU8::new(MailboxState::Idle as u8),
            caller: spin::Mutex::new(()),
            pending: IrqSpinLock::new(None),
        }
    }

    pub fn id(&self) -> MailboxId {
        self.id
    }

    pub fn state(&self) -> MailboxState {
        MailboxState::try_from(self.state.load(Ordering::Acquire))
            .unwrap_or(MailboxState::Idle)
    }

    pub(crate) fn set_state(&self, state: MailboxState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Record that the firmware picked the request up.
    pub(crate) fn observe_executing(&self) {
        let _ = self.state.compare_exchange(
            MailboxState::RequestSent as u8,
            MailboxState::Executing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// `true` while a caller is attached waiting for the ack.
    pub fn has_waiter(&self) -> bool {
        self.pending.with(|slot| slot.is_some())
    }

    /// Take the caller lock, giving up at `deadline`.
    pub(crate) fn lock_until<C: CountingTimer>(
        &self,
        clock: &C,
        deadline: u64,
    ) -> Result<MutexGuard<'_, ()>, CallError> {
        loop {
            if let Some(guard) = self.caller.try_lock() {
                return Ok(guard);
            }
            if clock.now_us() >= deadline {
                return Err(CallError::Timeout);
            }
            core::hint::spin_loop();
        }
    }

    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, ()>> {
        self.caller.try_lock()
    }

    /// Wait for a late acknowledgement of an earlier, abandoned call to
    /// return the mailbox to `Idle`.
    pub(crate) fn wait_idle<C: CountingTimer>(
        &self,
        clock: &C,
        deadline: u64,
    ) -> Result<(), CallError> {
        loop {
            if self.state() == MailboxState::Idle {
                return Ok(());
            }
            if clock.now_us() >= deadline {
                return Err(CallError::Timeout);
            }
            core::hint::spin_loop();
        }
    }

    pub(crate) fn take_pending(&self) -> Option<Arc<Completion>> {
        self.pending.lock().take()
    }

    fn attach(&self, completion: Arc<Completion>) {
        let previous = self.pending.lock().replace(completion);
        debug_assert!(previous.is_none(), "two operations attached to {}", self.id);
    }

    fn detach(&self, completion: &Arc<Completion>) {
        let mut slot = self.pending.lock();
        if slot.as_ref().is_some_and(|c| Arc::ptr_eq(c, completion)) {
            *slot = None;
        }
    }
}

/// Owns every mailbox; built once when the engine starts.
pub struct MailboxManager {
    mailboxes: [Mailbox; MAILBOX_COUNT],
}

impl MailboxManager {
    pub fn new() -> Self {
        Self {
            mailboxes: core::array::from_fn(|i| Mailbox::new(MailboxId(i as u8))),
        }
    }

    /// The mailbox behind `id`.
    pub fn get(&self, id: MailboxId) -> &Mailbox {
        &self.mailboxes[id.index()]
    }

    /// Every mailbox, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Mailbox> {
        self.mailboxes.iter()
    }
}

impl Default for MailboxManager {
    fn default() -> Self {
        Self::new()
    }
}

/// One in-flight call, living on the caller's stack.
///
/// Dropping it detaches it from the mailbox; an acknowledgement that
/// arrives afterwards finds no waiter and is discarded.
pub(crate) struct PendingOperation<'a> {
    mailbox: &'a Mailbox,
    completion: Arc<Completion>,
}

impl<'a> PendingOperation<'a> {
    pub fn attach(mailbox: &'a Mailbox) -> Self {
        let completion = Arc::new(Completion::new());
        mailbox.attach(Arc::clone(&completion));
        Self {
            mailbox,
            completion,
        }
    }

    pub fn wait<C: CountingTimer>(&self, clock: &C, deadline: u64) -> Outcome {
        loop {
            if let Some(outcome) = self.completion.take() {
                return outcome;
            }
            if clock.now_us() >= deadline {
                self.mailbox.detach(&self.completion);
                // the dispatcher may have completed us just before the detach
                return self.completion.take().unwrap_or(Err(CallError::Timeout));
            }
            core::hint::spin_loop();
        }
    }
}

impl Drop for PendingOperation<'_> {
    fn drop(&mut self) {
        self.mailbox.detach(&self.completion);
    }
}

//! Power/clock management coprocessor (PRCMU) mailbox driver.
//!
//! The application processor talks to the coprocessor over eight
//! mailboxes carved out of a shared region (the TCDM). Each mailbox has a
//! request slot and a response slot; a doorbell register tells the
//! coprocessor a request is waiting, and an interrupt tells us an
//! acknowledgement or notification is.
//!
//! # Layers
//!
//! - [`transport`]: the only code that reads or writes the shared region
//!   and the register bank.
//! - [`mailbox`]: per-mailbox state, caller serialization and the
//!   caller/dispatcher rendezvous.
//! - [`Prcmu`]: the call engine (`call`, `call_nowait`, `post`, typed
//!   `request`), the interrupt dispatcher ([`Prcmu::handle_irq`]) and the
//!   deferred-work path ([`Prcmu::run_deferred`]).
//! - [`WatchdogKicker`]: keeps the coprocessor's A9 watchdog fed.
//!
//! # Example
//!
//! ```no_run
//! use core::time::Duration;
//! use drivers::hal::mmio::Mmio;
//! use drivers::peripheral::prcmu::{Prcmu, PrcmuConfig, Reply, Request};
//! # use drivers::hal::timer::CountingTimer;
//! # struct Clock;
//! # impl CountingTimer for Clock { fn now_us(&self) -> u64 { 0 } }
//!
//! let regs = unsafe { Mmio::new(0x8015_7000, 0x498) };
//! let tcdm = unsafe { Mmio::new(0x801b_0000, 0x548) };
//! let prcmu = Prcmu::new(regs, tcdm, Clock, PrcmuConfig::default());
//!
//! let reply = prcmu.request(&Request::GetTemp, Duration::from_millis(20));
//! if let Ok(Reply::Temperature(celsius)) = reply {
//!     log::info!("die at {celsius} C");
//! }
//! ```

mod config;
mod diag;
mod dispatch;
mod error;
pub mod layout;
pub mod mailbox;
mod messages;
pub mod protocol;
mod transport;
mod wakeup;
mod watchdog;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::AtomicU8;
use core::time::Duration;

use common::sync::IrqSpinLock;
use log::warn;

pub use config::PrcmuConfig;
pub use diag::{MailboxSnapshot, Snapshot};
pub use dispatch::{DeferredWork, IrqStatus};
pub use error::CallError;
pub use layout::{MAILBOX_COUNT, MAX_PAYLOAD, MailboxId};
pub use mailbox::{MailboxState, NotifyState};
pub use messages::{
    ApeOpp, ArmOpp, EpodState, Event, PowerState, REQUEST_SCRATCH, Reply, Request, WakeupSources,
};
pub use protocol::{Direction, Message};
pub use transport::{RequestHeader, ResponseHeader};
pub use watchdog::{DEFAULT_KICK_INTERVAL_US, WatchdogKicker};

use self::mailbox::{MailboxManager, PendingOperation};
use self::protocol::status;
use self::transport::{BusyVerdict, DoorbellWait, Transport};
use self::wakeup::WakeupAggregate;
use crate::hal::mmio::RegisterBlock;
use crate::hal::timer::CountingTimer;

/// A notification as handed to subscribers. Borrowed from the dispatcher's
/// stack; copy out whatever must outlive the callback.
#[derive(Debug, Copy, Clone)]
pub struct Notification<'a> {
    /// Mailbox the notification arrived on.
    pub mailbox: MailboxId,
    /// Catalog entry for the header.
    pub message: Message,
    pub service_id: u8,
    pub command_id: u8,
    /// Raw payload, exactly as long as the header claimed.
    pub payload: &'a [u8],
}

impl Notification<'_> {
    /// Decode the payload, if it is well formed for `message`.
    pub fn event(&self) -> Option<Event> {
        Event::decode(self.message, self.payload)
    }
}

type Handler = Box<dyn Fn(&Notification<'_>) + Send + Sync>;

struct Subscriber {
    service_id: u8,
    handler: Handler,
}

/// The mailbox call engine.
///
/// `regs` is the register bank (doorbells and interrupt status), `tcdm`
/// the shared region. Share it between threads behind an `Arc`; the
/// interrupt shim calls [`Prcmu::handle_irq`] and, when it reports deferred
/// work, a worker calls [`Prcmu::run_deferred`].
pub struct Prcmu<R: RegisterBlock, C: CountingTimer> {
    transport: Transport<R>,
    mailboxes: MailboxManager,
    clock: C,
    config: PrcmuConfig,
    subscribers: IrqSpinLock<Vec<Subscriber>>,
    deferred: AtomicU8,
    wakeups: spin::Mutex<WakeupAggregate>,
}

impl<R: RegisterBlock, C: CountingTimer> Prcmu<R, C> {
    /// Build the engine over the two windows. Every mailbox starts `Idle`
    /// and no wakeup source is enabled.
    pub fn new(regs: R, tcdm: R, clock: C, config: PrcmuConfig) -> Self {
        Self {
            transport: Transport::new(regs, tcdm, &config),
            mailboxes: MailboxManager::new(),
            clock,
            config,
            subscribers: IrqSpinLock::new(Vec::new()),
            deferred: AtomicU8::new(0),
            wakeups: spin::Mutex::new(WakeupAggregate::new()),
        }
    }

    /// Send a request and block until it is acknowledged or `timeout`
    /// elapses.
    ///
    /// Returns the ack's status byte and payload. The ack is guaranteed to
    /// echo `service_id`/`command_id`; anything else is
    /// [`CallError::ProtocolMismatch`]. `timeout` covers waiting for other
    /// callers of the same mailbox too.
    ///
    /// A call that times out cannot be withdrawn. Its ack, if it ever
    /// arrives, is discarded and the mailbox returns to `Idle`.
    pub fn call(
        &self,
        mailbox: u8,
        service_id: u8,
        command_id: u8,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(u8, Vec<u8>), CallError> {
        self.check_fault()?;
        let id = self.resolve(mailbox, service_id, command_id, payload, Direction::Call)?;
        let deadline = self.deadline(timeout);
        let mailbox = self.mailboxes.get(id);

        let _caller = mailbox.lock_until(&self.clock, deadline)?;
        mailbox.wait_idle(&self.clock, deadline)?;

        let op = PendingOperation::attach(mailbox);
        mailbox.set_state(MailboxState::RequestSent);
        if let Err(verdict) = self.transport.write_request(
            id,
            service_id,
            command_id,
            payload,
            DoorbellWait::Bounded,
        ) {
            mailbox.set_state(MailboxState::Idle);
            return Err(self.busy(verdict));
        }

        let frame = op.wait(&self.clock, deadline)?;
        if frame.service_id != service_id || frame.command_id != command_id {
            warn!(
                "prcmu: {id} protocol mismatch: sent {service_id:#04x}/{command_id:#04x}, \
                 acked {:#04x}/{:#04x}",
                frame.service_id, frame.command_id
            );
            return Err(CallError::ProtocolMismatch);
        }
        Ok((frame.status, frame.payload().to_vec()))
    }

    /// Send a request without waiting for its ack.
    ///
    /// Never blocks, so it is safe from interrupt context: fails with
    /// [`CallError::Busy`] if another caller holds the mailbox, an earlier
    /// request on it is still unanswered, or its doorbell is not clear at
    /// the first look. Such misses do not count towards the fault streak.
    /// The dispatcher still consumes the ack when it arrives.
    pub fn call_nowait(
        &self,
        mailbox: u8,
        service_id: u8,
        command_id: u8,
        payload: &[u8],
    ) -> Result<(), CallError> {
        self.check_fault()?;
        let id = self.resolve(mailbox, service_id, command_id, payload, Direction::Call)?;
        let mailbox = self.mailboxes.get(id);

        let _caller = mailbox.try_lock().ok_or(CallError::Busy)?;
        if mailbox.state() != MailboxState::Idle {
            return Err(CallError::Busy);
        }
        mailbox.set_state(MailboxState::RequestSent);
        self.transport
            .write_request(id, service_id, command_id, payload, DoorbellWait::Once)
            .map_err(|verdict| {
                mailbox.set_state(MailboxState::Idle);
                self.busy(verdict)
            })
    }

    /// Send a posted (mailbox 0) message. There is no per-call ack, so the
    /// mailbox never leaves `Idle`.
    ///
    /// Waiting for the mailbox lock is bounded by
    /// [`PrcmuConfig::post_timeout`].
    pub fn post(
        &self,
        mailbox: u8,
        service_id: u8,
        command_id: u8,
        payload: &[u8],
    ) -> Result<(), CallError> {
        self.post_within(mailbox, service_id, command_id, payload, self.config.post_timeout)
    }

    fn post_within(
        &self,
        mailbox: u8,
        service_id: u8,
        command_id: u8,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), CallError> {
        self.check_fault()?;
        let id = self.resolve(mailbox, service_id, command_id, payload, Direction::Posted)?;
        let deadline = self.deadline(timeout);
        let mailbox = self.mailboxes.get(id);

        let _caller = mailbox.lock_until(&self.clock, deadline)?;
        self.transport
            .write_request(id, service_id, command_id, payload, DoorbellWait::Bounded)
            .map_err(|verdict| self.busy(verdict))
    }

    /// Typed front end to [`call`](Self::call) and [`post`](Self::post).
    ///
    /// A non-zero ack status becomes [`CallError::Rejected`]. Posted
    /// requests reply [`Reply::Empty`] once transmitted; for them `timeout`
    /// bounds the wait for the mailbox lock.
    pub fn request(&self, request: &Request, timeout: Duration) -> Result<Reply, CallError> {
        let message = request.message();
        let mut scratch = [0u8; REQUEST_SCRATCH];
        let len = request.encode(&mut scratch);
        let (mailbox, service_id, command_id) = wire(message);

        match message.direction() {
            Direction::Call => {
                let (status, payload) =
                    self.call(mailbox, service_id, command_id, &scratch[..len], timeout)?;
                if status != status::SUCCESS {
                    return Err(CallError::Rejected(status));
                }
                Reply::decode(message, &payload)
            }
            Direction::Posted => {
                self.post_within(mailbox, service_id, command_id, &scratch[..len], timeout)?;
                Ok(Reply::Empty)
            }
            Direction::Notify => Err(CallError::InvalidRequest),
        }
    }

    /// Typed front end to [`call_nowait`](Self::call_nowait).
    pub fn request_nowait(&self, request: &Request) -> Result<(), CallError> {
        let message = request.message();
        let mut scratch = [0u8; REQUEST_SCRATCH];
        let len = request.encode(&mut scratch);
        let (mailbox, service_id, command_id) = wire(message);
        self.call_nowait(mailbox, service_id, command_id, &scratch[..len])
    }

    /// Ask the coprocessor to move the system to `state` at the next
    /// WFI. Completion is reported by a wakeup notification, not an ack.
    pub fn set_power_state(
        &self,
        state: PowerState,
        keep_ulp_clk: bool,
        keep_ap_pll: bool,
    ) -> Result<(), CallError> {
        let request = Request::PowerStateTransition {
            state,
            keep_ulp_clk,
            keep_ap_pll,
        };
        self.request(&request, self.config.post_timeout).map(|_| ())
    }

    /// Register `handler` for notifications of `service_id`.
    ///
    /// Handlers run in interrupt context with the subscriber list locked:
    /// they must be short and must not block or subscribe.
    pub fn subscribe(
        &self,
        service_id: u8,
        handler: impl Fn(&Notification<'_>) + Send + Sync + 'static,
    ) {
        self.subscribers.lock().push(Subscriber {
            service_id,
            handler: Box::new(handler),
        });
    }

    /// Logical state of `mailbox`, or `None` for an id out of range.
    pub fn mailbox_state(&self, mailbox: u8) -> Option<MailboxState> {
        MailboxId::new(mailbox).map(|id| self.mailboxes.get(id).state())
    }

    /// `true` once the coprocessor has been declared dead.
    pub fn is_faulted(&self) -> bool {
        self.transport.is_faulted()
    }

    fn check_fault(&self) -> Result<(), CallError> {
        if self.transport.is_faulted() {
            Err(CallError::Fault)
        } else {
            Ok(())
        }
    }

    /// Validate a raw request against the message catalog.
    fn resolve(
        &self,
        mailbox: u8,
        service_id: u8,
        command_id: u8,
        payload: &[u8],
        direction: Direction,
    ) -> Result<MailboxId, CallError> {
        let id = MailboxId::new(mailbox).ok_or(CallError::InvalidRequest)?;
        match Message::lookup(id, service_id, command_id) {
            Some(message) if message.direction() == direction => {}
            _ => return Err(CallError::InvalidRequest),
        }
        if payload.len() > id.layout().capacity {
            return Err(CallError::InvalidRequest);
        }
        Ok(id)
    }

    fn busy(&self, verdict: BusyVerdict) -> CallError {
        match verdict {
            BusyVerdict::Busy => CallError::Busy,
            BusyVerdict::NewFault => {
                log::error!(
                    "prcmu: coprocessor stopped consuming requests, giving up\n{}",
                    self.snapshot()
                );
                CallError::Fault
            }
        }
    }

    fn deadline(&self, timeout: Duration) -> u64 {
        self.clock.now_us().saturating_add(micros(timeout))
    }
}

fn wire(message: Message) -> (u8, u8, u8) {
    (
        u8::from(message.mailbox()),
        message.service_id(),
        message.command_id(),
    )
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

//! Raw access to the shared region and the doorbell/interrupt registers.
//!
//! Nothing else in the driver reads or writes those windows.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering, fence};

use common::sync::wait_until;
use log::trace;

use super::config::PrcmuConfig;
use super::layout::{HEADER_SIZE, MAX_PAYLOAD, MailboxId, field, reg};
use super::mailbox::{MailboxState, NotifyState};
use crate::hal::mmio::RegisterBlock;

/// Request header as last written to a mailbox.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RequestHeader {
    pub service_id: u8,
    pub command_id: u8,
    pub state: u8,
    pub len: u16,
}

/// Response header as the coprocessor left it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ResponseHeader {
    pub service_id: u8,
    pub command_id: u8,
    pub status: u8,
    pub state: u8,
    pub nfy_state: u8,
    pub len: u16,
}

/// An acknowledgement copied out of the shared region.
#[derive(Debug, Copy, Clone)]
pub(crate) struct AckFrame {
    pub service_id: u8,
    pub command_id: u8,
    pub status: u8,
    len: usize,
    data: [u8; MAX_PAYLOAD],
}

impl AckFrame {
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// How long a submission may wait for the previous doorbell to clear.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum DoorbellWait {
    /// Up to the configured busy-wait bound. Misses count towards the
    /// busy streak.
    Bounded,
    /// One look, for interrupt context. A miss is plain `Busy`.
    Once,
}

/// What a submission attempt did to the busy streak.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BusyVerdict {
    Busy,
    /// This submission pushed the streak over the limit.
    NewFault,
}

pub(crate) struct Transport<R: RegisterBlock> {
    regs: R,
    tcdm: R,
    busy_wait_bound: u32,
    fatal_busy_streak: u32,
    busy_streak: AtomicU32,
    faulted: AtomicBool,
}

impl<R: RegisterBlock> Transport<R> {
    pub fn new(regs: R, tcdm: R, config: &PrcmuConfig) -> Self {
        Self {
            regs,
            tcdm,
            busy_wait_bound: config.busy_wait_bound,
            fatal_busy_streak: config.fatal_busy_streak.max(1),
            busy_streak: AtomicU32::new(0),
            faulted: AtomicBool::new(false),
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    /// Submit a request and ring the mailbox's doorbell.
    ///
    /// Waits (as `wait` allows) for the coprocessor to consume the previous
    /// request on this mailbox. The payload and length go out first and the
    /// service/command/state word last, so the coprocessor never sees a
    /// header describing a half-written payload.
    pub fn write_request(
        &self,
        id: MailboxId,
        service_id: u8,
        command_id: u8,
        payload: &[u8],
        wait: DoorbellWait,
    ) -> Result<(), BusyVerdict> {
        let layout = id.layout();
        debug_assert!(payload.len() <= layout.capacity);
        let bit = id.bit();

        let bound = match wait {
            DoorbellWait::Bounded => self.busy_wait_bound,
            DoorbellWait::Once => 1,
        };
        if wait_until(|| self.regs.read32(reg::MBOX_CPU_VAL) & bit == 0, bound).is_err() {
            return Err(match wait {
                DoorbellWait::Bounded => self.note_busy(),
                DoorbellWait::Once => BusyVerdict::Busy,
            });
        }
        self.busy_streak.store(0, Ordering::Release);

        self.tcdm.write_bytes(layout.request_payload, payload);
        self.tcdm
            .write16(layout.request_header + field::LENGTH, payload.len() as u16);
        let header = u32::from_le_bytes([
            service_id,
            command_id,
            0,
            MailboxState::RequestSent as u8,
        ]);
        self.tcdm.write32(layout.request_header, header);

        fence(Ordering::SeqCst);
        self.regs.write32(reg::MBOX_CPU_SET, bit);
        trace!(
            "prcmu: {id} doorbell, service {service_id:#04x} command {command_id:#04x} len {}",
            payload.len()
        );
        Ok(())
    }

    fn note_busy(&self) -> BusyVerdict {
        let streak = self.busy_streak.fetch_add(1, Ordering::AcqRel) + 1;
        if streak >= self.fatal_busy_streak && !self.faulted.swap(true, Ordering::AcqRel) {
            BusyVerdict::NewFault
        } else {
            BusyVerdict::Busy
        }
    }

    pub fn read_request_header(&self, id: MailboxId) -> RequestHeader {
        let base = id.layout().request_header;
        RequestHeader {
            service_id: self.tcdm.read8(base + field::SERVICE),
            command_id: self.tcdm.read8(base + field::COMMAND),
            state: self.tcdm.read8(base + field::STATE),
            len: self.tcdm.read16(base + field::LENGTH),
        }
    }

    pub fn read_response_header(&self, id: MailboxId) -> ResponseHeader {
        let base = id.layout().response_header;
        let mut raw = [0u8; HEADER_SIZE];
        self.tcdm.read_bytes(base, &mut raw);
        ResponseHeader {
            service_id: raw[field::SERVICE],
            command_id: raw[field::COMMAND],
            status: raw[field::STATUS],
            state: raw[field::STATE],
            nfy_state: raw[field::NFY_STATE],
            len: u16::from_le_bytes([raw[field::LENGTH], raw[field::LENGTH + 1]]),
        }
    }

    /// Copy the response payload described by `header` into `out`.
    ///
    /// Returns `None` when the header claims more than the mailbox holds.
    pub fn read_response_payload(
        &self,
        id: MailboxId,
        header: &ResponseHeader,
        out: &mut [u8],
    ) -> Option<usize> {
        let layout = id.layout();
        let len = header.len as usize;
        if len > layout.capacity || len > out.len() {
            return None;
        }
        self.tcdm.read_bytes(layout.response_payload, &mut out[..len]);
        Some(len)
    }

    /// Copy an acknowledgement out of the response slot.
    pub fn read_ack(&self, id: MailboxId, header: &ResponseHeader) -> Option<AckFrame> {
        let mut frame = AckFrame {
            service_id: header.service_id,
            command_id: header.command_id,
            status: header.status,
            len: 0,
            data: [0; MAX_PAYLOAD],
        };
        frame.len = self.read_response_payload(id, header, &mut frame.data)?;
        Some(frame)
    }

    /// Hand the response slot back after an ack was consumed.
    pub fn release_ack(&self, id: MailboxId) {
        self.tcdm.write8(
            id.layout().response_header + field::STATE,
            MailboxState::Idle as u8,
        );
    }

    /// Hand the response slot back after a notification was consumed.
    pub fn release_notification(&self, id: MailboxId) {
        self.tcdm.write8(
            id.layout().response_header + field::NFY_STATE,
            NotifyState::Idle as u8,
        );
    }

    /// Doorbells not yet consumed by the coprocessor.
    pub fn doorbells(&self) -> u32 {
        self.regs.read32(reg::MBOX_CPU_VAL)
    }

    /// Mailboxes the coprocessor has raised.
    pub fn pending_interrupts(&self) -> u32 {
        self.regs.read32(reg::ARM_IT1_VAL)
    }

    pub fn clear_interrupts(&self, mask: u32) {
        self.regs.write32(reg::ARM_IT1_CLR, mask);
    }
}

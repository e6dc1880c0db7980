//! Host-side harness: a simulated coprocessor over RAM-backed windows.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use drivers::hal::mmio::{RamRegion, RegisterBlock};
use drivers::hal::timer::{CountingTimer, PeriodicTimer, Timer};
use drivers::peripheral::prcmu::layout::{MAILBOX_COUNT, MailboxId, TCDM_SPAN, field, reg};
use drivers::peripheral::prcmu::{MailboxState, NotifyState, Prcmu, PrcmuConfig};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// A RAM window. As the register bank it also behaves like the hardware:
/// writing `MBOX_CPU_SET` sets doorbell bits and writing `ARM_IT1_CLR`
/// clears interrupt bits.
pub struct SimWindow {
    ram: RamRegion,
    registers: bool,
    rings: [AtomicU32; MAILBOX_COUNT],
}

impl SimWindow {
    pub fn registers() -> Self {
        Self::new(reg::SPAN, true)
    }

    pub fn tcdm() -> Self {
        Self::new(TCDM_SPAN, false)
    }

    fn new(len: usize, registers: bool) -> Self {
        Self {
            ram: RamRegion::new(len),
            registers,
            rings: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    /// How many times the doorbell of `id` was rung.
    pub fn rings(&self, id: MailboxId) -> u32 {
        self.rings[id.index()].load(Ordering::Acquire)
    }

    pub fn total_rings(&self) -> u32 {
        self.rings.iter().map(|r| r.load(Ordering::Acquire)).sum()
    }
}

impl RegisterBlock for SimWindow {
    fn read8(&self, offset: usize) -> u8 {
        self.ram.read8(offset)
    }

    fn write8(&self, offset: usize, value: u8) {
        self.ram.write8(offset, value)
    }

    fn read32(&self, offset: usize) -> u32 {
        self.ram.read32(offset)
    }

    fn write32(&self, offset: usize, value: u32) {
        match offset {
            reg::MBOX_CPU_SET if self.registers => {
                for id in MailboxId::all().filter(|id| value & id.bit() != 0) {
                    self.rings[id.index()].fetch_add(1, Ordering::AcqRel);
                }
                self.ram.set_bits32(reg::MBOX_CPU_VAL, value);
            }
            reg::ARM_IT1_CLR if self.registers => self.ram.clear_bits32(reg::ARM_IT1_VAL, value),
            _ => self.ram.write32(offset, value),
        }
    }
}

/// Wall-clock `CountingTimer`.
pub struct HostClock(Instant);

impl HostClock {
    pub fn new() -> Self {
        Self(Instant::now())
    }
}

impl CountingTimer for HostClock {
    fn now_us(&self) -> u64 {
        self.0.elapsed().as_micros() as u64
    }
}

/// A request as the coprocessor picked it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub service_id: u8,
    pub command_id: u8,
    pub payload: Vec<u8>,
}

/// The coprocessor's side of the windows.
#[derive(Clone)]
pub struct Firmware {
    pub regs: Arc<SimWindow>,
    pub tcdm: Arc<SimWindow>,
}

impl Firmware {
    /// Consume a pending request on `id`, if one was rung.
    pub fn take_request(&self, id: MailboxId) -> Option<SeenRequest> {
        if self.regs.read32(reg::MBOX_CPU_VAL) & id.bit() == 0 {
            return None;
        }
        let layout = id.layout();
        let len = self.tcdm.read16(layout.request_header + field::LENGTH) as usize;
        let mut payload = vec![0; len];
        self.tcdm.read_bytes(layout.request_payload, &mut payload);
        let request = SeenRequest {
            service_id: self.tcdm.read8(layout.request_header + field::SERVICE),
            command_id: self.tcdm.read8(layout.request_header + field::COMMAND),
            payload,
        };
        self.regs.ram.clear_bits32(reg::MBOX_CPU_VAL, id.bit());
        Some(request)
    }

    pub fn wait_request(&self, id: MailboxId, timeout: Duration) -> Option<SeenRequest> {
        let start = Instant::now();
        loop {
            if let Some(request) = self.take_request(id) {
                return Some(request);
            }
            if start.elapsed() > timeout {
                return None;
            }
            thread::sleep(Duration::from_micros(50));
        }
    }

    /// Hold a doorbell as if the coprocessor never consumed it.
    pub fn hold_doorbell(&self, id: MailboxId) {
        self.regs.ram.set_bits32(reg::MBOX_CPU_VAL, id.bit());
    }

    pub fn release_doorbell(&self, id: MailboxId) {
        self.regs.ram.clear_bits32(reg::MBOX_CPU_VAL, id.bit());
    }

    fn write_response(&self, id: MailboxId, service_id: u8, command_id: u8, payload: &[u8]) {
        let layout = id.layout();
        let base = layout.response_header;
        self.tcdm.write_bytes(layout.response_payload, payload);
        self.tcdm.write16(base + field::LENGTH, payload.len() as u16);
        self.tcdm.write8(base + field::SERVICE, service_id);
        self.tcdm.write8(base + field::COMMAND, command_id);
    }

    /// Leave an acknowledgement in the response slot (without raising).
    pub fn ack(&self, id: MailboxId, service_id: u8, command_id: u8, status: u8, payload: &[u8]) {
        let base = id.layout().response_header;
        self.write_response(id, service_id, command_id, payload);
        self.tcdm.write8(base + field::STATUS, status);
        self.tcdm.write8(base + field::STATE, MailboxState::AckSent as u8);
    }

    /// Leave a notification in the response slot (without raising).
    pub fn notify(&self, id: MailboxId, service_id: u8, command_id: u8, payload: &[u8]) {
        let base = id.layout().response_header;
        self.write_response(id, service_id, command_id, payload);
        self.tcdm.write8(base + field::NFY_STATE, NotifyState::Sent as u8);
    }

    /// Overwrite the payload length the response header claims.
    pub fn set_response_len(&self, id: MailboxId, len: u16) {
        self.tcdm.write16(id.layout().response_header + field::LENGTH, len);
    }

    pub fn set_response_state(&self, id: MailboxId, state: u8) {
        self.tcdm.write8(id.layout().response_header + field::STATE, state);
    }

    pub fn response_state(&self, id: MailboxId) -> u8 {
        self.tcdm.read8(id.layout().response_header + field::STATE)
    }

    pub fn nfy_state(&self, id: MailboxId) -> u8 {
        self.tcdm.read8(id.layout().response_header + field::NFY_STATE)
    }

    /// Assert the interrupt line for `id`.
    pub fn raise(&self, id: MailboxId) {
        self.regs.ram.set_bits32(reg::ARM_IT1_VAL, id.bit());
    }

    pub fn pending_interrupts(&self) -> u32 {
        self.regs.read32(reg::ARM_IT1_VAL)
    }
}

pub type TestPrcmu = Prcmu<Arc<SimWindow>, HostClock>;

pub struct Rig {
    pub prcmu: Arc<TestPrcmu>,
    pub fw: Firmware,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(PrcmuConfig::default())
    }

    pub fn with_config(config: PrcmuConfig) -> Self {
        let fw = Firmware {
            regs: Arc::new(SimWindow::registers()),
            tcdm: Arc::new(SimWindow::tcdm()),
        };
        let prcmu = Prcmu::new(fw.regs.clone(), fw.tcdm.clone(), HostClock::new(), config);
        Self {
            prcmu: Arc::new(prcmu),
            fw,
        }
    }

    /// Spawn a coprocessor that answers the next request on `id` with
    /// `respond(request) -> (service, command, status, payload)` and then
    /// interrupts.
    pub fn answer_with<F>(&self, id: MailboxId, respond: F) -> JoinHandle<SeenRequest>
    where
        F: FnOnce(&SeenRequest) -> (u8, u8, u8, Vec<u8>) + Send + 'static,
    {
        let fw = self.fw.clone();
        let prcmu = self.prcmu.clone();
        thread::spawn(move || {
            let request = fw
                .wait_request(id, Duration::from_secs(2))
                .expect("no request reached the coprocessor");
            let (service_id, command_id, status, payload) = respond(&request);
            fw.ack(id, service_id, command_id, status, &payload);
            fw.raise(id);
            prcmu.handle_irq();
            request
        })
    }

    /// Answer the next request on `id` by echoing its service/command.
    pub fn answer(&self, id: MailboxId, status: u8, payload: &[u8]) -> JoinHandle<SeenRequest> {
        let payload = payload.to_vec();
        self.answer_with(id, move |request| {
            (request.service_id, request.command_id, status, payload)
        })
    }
}

/// Logger that keeps every record for later inspection.
pub struct CaptureLogger {
    records: Mutex<Vec<(Level, String)>>,
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

/// Install the capture logger (once per test binary) and clear it.
pub fn capture_logs() -> &'static CaptureLogger {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("logger already set");
        log::set_max_level(LevelFilter::Trace);
    });
    LOGGER.clear();
    &LOGGER
}

impl CaptureLogger {
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimerCall {
    StartPeriodic(u32),
    Stop,
    Clear,
}

/// Periodic timer that only records what was asked of it.
#[derive(Clone, Default)]
pub struct FakeTimer {
    pub calls: Arc<Mutex<Vec<TimerCall>>>,
}

impl FakeTimer {
    pub fn calls(&self) -> Vec<TimerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: TimerCall) -> Result<(), ()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl Timer for FakeTimer {
    type Handle = u8;
    type Error = ();

    fn start(&mut self, _: u8, _: u32) -> Result<(), ()> {
        Ok(())
    }

    fn stop(&mut self, _: u8) -> Result<(), ()> {
        self.record(TimerCall::Stop)
    }

    fn clear_interrupt(&mut self, _: u8) -> Result<(), ()> {
        self.record(TimerCall::Clear)
    }

    fn is_pending(&self, _: u8) -> Result<bool, ()> {
        Ok(false)
    }
}

impl PeriodicTimer for FakeTimer {
    fn start_periodic(&mut self, _: u8, interval_us: u32) -> Result<(), ()> {
        self.record(TimerCall::StartPeriodic(interval_us))
    }
}

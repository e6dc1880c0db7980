//! Typed payloads.
//!
//! Each [`Message`] has its own payload shape. [`Request`] encodes the
//! outgoing side, [`Reply`] decodes acknowledgements and [`Event`] decodes
//! notifications. Drivers that need a message not modelled here can still
//! go through the raw `call()`.

use bitflags::bitflags;

use super::error::CallError;
use super::protocol::Message;

/// Scratch space needed to encode any [`Request`].
pub const REQUEST_SCRATCH: usize = 8;

bitflags! {
    /// Events allowed to wake the application processor.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct WakeupSources: u32 {
        const RTC = 1 << 0;
        const RTT0 = 1 << 1;
        const RTT1 = 1 << 2;
        const HSI0 = 1 << 3;
        const HSI1 = 1 << 4;
        const CA_WAKE = 1 << 5;
        const USB = 1 << 6;
        const ABB = 1 << 7;
        const ABB_FIFO = 1 << 8;
        const SYSCLK_OK = 1 << 9;
        const CA_SLEEP = 1 << 10;
        const AC_WAKE_ACK = 1 << 11;
        const SIDE_TONE_OK = 1 << 12;
        const ANC_OK = 1 << 13;
        const SW_ERROR = 1 << 14;
        const AC_SLEEP_ACK = 1 << 15;
        const ARM = 1 << 17;
        const HOTMON_LOW = 1 << 18;
        const HOTMON_HIGH = 1 << 19;
        const MODEM_SW_RESET_REQ = 1 << 20;
        const GPIO0 = 1 << 23;
        const GPIO1 = 1 << 24;
        const GPIO2 = 1 << 25;
        const GPIO3 = 1 << 26;
        const GPIO4 = 1 << 27;
        const GPIO5 = 1 << 28;
        const GPIO6 = 1 << 29;
        const GPIO7 = 1 << 30;
        const GPIO8 = 1 << 31;
    }
}

/// Target of a power-state transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerState {
    /// Stay in the current state.
    NoTransition = 0x00,
    /// APE sleep, ARM in retention.
    ApSleep = 0x01,
    /// APE on, ARM clock gated.
    ApIdle = 0x02,
    /// APE and ARM powered off.
    ApDeepSleep = 0x03,
    /// APE on, ARM powered off.
    ApDeepIdle = 0x04,
}

/// ARM operating point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ArmOpp {
    /// Keep the current point.
    NoChange = 0x00,
    /// Overdrive, above 100%.
    Max = 0x01,
    Opp100 = 0x02,
    Opp50 = 0x03,
    /// Run from the external clock.
    ExtClk = 0x07,
}

impl TryFrom<u8> for ArmOpp {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, u8> {
        match raw {
            0x00 => Ok(ArmOpp::NoChange),
            0x01 => Ok(ArmOpp::Max),
            0x02 => Ok(ArmOpp::Opp100),
            0x03 => Ok(ArmOpp::Opp50),
            0x07 => Ok(ArmOpp::ExtClk),
            other => Err(other),
        }
    }
}

/// APE (application peripheral) operating point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ApeOpp {
    /// Keep the current point.
    NoChange = 0x00,
    Opp100 = 0x02,
    Opp50 = 0x03,
}

impl TryFrom<u8> for ApeOpp {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, u8> {
        match raw {
            0x00 => Ok(ApeOpp::NoChange),
            0x02 => Ok(ApeOpp::Opp100),
            0x03 => Ok(ApeOpp::Opp50),
            other => Err(other),
        }
    }
}

/// Power domain (EPOD) state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum EpodState {
    Off = 0x00,
    Retention = 0x01,
    OnClockOff = 0x02,
    On = 0x03,
}

/// An outgoing message with its payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Request {
    PowerStateTransition {
        state: PowerState,
        keep_ulp_clk: bool,
        keep_ap_pll: bool,
    },
    ConfigWakeups {
        sleep: bool,
        sources: WakeupSources,
    },
    ReadWakeupAck,
    SetArmApeOpp {
        arm: ArmOpp,
        ape: ApeOpp,
    },
    /// `true` requests the APE 100% OPP voltage, `false` releases it.
    ApeOpp100Voltage(bool),
    ResetModem,
    ReleaseUsbWakeup,
    SetEpod {
        domain: u8,
        state: EpodState,
    },
    AutoPower {
        enable: bool,
    },
    RequestClock {
        clock: u8,
        enable: bool,
    },
    SetSysClk(bool),
    DdrInit,
    MemState(u8),
    HotdogThreshold {
        celsius: u8,
    },
    HotmonConfig {
        low: u8,
        high: u8,
    },
    HotPeriod {
        cycles: u16,
    },
    GetTemp,
    WatchdogConfig {
        count: u8,
        sleep_auto_off: bool,
    },
    WatchdogEnable {
        id: u8,
    },
    WatchdogDisable {
        id: u8,
    },
    WatchdogLoad {
        id: u8,
        timeout_ms: u32,
    },
    WatchdogKick {
        id: u8,
    },
    I2cWrite {
        bank: u8,
        reg: u8,
        value: u8,
    },
    I2cRead {
        bank: u8,
        reg: u8,
    },
    /// `true` powers the USB PHY up, `false` down.
    UsbPhy(bool),
    ModemStatus,
}

impl Request {
    pub fn message(&self) -> Message {
        match *self {
            Request::PowerStateTransition { .. } => Message::PowerStateTransition,
            Request::ConfigWakeups { sleep: false, .. } => Message::ConfigWakeupsExec,
            Request::ConfigWakeups { sleep: true, .. } => Message::ConfigWakeupsSleep,
            Request::ReadWakeupAck => Message::ReadWakeupAck,
            Request::SetArmApeOpp { .. } => Message::SetArmApeOpp,
            Request::ApeOpp100Voltage(true) => Message::RequestApeOpp100Voltage,
            Request::ApeOpp100Voltage(false) => Message::ReleaseApeOpp100Voltage,
            Request::ResetModem => Message::ResetModem,
            Request::ReleaseUsbWakeup => Message::ReleaseUsbWakeup,
            Request::SetEpod { .. } => Message::SetEpod,
            Request::AutoPower { .. } => Message::AutoPower,
            Request::RequestClock { .. } => Message::RequestClock,
            Request::SetSysClk(_) => Message::SetSysClk,
            Request::DdrInit => Message::DdrInit,
            Request::MemState(_) => Message::MemState,
            Request::HotdogThreshold { .. } => Message::HotdogThreshold,
            Request::HotmonConfig { .. } => Message::HotmonConfig,
            Request::HotPeriod { .. } => Message::HotPeriod,
            Request::GetTemp => Message::GetTemp,
            Request::WatchdogConfig { .. } => Message::WatchdogConfig,
            Request::WatchdogEnable { .. } => Message::WatchdogEnable,
            Request::WatchdogDisable { .. } => Message::WatchdogDisable,
            Request::WatchdogLoad { .. } => Message::WatchdogLoad,
            Request::WatchdogKick { .. } => Message::WatchdogKick,
            Request::I2cWrite { .. } => Message::I2cWrite,
            Request::I2cRead { .. } => Message::I2cRead,
            Request::UsbPhy(true) => Message::UsbPhyEnable,
            Request::UsbPhy(false) => Message::UsbPhyDisable,
            Request::ModemStatus => Message::ModemStatus,
        }
    }

    /// Write the payload into `out` and return its length.
    pub fn encode(&self, out: &mut [u8; REQUEST_SCRATCH]) -> usize {
        match *self {
            Request::PowerStateTransition {
                state,
                keep_ulp_clk,
                keep_ap_pll,
            } => put(out, &[state as u8, keep_ulp_clk as u8, keep_ap_pll as u8]),
            Request::ConfigWakeups { sources, .. } => put(out, &sources.bits().to_le_bytes()),
            Request::SetArmApeOpp { arm, ape } => put(out, &[arm as u8, ape as u8]),
            Request::SetEpod { domain, state } => put(out, &[domain, state as u8]),
            Request::AutoPower { enable } => put(out, &[enable as u8]),
            Request::RequestClock { clock, enable } => put(out, &[clock, enable as u8]),
            Request::SetSysClk(enable) => put(out, &[enable as u8]),
            Request::MemState(state) => put(out, &[state]),
            Request::HotdogThreshold { celsius } => put(out, &[celsius]),
            Request::HotmonConfig { low, high } => put(out, &[low, high]),
            Request::HotPeriod { cycles } => put(out, &cycles.to_le_bytes()),
            Request::WatchdogConfig {
                count,
                sleep_auto_off,
            } => put(out, &[count, sleep_auto_off as u8]),
            Request::WatchdogEnable { id }
            | Request::WatchdogDisable { id }
            | Request::WatchdogKick { id } => put(out, &[id]),
            Request::WatchdogLoad { id, timeout_ms } => {
                let [t0, t1, t2, t3] = timeout_ms.to_le_bytes();
                put(out, &[id, t0, t1, t2, t3])
            }
            Request::I2cWrite { bank, reg, value } => put(out, &[bank, reg, value]),
            Request::I2cRead { bank, reg } => put(out, &[bank, reg]),
            Request::ReadWakeupAck
            | Request::ApeOpp100Voltage(_)
            | Request::ResetModem
            | Request::ReleaseUsbWakeup
            | Request::DdrInit
            | Request::GetTemp
            | Request::UsbPhy(_)
            | Request::ModemStatus => 0,
        }
    }
}

fn put(out: &mut [u8; REQUEST_SCRATCH], bytes: &[u8]) -> usize {
    out[..bytes.len()].copy_from_slice(bytes);
    bytes.len()
}

/// A decoded acknowledgement payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reply {
    Empty,
    /// Operating points actually applied.
    Opp { arm: ArmOpp, ape: ApeOpp },
    /// Die temperature in degrees Celsius.
    Temperature(u8),
    /// A register value read through the I2C bridge.
    Value(u8),
    ModemStatus(u32),
}

impl Reply {
    pub fn decode(message: Message, payload: &[u8]) -> Result<Reply, CallError> {
        match message {
            Message::SetArmApeOpp => match *payload {
                [arm, ape, ..] => Ok(Reply::Opp {
                    arm: ArmOpp::try_from(arm).map_err(|_| CallError::ProtocolMismatch)?,
                    ape: ApeOpp::try_from(ape).map_err(|_| CallError::ProtocolMismatch)?,
                }),
                _ => Err(CallError::ProtocolMismatch),
            },
            Message::GetTemp => first(payload).map(Reply::Temperature),
            Message::I2cRead => first(payload).map(Reply::Value),
            Message::ModemStatus => le_u32(payload).map(Reply::ModemStatus),
            _ => Ok(Reply::Empty),
        }
    }
}

/// A decoded notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// The coprocessor woke (or is keeping) the processor for `sources`.
    Wakeup { sleep: bool, sources: WakeupSources },
    /// The hot-monitor crossed its high (`true`) or low threshold.
    Hotmon { high: bool },
    Modem(u32),
}

impl Event {
    pub fn decode(message: Message, payload: &[u8]) -> Option<Event> {
        match message {
            Message::WakeupExec | Message::WakeupSleep => {
                le_u32(payload).ok().map(|bits| Event::Wakeup {
                    sleep: message == Message::WakeupSleep,
                    sources: WakeupSources::from_bits_truncate(bits),
                })
            }
            Message::HotmonEvent => payload.first().map(|&b| Event::Hotmon { high: b != 0 }),
            Message::ModemEvent => le_u32(payload).ok().map(Event::Modem),
            _ => None,
        }
    }
}

fn first(payload: &[u8]) -> Result<u8, CallError> {
    payload.first().copied().ok_or(CallError::ProtocolMismatch)
}

fn le_u32(payload: &[u8]) -> Result<u32, CallError> {
    match *payload {
        [b0, b1, b2, b3, ..] => Ok(u32::from_le_bytes([b0, b1, b2, b3])),
        _ => Err(CallError::ProtocolMismatch),
    }
}

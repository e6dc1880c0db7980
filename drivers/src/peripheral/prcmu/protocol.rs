//! Message catalog: which `(service, command)` pairs each mailbox carries.
//!
//! A header whose `(service, command)` is not listed for the mailbox it
//! arrived on is an unknown message.

use super::layout::MailboxId;

/// Service ids: the functional domain a message belongs to.
pub mod service {
    pub const POWER: u8 = 0x01;
    pub const WAKEUP: u8 = 0x02;
    pub const DVFS: u8 = 0x03;
    pub const MODEM: u8 = 0x04;
    pub const REGULATOR: u8 = 0x05;
    pub const CLOCK: u8 = 0x06;
    pub const MEMORY: u8 = 0x07;
    pub const THERMAL: u8 = 0x08;
    pub const WATCHDOG: u8 = 0x09;
    pub const I2C: u8 = 0x0A;
    pub const USB: u8 = 0x0B;
}

/// Command ids, grouped by service.
pub mod command {
    pub mod power {
        pub const TRANSITION: u8 = 0x00;
    }

    pub mod wakeup {
        pub const CONFIG_EXEC: u8 = 0x01;
        pub const EVENT_EXEC: u8 = 0x02;
        pub const READ_ACK: u8 = 0x03;
        pub const CONFIG_SLEEP: u8 = 0x04;
        pub const EVENT_SLEEP: u8 = 0x05;
    }

    pub mod dvfs {
        pub const SET_OPP: u8 = 0x01;
        pub const REQUEST_APE_OPP100_VOLTAGE: u8 = 0x03;
        pub const RELEASE_APE_OPP100_VOLTAGE: u8 = 0x04;
    }

    pub mod modem {
        pub const GET_STATUS: u8 = 0x01;
        pub const RESET: u8 = 0x02;
        pub const EVENT: u8 = 0x10;
    }

    pub mod regulator {
        pub const SET_EPOD: u8 = 0x00;
        pub const AUTO_POWER: u8 = 0x01;
    }

    pub mod clock {
        pub const REQUEST: u8 = 0x01;
        pub const SET_SYSCLK: u8 = 0x0E;
    }

    pub mod memory {
        pub const DDR_INIT: u8 = 0x00;
        pub const MEM_STATE: u8 = 0x01;
    }

    pub mod thermal {
        pub const HOTDOG_THRESHOLD: u8 = 0x12;
        pub const HOTMON_CONFIG: u8 = 0x13;
        pub const HOT_PERIOD: u8 = 0x14;
        pub const GET_TEMP: u8 = 0x15;
        pub const HOTMON_EVENT: u8 = 0x21;
    }

    pub mod watchdog {
        pub const CONFIG: u8 = 0x16;
        pub const ENABLE: u8 = 0x17;
        pub const DISABLE: u8 = 0x18;
        pub const LOAD: u8 = 0x19;
        pub const KICK: u8 = 0x20;
    }

    pub mod i2c {
        pub const WRITE: u8 = 0x00;
        pub const READ: u8 = 0x01;
    }

    pub mod usb {
        pub const PHY_ENABLE: u8 = 0x01;
        pub const PHY_DISABLE: u8 = 0x02;
        pub const RELEASE_WAKEUP: u8 = 0x05;
    }
}

/// Acknowledgement status codes. Zero is success; the rest are causes.
pub mod status {
    pub const SUCCESS: u8 = 0x00;
    pub const BAD_PARAMETER: u8 = 0x01;
    pub const UNKNOWN_COMMAND: u8 = 0x02;
    pub const BUSY: u8 = 0x03;
    pub const INVALID_STATE: u8 = 0x04;
}

/// How a message travels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Request answered by an ack on the same mailbox.
    Call,
    /// Request with no per-call ack.
    Posted,
    /// Coprocessor-initiated, not correlated to any request.
    Notify,
}

/// Every message kind the firmware understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    // mb0: power and wakeups
    /// Enter a power state at the next WFI (posted).
    PowerStateTransition,
    /// Wakeup sources while executing (posted).
    ConfigWakeupsExec,
    /// Wakeup sources while asleep (posted).
    ConfigWakeupsSleep,
    /// Acknowledge a wakeup notification (posted).
    ReadWakeupAck,
    /// Woken from, or interrupted while, executing.
    WakeupExec,
    /// Woken from sleep.
    WakeupSleep,

    // mb1: DVFS
    /// Set ARM and APE operating points.
    SetArmApeOpp,
    /// Hold the APE supply at its 100% OPP voltage.
    RequestApeOpp100Voltage,
    /// Drop the hold taken by `RequestApeOpp100Voltage`.
    ReleaseApeOpp100Voltage,
    /// Reset the modem subsystem.
    ResetModem,
    /// Release the wakeup held by the USB PHY.
    ReleaseUsbWakeup,

    // mb2: regulators
    /// Set a power domain's EPOD state.
    SetEpod,
    /// Enable or disable automatic power-domain control.
    AutoPower,

    // mb3: clocks
    /// Gate or ungate a coprocessor-managed clock.
    RequestClock,
    /// Request or release the system clock.
    SetSysClk,

    // mb4: memory, thermal, watchdog
    /// Initialize the DDR controller.
    DdrInit,
    /// Set the memory retention state.
    MemState,
    /// Temperature at which the coprocessor shuts the system down.
    HotdogThreshold,
    /// Low and high hot-monitor thresholds.
    HotmonConfig,
    /// Hot-monitor sampling period.
    HotPeriod,
    /// Read the die temperature.
    GetTemp,
    /// A hot-monitor threshold was crossed.
    HotmonEvent,
    /// Configure the A9 watchdogs.
    WatchdogConfig,
    /// Start one A9 watchdog.
    WatchdogEnable,
    /// Stop one A9 watchdog.
    WatchdogDisable,
    /// Load one A9 watchdog's timeout.
    WatchdogLoad,
    /// Feed one A9 watchdog.
    WatchdogKick,

    // mb5: I2C bridge
    /// Write a register behind the coprocessor's I2C bridge.
    I2cWrite,
    /// Read a register behind the coprocessor's I2C bridge.
    I2cRead,

    // mb6: USB
    /// Power the USB PHY up.
    UsbPhyEnable,
    /// Power the USB PHY down.
    UsbPhyDisable,

    // mb7: modem
    /// Read the modem status word.
    ModemStatus,
    /// The modem status changed.
    ModemEvent,
}

impl Message {
    pub const ALL: &'static [Message] = &[
        Message::PowerStateTransition,
        Message::ConfigWakeupsExec,
        Message::ConfigWakeupsSleep,
        Message::ReadWakeupAck,
        Message::WakeupExec,
        Message::WakeupSleep,
        Message::SetArmApeOpp,
        Message::RequestApeOpp100Voltage,
        Message::ReleaseApeOpp100Voltage,
        Message::ResetModem,
        Message::ReleaseUsbWakeup,
        Message::SetEpod,
        Message::AutoPower,
        Message::RequestClock,
        Message::SetSysClk,
        Message::DdrInit,
        Message::MemState,
        Message::HotdogThreshold,
        Message::HotmonConfig,
        Message::HotPeriod,
        Message::GetTemp,
        Message::HotmonEvent,
        Message::WatchdogConfig,
        Message::WatchdogEnable,
        Message::WatchdogDisable,
        Message::WatchdogLoad,
        Message::WatchdogKick,
        Message::I2cWrite,
        Message::I2cRead,
        Message::UsbPhyEnable,
        Message::UsbPhyDisable,
        Message::ModemStatus,
        Message::ModemEvent,
    ];

    /// `(mailbox, service, command, direction)` on the wire.
    const fn wire(self) -> (MailboxId, u8, u8, Direction) {
        use self::command as cmd;
        use Direction::*;

        match self {
            Message::PowerStateTransition => (
                MailboxId::POWER,
                service::POWER,
                cmd::power::TRANSITION,
                Posted,
            ),
            Message::ConfigWakeupsExec => (
                MailboxId::POWER,
                service::WAKEUP,
                cmd::wakeup::CONFIG_EXEC,
                Posted,
            ),
            Message::ConfigWakeupsSleep => (
                MailboxId::POWER,
                service::WAKEUP,
                cmd::wakeup::CONFIG_SLEEP,
                Posted,
            ),
            Message::ReadWakeupAck => (
                MailboxId::POWER,
                service::WAKEUP,
                cmd::wakeup::READ_ACK,
                Posted,
            ),
            Message::WakeupExec => (
                MailboxId::POWER,
                service::WAKEUP,
                cmd::wakeup::EVENT_EXEC,
                Notify,
            ),
            Message::WakeupSleep => (
                MailboxId::POWER,
                service::WAKEUP,
                cmd::wakeup::EVENT_SLEEP,
                Notify,
            ),

            Message::SetArmApeOpp => (MailboxId::DVFS, service::DVFS, cmd::dvfs::SET_OPP, Call),
            Message::RequestApeOpp100Voltage => (
                MailboxId::DVFS,
                service::DVFS,
                cmd::dvfs::REQUEST_APE_OPP100_VOLTAGE,
                Call,
            ),
            Message::ReleaseApeOpp100Voltage => (
                MailboxId::DVFS,
                service::DVFS,
                cmd::dvfs::RELEASE_APE_OPP100_VOLTAGE,
                Call,
            ),
            Message::ResetModem => (MailboxId::DVFS, service::MODEM, cmd::modem::RESET, Call),
            Message::ReleaseUsbWakeup => (
                MailboxId::DVFS,
                service::USB,
                cmd::usb::RELEASE_WAKEUP,
                Call,
            ),

            Message::SetEpod => (
                MailboxId::REGULATOR,
                service::REGULATOR,
                cmd::regulator::SET_EPOD,
                Call,
            ),
            Message::AutoPower => (
                MailboxId::REGULATOR,
                service::REGULATOR,
                cmd::regulator::AUTO_POWER,
                Call,
            ),

            Message::RequestClock => (MailboxId::CLOCK, service::CLOCK, cmd::clock::REQUEST, Call),
            Message::SetSysClk => (MailboxId::CLOCK, service::CLOCK, cmd::clock::SET_SYSCLK, Call),

            Message::DdrInit => (MailboxId::THERMAL, service::MEMORY, cmd::memory::DDR_INIT, Call),
            Message::MemState => (
                MailboxId::THERMAL,
                service::MEMORY,
                cmd::memory::MEM_STATE,
                Call,
            ),
            Message::HotdogThreshold => (
                MailboxId::THERMAL,
                service::THERMAL,
                cmd::thermal::HOTDOG_THRESHOLD,
                Call,
            ),
            Message::HotmonConfig => (
                MailboxId::THERMAL,
                service::THERMAL,
                cmd::thermal::HOTMON_CONFIG,
                Call,
            ),
            Message::HotPeriod => (
                MailboxId::THERMAL,
                service::THERMAL,
                cmd::thermal::HOT_PERIOD,
                Call,
            ),
            Message::GetTemp => (
                MailboxId::THERMAL,
                service::THERMAL,
                cmd::thermal::GET_TEMP,
                Call,
            ),
            Message::HotmonEvent => (
                MailboxId::THERMAL,
                service::THERMAL,
                cmd::thermal::HOTMON_EVENT,
                Notify,
            ),
            Message::WatchdogConfig => (
                MailboxId::THERMAL,
                service::WATCHDOG,
                cmd::watchdog::CONFIG,
                Call,
            ),
            Message::WatchdogEnable => (
                MailboxId::THERMAL,
                service::WATCHDOG,
                cmd::watchdog::ENABLE,
                Call,
            ),
            Message::WatchdogDisable => (
                MailboxId::THERMAL,
                service::WATCHDOG,
                cmd::watchdog::DISABLE,
                Call,
            ),
            Message::WatchdogLoad => (
                MailboxId::THERMAL,
                service::WATCHDOG,
                cmd::watchdog::LOAD,
                Call,
            ),
            Message::WatchdogKick => (
                MailboxId::THERMAL,
                service::WATCHDOG,
                cmd::watchdog::KICK,
                Call,
            ),

            Message::I2cWrite => (MailboxId::I2C, service::I2C, cmd::i2c::WRITE, Call),
            Message::I2cRead => (MailboxId::I2C, service::I2C, cmd::i2c::READ, Call),

            Message::UsbPhyEnable => (MailboxId::USB, service::USB, cmd::usb::PHY_ENABLE, Call),
            Message::UsbPhyDisable => (MailboxId::USB, service::USB, cmd::usb::PHY_DISABLE, Call),

            Message::ModemStatus => (
                MailboxId::MODEM,
                service::MODEM,
                cmd::modem::GET_STATUS,
                Call,
            ),
            Message::ModemEvent => (MailboxId::MODEM, service::MODEM, cmd::modem::EVENT, Notify),
        }
    }

    /// Identify the message a header on `mailbox` carries.
    pub fn lookup(mailbox: MailboxId, service_id: u8, command_id: u8) -> Option<Message> {
        Message::ALL.iter().copied().find(|m| {
            let (mb, service, command, _) = m.wire();
            mb == mailbox && service == service_id && command == command_id
        })
    }

    pub const fn mailbox(self) -> MailboxId {
        self.wire().0
    }

    pub const fn service_id(self) -> u8 {
        self.wire().1
    }

    pub const fn command_id(self) -> u8 {
        self.wire().2
    }

    pub const fn direction(self) -> Direction {
        self.wire().3
    }
}

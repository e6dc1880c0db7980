mod common;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use common::{Rig, capture_logs};
use drivers::peripheral::prcmu::layout::MailboxId;
use drivers::peripheral::prcmu::protocol::{command, service, status};
use drivers::peripheral::prcmu::{
    CallError, DeferredWork, Event, IrqStatus, MailboxState, Message, NotifyState, WakeupSources,
};
use log::Level;
use serial_test::serial;

#[test]
fn only_raised_mailbox_is_handled() {
    let rig = Rig::new();
    rig.prcmu
        .call_nowait(5, service::I2C, command::i2c::READ, &[0x02, 0x10])
        .unwrap();
    rig.prcmu
        .call_nowait(2, service::REGULATOR, command::regulator::AUTO_POWER, &[1])
        .unwrap();
    let regulator = rig.fw.take_request(MailboxId::REGULATOR).unwrap();

    // Both answered, only mailbox 2 raised.
    rig.fw.ack(MailboxId::I2C, service::I2C, command::i2c::READ, status::SUCCESS, &[0x55]);
    rig.fw.ack(
        MailboxId::REGULATOR,
        regulator.service_id,
        regulator.command_id,
        status::SUCCESS,
        &[],
    );
    rig.fw.raise(MailboxId::REGULATOR);

    assert_eq!(rig.prcmu.handle_irq().handled, 0b100);
    assert_eq!(rig.prcmu.mailbox_state(2), Some(MailboxState::Idle));
    assert_eq!(rig.prcmu.mailbox_state(5), Some(MailboxState::RequestSent));
    assert_eq!(rig.fw.response_state(MailboxId::I2C), MailboxState::AckSent as u8);
    for other in [0, 1, 3, 4, 6, 7] {
        assert_eq!(rig.prcmu.mailbox_state(other), Some(MailboxState::Idle));
    }
    assert_eq!(rig.fw.pending_interrupts(), 0);
}

#[test]
fn several_raised_mailboxes_in_one_interrupt() {
    let rig = Rig::new();
    for (mailbox, service_id, command_id) in [
        (1, service::DVFS, command::dvfs::REQUEST_APE_OPP100_VOLTAGE),
        (6, service::USB, command::usb::PHY_DISABLE),
    ] {
        rig.prcmu
            .call_nowait(mailbox, service_id, command_id, &[])
            .unwrap();
        let id = MailboxId::new(mailbox).unwrap();
        let seen = rig.fw.take_request(id).unwrap();
        rig.fw.ack(id, seen.service_id, seen.command_id, status::SUCCESS, &[]);
        rig.fw.raise(id);
    }

    assert_eq!(rig.prcmu.handle_irq().handled, 0b0100_0010);
    assert_eq!(rig.prcmu.mailbox_state(1), Some(MailboxState::Idle));
    assert_eq!(rig.prcmu.mailbox_state(6), Some(MailboxState::Idle));
    assert_eq!(rig.prcmu.handle_irq().handled, 0);
}

#[test]
fn executing_is_observed() {
    let rig = Rig::new();
    rig.prcmu
        .call_nowait(3, service::CLOCK, command::clock::SET_SYSCLK, &[1])
        .unwrap();
    rig.fw.take_request(MailboxId::CLOCK).unwrap();
    rig.fw
        .set_response_state(MailboxId::CLOCK, MailboxState::Executing as u8);
    rig.fw.raise(MailboxId::CLOCK);

    rig.prcmu.handle_irq();
    assert_eq!(rig.prcmu.mailbox_state(3), Some(MailboxState::Executing));
}

#[test]
#[serial]
fn garbage_header_is_logged_and_cleared() {
    let logs = capture_logs();
    let rig = Rig::new();
    rig.fw.set_response_state(MailboxId::MODEM, 0xEE);
    rig.fw.raise(MailboxId::MODEM);

    assert_eq!(rig.prcmu.handle_irq().handled, 0x80);
    assert!(logs.contains(Level::Warn, "unknown message"));
    assert_eq!(rig.fw.pending_interrupts(), 0);
    assert_eq!(rig.prcmu.handle_irq().handled, 0);
}

#[test]
#[serial]
fn unknown_notification_is_released() {
    let logs = capture_logs();
    let rig = Rig::new();
    rig.fw.notify(MailboxId::I2C, 0x42, 0x42, &[1, 2, 3]);
    rig.fw.raise(MailboxId::I2C);

    rig.prcmu.handle_irq();
    assert!(logs.contains(Level::Warn, "unknown message"));
    assert_eq!(rig.fw.nfy_state(MailboxId::I2C), NotifyState::Idle as u8);
    assert_eq!(rig.fw.pending_interrupts(), 0);
}

#[test]
#[serial]
fn oversize_ack_fails_the_caller() {
    let logs = capture_logs();
    let rig = Rig::new();
    let fw = rig.fw.clone();
    let prcmu = rig.prcmu.clone();
    let coprocessor = thread::spawn(move || {
        let seen = fw.wait_request(MailboxId::THERMAL, Duration::from_secs(2)).unwrap();
        fw.ack(MailboxId::THERMAL, seen.service_id, seen.command_id, status::SUCCESS, &[42]);
        fw.set_response_len(MailboxId::THERMAL, 0xFFFF);
        fw.raise(MailboxId::THERMAL);
        prcmu.handle_irq()
    });

    let reply = rig.prcmu.call(
        4,
        service::THERMAL,
        command::thermal::GET_TEMP,
        &[],
        Duration::from_secs(1),
    );

    assert_eq!(reply, Err(CallError::ProtocolMismatch));
    assert_eq!(coprocessor.join().unwrap().handled, 0x10);
    assert!(logs.contains(Level::Warn, "ack claims 65535 payload bytes"));
    assert_eq!(rig.prcmu.mailbox_state(4), Some(MailboxState::Idle));
    assert_eq!(rig.fw.response_state(MailboxId::THERMAL), MailboxState::Idle as u8);
    assert_eq!(rig.fw.pending_interrupts(), 0);
}

#[test]
#[serial]
fn oversize_notification_is_dropped() {
    let logs = capture_logs();
    let rig = Rig::new();
    let calls = Arc::new(Mutex::new(0));
    {
        let calls = calls.clone();
        rig.prcmu
            .subscribe(service::THERMAL, move |_| *calls.lock().unwrap() += 1);
    }
    rig.fw
        .notify(MailboxId::THERMAL, service::THERMAL, command::thermal::HOTMON_EVENT, &[1]);
    rig.fw.set_response_len(MailboxId::THERMAL, 0xFFFF);
    rig.fw.raise(MailboxId::THERMAL);

    assert_eq!(
        rig.prcmu.handle_irq(),
        IrqStatus {
            handled: 0x10,
            deferred: DeferredWork::empty()
        }
    );
    assert!(logs.contains(Level::Warn, "malformed notification"));
    assert_eq!(*calls.lock().unwrap(), 0);
    assert_eq!(rig.fw.nfy_state(MailboxId::THERMAL), NotifyState::Idle as u8);
    assert_eq!(rig.fw.pending_interrupts(), 0);
}

#[test]
fn notification_without_subscriber_is_released() {
    let rig = Rig::new();
    rig.fw
        .notify(MailboxId::THERMAL, service::THERMAL, command::thermal::HOTMON_EVENT, &[0]);
    rig.fw.raise(MailboxId::THERMAL);

    assert_eq!(rig.prcmu.handle_irq().handled, 0x10);
    assert_eq!(rig.fw.nfy_state(MailboxId::THERMAL), NotifyState::Idle as u8);
    assert_eq!(rig.prcmu.mailbox_state(4), Some(MailboxState::Idle));
    assert_eq!(rig.fw.pending_interrupts(), 0);
    assert!(rig.prcmu.pending_work().is_empty());
}

#[test]
fn notifications_reach_matching_subscribers() {
    let rig = Rig::new();
    let thermal = Arc::new(Mutex::new(Vec::new()));
    let modem = Arc::new(Mutex::new(0));
    {
        let thermal = thermal.clone();
        rig.prcmu.subscribe(service::THERMAL, move |n| {
            assert_eq!(n.message, Message::HotmonEvent);
            thermal.lock().unwrap().push(n.event());
        });
        let modem = modem.clone();
        rig.prcmu
            .subscribe(service::MODEM, move |_| *modem.lock().unwrap() += 1);
    }

    rig.fw
        .notify(MailboxId::THERMAL, service::THERMAL, command::thermal::HOTMON_EVENT, &[1]);
    rig.fw.raise(MailboxId::THERMAL);
    rig.prcmu.handle_irq();

    assert_eq!(*thermal.lock().unwrap(), vec![Some(Event::Hotmon { high: true })]);
    assert_eq!(*modem.lock().unwrap(), 0);
    assert_eq!(rig.fw.nfy_state(MailboxId::THERMAL), NotifyState::Idle as u8);
    assert_eq!(rig.prcmu.mailbox_state(4), Some(MailboxState::Idle));
    assert!(rig.prcmu.pending_work().is_empty());
}

#[test]
fn wakeup_notification_defers_its_ack() {
    let rig = Rig::new();
    let seen = Arc::new(Mutex::new(None));
    {
        let seen = seen.clone();
        rig.prcmu
            .subscribe(service::WAKEUP, move |n| *seen.lock().unwrap() = n.event());
    }
    let sources = WakeupSources::RTC | WakeupSources::GPIO3;
    rig.fw.notify(
        MailboxId::POWER,
        service::WAKEUP,
        command::wakeup::EVENT_EXEC,
        &sources.bits().to_le_bytes(),
    );
    rig.fw.raise(MailboxId::POWER);

    assert_eq!(
        rig.prcmu.handle_irq(),
        IrqStatus {
            handled: 0x01,
            deferred: DeferredWork::WAKEUP_ACK
        }
    );
    // Nothing was sent from interrupt context.
    assert_eq!(rig.fw.regs.total_rings(), 0);
    assert_eq!(rig.prcmu.pending_work(), DeferredWork::WAKEUP_ACK);
    assert_eq!(
        *seen.lock().unwrap(),
        Some(Event::Wakeup {
            sleep: false,
            sources
        })
    );

    assert_eq!(rig.prcmu.run_deferred(), Ok(DeferredWork::WAKEUP_ACK));
    let ack = rig.fw.take_request(MailboxId::POWER).unwrap();
    assert_eq!(ack.service_id, service::WAKEUP);
    assert_eq!(ack.command_id, command::wakeup::READ_ACK);
    assert!(rig.prcmu.pending_work().is_empty());
    assert_eq!(rig.prcmu.run_deferred(), Ok(DeferredWork::empty()));
}

#[test]
fn repeated_wakeups_before_the_worker_runs_ack_once() {
    let rig = Rig::new();
    for _ in 0..3 {
        rig.fw.notify(
            MailboxId::POWER,
            service::WAKEUP,
            command::wakeup::EVENT_SLEEP,
            &WakeupSources::USB.bits().to_le_bytes(),
        );
        rig.fw.raise(MailboxId::POWER);
        rig.prcmu.handle_irq();
    }

    assert_eq!(rig.prcmu.run_deferred(), Ok(DeferredWork::WAKEUP_ACK));
    assert_eq!(rig.fw.regs.rings(MailboxId::POWER), 1);
}

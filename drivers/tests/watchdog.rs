mod common;

use common::{FakeTimer, Rig, TimerCall, capture_logs};
use drivers::peripheral::prcmu::layout::MailboxId;
use drivers::peripheral::prcmu::protocol::{command, service, status};
use drivers::peripheral::prcmu::{
    DEFAULT_KICK_INTERVAL_US, MailboxState, PrcmuConfig, WatchdogKicker,
};
use log::Level;
use serial_test::serial;

const WATCHDOG_ID: u8 = 1;

fn kicker() -> (WatchdogKicker<FakeTimer>, FakeTimer) {
    let timer = FakeTimer::default();
    let kicker = WatchdogKicker::new(timer.clone(), 0, DEFAULT_KICK_INTERVAL_US, WATCHDOG_ID);
    (kicker, timer)
}

#[test]
fn timer_runs_while_users_remain() {
    let (kicker, timer) = kicker();
    assert!(!kicker.is_active());

    kicker.acquire().unwrap();
    kicker.acquire().unwrap();
    assert!(kicker.is_active());
    assert_eq!(timer.calls(), vec![TimerCall::StartPeriodic(DEFAULT_KICK_INTERVAL_US)]);

    kicker.release().unwrap();
    assert!(kicker.is_active());
    kicker.release().unwrap();
    assert!(!kicker.is_active());
    kicker.release().unwrap();

    assert_eq!(
        timer.calls(),
        vec![TimerCall::StartPeriodic(DEFAULT_KICK_INTERVAL_US), TimerCall::Stop]
    );
}

#[test]
fn inactive_tick_sends_nothing() {
    let rig = Rig::new();
    let (kicker, timer) = kicker();

    assert_eq!(kicker.on_tick(&*rig.prcmu), Ok(false));
    assert_eq!(rig.fw.regs.total_rings(), 0);
    assert_eq!(timer.calls(), vec![TimerCall::Clear]);
}

#[test]
#[serial]
fn tick_kicks_and_skips_while_busy() {
    let logs = capture_logs();
    let rig = Rig::new();
    let (kicker, _timer) = kicker();
    kicker.acquire().unwrap();

    assert_eq!(kicker.on_tick(&*rig.prcmu), Ok(true));
    let kick = rig.fw.take_request(MailboxId::THERMAL).unwrap();
    assert_eq!(kick.service_id, service::WATCHDOG);
    assert_eq!(kick.command_id, command::watchdog::KICK);
    assert_eq!(kick.payload, vec![WATCHDOG_ID]);

    // The first kick is still unanswered.
    assert_eq!(kicker.on_tick(&*rig.prcmu), Ok(false));
    assert!(logs.contains(Level::Debug, "kick skipped"));

    rig.fw.ack(MailboxId::THERMAL, kick.service_id, kick.command_id, status::SUCCESS, &[]);
    rig.fw.raise(MailboxId::THERMAL);
    rig.prcmu.handle_irq();
    assert_eq!(rig.prcmu.mailbox_state(4), Some(MailboxState::Idle));

    assert_eq!(kicker.on_tick(&*rig.prcmu), Ok(true));
    assert_eq!(rig.fw.regs.rings(MailboxId::THERMAL), 2);
}

#[test]
fn held_doorbell_skips_the_kick_after_one_look() {
    // A bound this large would stall the tick if it were spun through.
    let rig = Rig::with_config(
        PrcmuConfig::new()
            .with_busy_wait_bound(u32::MAX)
            .with_fatal_busy_streak(1),
    );
    let (kicker, _timer) = kicker();
    kicker.acquire().unwrap();
    rig.fw.hold_doorbell(MailboxId::THERMAL);

    assert_eq!(kicker.on_tick(&*rig.prcmu), Ok(false));
    assert_eq!(rig.prcmu.mailbox_state(4), Some(MailboxState::Idle));
    assert!(!rig.prcmu.is_faulted());

    rig.fw.release_doorbell(MailboxId::THERMAL);
    assert_eq!(kicker.on_tick(&*rig.prcmu), Ok(true));
}

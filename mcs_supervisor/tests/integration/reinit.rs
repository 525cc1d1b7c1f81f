//! Integration test: power-up locks and reinitialization through resets.

use mcs_common::config::{SettingsDefaults, SupervisorConfig};
use mcs_common::machine::state::MachineState;

use super::harness::{banner, mcs_config, run_session, supervisor_config};

const ALARM_LOCK: &str = "['$H'|'$X' to unlock]";

fn homing_config() -> mcs_common::config::McsConfig {
    let settings = SettingsDefaults {
        homing_enable: true,
        ..Default::default()
    };
    mcs_config(supervisor_config(), settings)
}

#[test]
fn homing_lock_at_power_up() {
    let session = run_session(&homing_config(), b"G0X1\n$X\nG0X1\n", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            ALARM_LOCK.into(),
            "error: Alarm lock".into(),
            "[Caution: Unlocked]".into(),
            "ok".into(),
            "ok".into()
        ]
    );
}

#[test]
fn homing_clears_power_up_lock() {
    let session = run_session(&homing_config(), b"$H\n?", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            ALARM_LOCK.into(),
            "ok".into(),
            "<Idle,MPos:0.000,0.000,0.000>".into()
        ]
    );
}

#[test]
fn forced_alarm_without_homing() {
    let supervisor = SupervisorConfig {
        force_init_alarm: true,
        ..supervisor_config()
    };
    let config = mcs_config(supervisor, SettingsDefaults::default());
    let session = run_session(&config, b"", None);
    assert_eq!(session.lines, [banner(), ALARM_LOCK.to_string()]);
    assert_eq!(session.supervisor.runtime().machine_state(), MachineState::Alarm);
}

#[test]
fn alarm_survives_reset() {
    let session = run_session(&homing_config(), b"\x18$X\n", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            ALARM_LOCK.into(),
            banner(),
            ALARM_LOCK.into(),
            "[Caution: Unlocked]".into(),
            "ok".into()
        ]
    );
}

#[test]
fn reset_drops_partial_line() {
    let config = mcs_config(supervisor_config(), SettingsDefaults::default());
    let session = run_session(&config, b"$100=\x1880\n", None);
    // The tail after the reset arrives as a line of its own.
    assert_eq!(
        session.lines,
        [banner(), banner(), "error: Expected command letter".into()]
    );
}

#[test]
fn leaving_check_mode_reinitializes() {
    let config = mcs_config(supervisor_config(), SettingsDefaults::default());
    let session = run_session(&config, b"$C\nG0X1\n$C\nG0X2\n?", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "[Enabled]".into(),
            "ok".into(),
            // Validated only.
            "ok".into(),
            "[Disabled]".into(),
            "ok".into(),
            banner(),
            "ok".into(),
            "<Idle,MPos:2.000,0.000,0.000>".into()
        ]
    );
    assert_eq!(session.supervisor.runtime().machine_state(), MachineState::Idle);
}

#[test]
fn startup_lines_run_on_every_entry() {
    let config = mcs_config(supervisor_config(), SettingsDefaults::default());
    let session = run_session(&config, b"$N0=G91G0X1\n\x18?", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "ok".into(),
            banner(),
            ">G91G0X1".into(),
            "ok".into(),
            "<Idle,MPos:2.000,0.000,0.000>".into()
        ]
    );
}

#[test]
fn restore_defaults_reinitializes() {
    let config = mcs_config(supervisor_config(), SettingsDefaults::default());
    let session = run_session(&config, b"$100=80\n$RST=$\n", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "ok".into(),
            "[Restoring defaults]".into(),
            "ok".into(),
            banner()
        ]
    );
    assert_eq!(session.settings.value(100), Some(250.0));
}

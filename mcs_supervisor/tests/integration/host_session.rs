//! Integration test: the simulated host driven by a byte stream.

use mcs_common::config::{SettingsDefaults, SupervisorConfig};
use mcs_common::machine::flags::ControlPins;
use mcs_common::machine::state::MachineState;

use super::harness::{banner, mcs_config, run_session, run_session_with_pins, supervisor_config};

fn default_config() -> mcs_common::config::McsConfig {
    mcs_config(supervisor_config(), SettingsDefaults::default())
}

#[test]
fn answers_every_line() {
    let session = run_session(&default_config(), b"$100=80\n$100=80X\ng0 x1\n\n", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "ok".into(),
            "error: Invalid statement".into(),
            "ok".into(),
            "ok".into()
        ]
    );
    assert_eq!(session.settings.value(100), Some(80.0));
}

#[test]
fn realtime_status_report() {
    let session = run_session(&default_config(), b"G0X1Y-0.5\n?", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "ok".into(),
            "<Idle,MPos:1.000,-0.500,0.000>".into()
        ]
    );
}

#[test]
fn realtime_bytes_inside_a_line() {
    // `?` is picked off mid-line; the rest of the line still arrives intact.
    let session = run_session(&default_config(), b"G0X?2\n", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "<Idle,MPos:0.000,0.000,0.000>".into(),
            "ok".into()
        ]
    );
}

#[test]
fn overlong_line_is_dropped() {
    let supervisor = SupervisorConfig {
        line_buffer_size: 6,
        ..supervisor_config()
    };
    let config = mcs_config(supervisor, SettingsDefaults::default());
    let session = run_session(&config, b"G0X1.0000\nG0X1\n", None);
    assert_eq!(
        session.lines,
        [banner(), "error: Line overflow".into(), "ok".into()]
    );
}

#[test]
fn gcode_errors_are_reported() {
    let session = run_session(&default_config(), b"G0X1X2\nQ1\n", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "error: Word repeated".into(),
            "error: Unsupported command".into()
        ]
    );
}

#[test]
fn parser_modes_follow_gcode() {
    let session = run_session(&default_config(), b"G91G20M8\n$G\n", None);
    assert_eq!(session.lines.len(), 4);
    assert!(session.lines[2].starts_with("[G0 G54 G17 G20 G91 G94 M0 M5 M8"));
}

#[test]
fn probe_result_in_parameters() {
    let session = run_session(&default_config(), b"G38.2Z-5F100\n$#\n", Some(-1.0));
    let lines = &session.lines;
    assert_eq!(lines[1], "ok");
    assert_eq!(lines[2], "[G54:0.000,0.000,0.000]");
    assert_eq!(lines[10], "[PRB:0.000,0.000,-1.000:1]");
    assert_eq!(lines[11], "ok");
    assert_eq!(session.supervisor.runtime().machine_state(), MachineState::Idle);
}

#[test]
fn probe_miss_locks_the_machine() {
    let session = run_session(&default_config(), b"G38.2Z-1F100\nG0X1\n", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "ok".into(),
            "ALARM: Probe fail".into(),
            "error: Alarm lock".into()
        ]
    );
    assert_eq!(session.supervisor.runtime().machine_state(), MachineState::Alarm);
}

#[test]
fn build_info_round_trip() {
    let session = run_session(&default_config(), b"$I=SIM\n$I\n", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "ok".into(),
            format!("[{}:SIM]", env!("CARGO_PKG_VERSION")),
            "ok".into()
        ]
    );
}

#[test]
fn open_door_refuses_motion() {
    let settings = SettingsDefaults {
        homing_enable: true,
        ..Default::default()
    };
    let config = mcs_config(supervisor_config(), settings);
    let session = run_session_with_pins(
        &config,
        b"$X\nG0X5\n?",
        None,
        Some(ControlPins::SAFETY_DOOR),
    );
    assert_eq!(
        session.lines,
        [
            banner(),
            "['$H'|'$X' to unlock]".into(),
            "[Caution: Unlocked]".into(),
            "[Check Door]".into(),
            "ok".into(),
            "error: Check Door".into(),
            "<Door,MPos:0.000,0.000,0.000>".into()
        ]
    );
    assert_eq!(
        session.supervisor.runtime().machine_state(),
        MachineState::SafetyDoor
    );
}

#[test]
fn move_beyond_max_travel_is_refused() {
    let session = run_session(&default_config(), b"$132=10\nG0Z8000000\nG0Z-10\n?", None);
    assert_eq!(
        session.lines,
        [
            banner(),
            "ok".into(),
            "error: Travel exceeded".into(),
            "ok".into(),
            "<Idle,MPos:0.000,0.000,-10.000>".into()
        ]
    );
}

//! Integration test: `$` command admission, parsing and dispatch.

use mcs_common::config::SettingsDefaults;
use mcs_common::machine::flags::{ControlPins, ExecFlags};
use mcs_common::machine::state::MachineState;
use mcs_common::machine::status::{FeedbackMessage, StatusCode};

use mcs_supervisor::CommandError;
use mcs_supervisor::collab::SettingsStore;

use super::harness::{MotionCall, Out, Rig, supervisor_config};

// ── Admission ───────────────────────────────────────────────────────

#[test]
fn line_without_prefix_is_invalid() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("G0X1"), Err(CommandError::InvalidStatement));
    assert!(rig.gcode.executed.is_empty());
}

#[test]
fn bare_prefix_prints_help() {
    let mut rig = Rig::new();
    rig.set_state(MachineState::Cycle);
    assert_eq!(rig.exec("$"), Ok(()));
    assert_eq!(rig.take_output(), [Out::Help]);
}

#[test]
fn settings_commands_rejected_while_moving() {
    for state in [MachineState::Cycle, MachineState::Hold, MachineState::Homing] {
        let mut rig = Rig::new();
        rig.set_state(state);
        assert_eq!(rig.exec("$100=80"), Err(CommandError::IdleError), "{state}");
        assert_eq!(rig.exec("$#"), Err(CommandError::IdleError), "{state}");
        assert_eq!(rig.exec("$I"), Err(CommandError::IdleError), "{state}");
        assert_eq!(rig.settings.value(100), Some(250.0));
        assert!(rig.take_output().is_empty());
    }
}

#[test]
fn admission_precedes_syntax() {
    let mut rig = Rig::new();
    rig.set_state(MachineState::Cycle);
    // Malformed, but the state check answers first.
    assert_eq!(rig.exec("$100=8X"), Err(CommandError::IdleError));
}

// ── $$ / $G / $# ────────────────────────────────────────────────────

#[test]
fn dump_settings_in_cycle_is_idle_error() {
    let mut rig = Rig::new();
    rig.set_state(MachineState::Cycle);
    assert_eq!(rig.exec("$$"), Err(CommandError::IdleError));
    assert!(rig.take_output().is_empty());
}

#[test]
fn dump_settings_lists_every_entry() {
    let mut rig = Rig::new();
    rig.set_state(MachineState::Alarm);
    assert_eq!(rig.exec("$$"), Ok(()));
    let out = rig.take_output();
    let [Out::Settings(entries)] = out.as_slice() else {
        panic!("unexpected output {out:?}");
    };
    assert_eq!(entries, &rig.settings.entries());
    assert!(entries.contains(&(100, 250.0)));
}

#[test]
fn parser_modes_in_any_state() {
    let mut rig = Rig::new();
    rig.set_state(MachineState::Cycle);
    assert_eq!(rig.exec("$G"), Ok(()));
    assert_eq!(
        rig.take_output(),
        [Out::Modes("G0 G54 G17 G21 G90 G94".to_string())]
    );
    assert_eq!(rig.exec("$GX"), Err(CommandError::InvalidStatement));
}

#[test]
fn parameters_report() {
    let mut rig = Rig::new();
    rig.settings.set_coordinate_offset(0, [1.0, 2.0, 3.0]);
    rig.rt.probe_succeeded = true;
    assert_eq!(rig.exec("$#"), Ok(()));
    let out = rig.take_output();
    let [Out::Parameters(params)] = out.as_slice() else {
        panic!("unexpected output {out:?}");
    };
    assert_eq!(params.offsets.len(), 8);
    assert_eq!(params.offsets[0].name, "G54");
    assert_eq!(params.offsets[0].offset, [1.0, 2.0, 3.0]);
    assert_eq!(params.probe_position, [0.0; 3]);
    assert!(params.probe_succeeded);
}

// ── Global settings ─────────────────────────────────────────────────

#[test]
fn store_setting() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("$100=80"), Ok(()));
    assert_eq!(rig.settings.value(100), Some(80.0));
    assert!(rig.take_output().is_empty());
}

#[test]
fn store_setting_with_trailing_characters() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("$100=80X"), Err(CommandError::InvalidStatement));
    assert_eq!(rig.settings.value(100), Some(250.0));
}

#[test]
fn store_setting_errors_pass_through() {
    let mut rig = Rig::new();
    assert_eq!(
        rig.exec("$100=-1").map_err(CommandError::status),
        Err(StatusCode::NegativeValue)
    );
    assert_eq!(
        rig.exec("$0=1").map_err(CommandError::status),
        Err(StatusCode::SettingStepPulseMin)
    );
    assert_eq!(
        rig.exec("$20=1").map_err(CommandError::status),
        Err(StatusCode::SoftLimitError)
    );
    assert_eq!(rig.exec("$=5"), Err(CommandError::BadNumberFormat));
    assert_eq!(rig.exec("$300=1"), Err(CommandError::InvalidStatement));
}

// ── $C ──────────────────────────────────────────────────────────────

#[test]
fn check_mode_toggle() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("$C"), Ok(()));
    assert_eq!(rig.state(), MachineState::CheckMode);
    assert_eq!(rig.take_output(), [Out::Feedback(FeedbackMessage::Enabled)]);
    assert!(!rig.reset_pending());

    // Leaving check mode goes through a reset.
    assert_eq!(rig.exec("$C"), Ok(()));
    assert_eq!(rig.take_output(), [Out::Feedback(FeedbackMessage::Disabled)]);
    assert!(rig.reset_pending());
    assert_eq!(rig.state(), MachineState::CheckMode);
}

#[test]
fn check_mode_needs_idle() {
    let mut rig = Rig::new();
    rig.set_state(MachineState::Alarm);
    assert_eq!(rig.exec("$C"), Err(CommandError::IdleError));
    assert_eq!(rig.state(), MachineState::Alarm);
    assert!(rig.take_output().is_empty());
}

// ── $X ──────────────────────────────────────────────────────────────

#[test]
fn unlock_clears_alarm_without_startup() {
    let mut rig = Rig::new();
    rig.settings.store_startup_line(0, "G0X5");
    rig.set_state(MachineState::Alarm);
    assert_eq!(rig.exec("$X"), Ok(()));
    assert_eq!(rig.state(), MachineState::Idle);
    assert_eq!(rig.take_output(), [Out::Feedback(FeedbackMessage::AlarmUnlock)]);
    assert!(rig.gcode.executed.is_empty());
}

#[test]
fn unlock_outside_alarm_is_silent() {
    let mut rig = Rig::new();
    rig.set_state(MachineState::Hold);
    assert_eq!(rig.exec("$X"), Ok(()));
    assert_eq!(rig.state(), MachineState::Hold);
    assert!(rig.take_output().is_empty());
}

#[test]
fn unlock_with_door_ajar_enters_safety_door() {
    let mut rig = Rig::new();
    rig.inputs.0 = ControlPins::SAFETY_DOOR;
    rig.set_state(MachineState::Alarm);
    assert_eq!(rig.exec("$X"), Ok(()));
    // Unlocked to Idle first, with the door request pending for the executor.
    assert_eq!(
        rig.motion.calls,
        [MotionCall::Realtime(MachineState::Idle, ExecFlags::SAFETY_DOOR)]
    );
    assert_eq!(rig.state(), MachineState::SafetyDoor);
}

#[test]
fn door_ignored_when_input_is_feed_hold() {
    let config = mcs_common::config::SupervisorConfig {
        safety_door_input: false,
        ..supervisor_config()
    };
    let mut rig = Rig::with(&config, &SettingsDefaults::default());
    rig.inputs.0 = ControlPins::SAFETY_DOOR;
    rig.set_state(MachineState::Alarm);
    assert_eq!(rig.exec("$X"), Ok(()));
    assert_eq!(rig.motion.realtime_runs, 0);
    assert_eq!(rig.state(), MachineState::Idle);
}

// ── $H ──────────────────────────────────────────────────────────────

#[test]
fn homing_requires_setting() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("$H"), Err(CommandError::SettingDisabled));
    assert_eq!(rig.motion.homing_runs, 0);
    assert_eq!(rig.state(), MachineState::Idle);
}

#[test]
fn homing_runs_startup_lines() {
    let mut rig = Rig::with_homing();
    rig.settings.store_startup_line(0, "G0X5");
    rig.set_state(MachineState::Alarm);

    assert_eq!(rig.exec("$H"), Ok(()));
    assert_eq!(rig.motion.homing_runs, 1);
    assert_eq!(rig.motion.idle_calls, 1);
    assert_eq!(rig.state(), MachineState::Idle);
    assert_eq!(rig.gcode.executed, ["G0X5"]);
    assert_eq!(
        rig.take_output(),
        [Out::Echo("G0X5".to_string()), Out::Status(StatusCode::Ok)]
    );
}

#[test]
fn aborted_homing_skips_startup() {
    let mut rig = Rig::with_homing();
    rig.settings.store_startup_line(0, "G0X5");
    rig.motion.abort_homing = true;

    assert_eq!(rig.exec("$H"), Ok(()));
    assert!(rig.rt.abort);
    assert_eq!(rig.state(), MachineState::Homing);
    assert_eq!(rig.motion.idle_calls, 0);
    assert!(rig.gcode.executed.is_empty());
}

#[test]
fn homing_with_door_ajar_enters_safety_door_first() {
    let mut rig = Rig::with_homing();
    rig.inputs.0 = ControlPins::SAFETY_DOOR;
    rig.set_state(MachineState::Alarm);

    assert_eq!(rig.exec("$H"), Ok(()));
    assert_eq!(
        rig.motion.calls,
        [
            MotionCall::Realtime(MachineState::Homing, ExecFlags::SAFETY_DOOR),
            MotionCall::Homing(MachineState::SafetyDoor, ExecFlags::empty()),
        ]
    );
    assert_eq!(rig.motion.homing_runs, 1);
}

#[test]
fn homing_with_door_closed_skips_realtime() {
    let mut rig = Rig::with_homing();
    rig.set_state(MachineState::Alarm);

    assert_eq!(rig.exec("$H"), Ok(()));
    assert_eq!(
        rig.motion.calls,
        [MotionCall::Homing(MachineState::Homing, ExecFlags::empty())]
    );
}

#[test]
fn homing_with_trailing_characters() {
    let mut rig = Rig::with_homing();
    assert_eq!(rig.exec("$HZ"), Err(CommandError::InvalidStatement));
    assert_eq!(rig.motion.homing_runs, 0);
}

// ── $I ──────────────────────────────────────────────────────────────

#[test]
fn build_info_store_and_print() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("$I=MILL01"), Ok(()));
    assert_eq!(rig.exec("$I"), Ok(()));
    assert_eq!(rig.take_output(), [Out::BuildInfo("MILL01".to_string())]);
}

#[test]
fn build_info_read_failure() {
    let mut rig = Rig::new();
    rig.settings.corrupt_build_info();
    assert_eq!(rig.exec("$I"), Ok(()));
    assert_eq!(
        rig.take_output(),
        [
            Out::Status(StatusCode::SettingReadFail),
            Out::BuildInfo(String::new())
        ]
    );
}

// ── $N ──────────────────────────────────────────────────────────────

#[test]
fn startup_line_is_validated_then_stored() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("$N0=G1X1F100"), Ok(()));
    assert_eq!(rig.gcode.executed, ["G1X1F100"]);
    let stored = rig.settings.read_startup_line(0).unwrap();
    assert_eq!(stored.as_str(), "G1X1F100");
}

#[test]
fn failing_startup_line_is_not_stored() {
    let mut rig = Rig::new();
    rig.gcode.reply = StatusCode::GcodeUnsupportedCommand;
    assert_eq!(
        rig.exec("$N1=G99"),
        Err(CommandError::Rejected(StatusCode::GcodeUnsupportedCommand))
    );
    assert_eq!(rig.settings.read_startup_line(1).unwrap().as_str(), "");
}

#[test]
fn startup_store_needs_idle() {
    let mut rig = Rig::new();
    rig.set_state(MachineState::Alarm);
    assert_eq!(rig.exec("$N0=G0"), Err(CommandError::IdleError));
    assert!(rig.gcode.executed.is_empty());

    // Listing is fine in Alarm.
    assert_eq!(rig.exec("$N"), Ok(()));
    assert_eq!(
        rig.take_output(),
        [
            Out::StartupLine(0, String::new()),
            Out::StartupLine(1, String::new())
        ]
    );
}

#[test]
fn startup_index_out_of_range() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("$N2=G0"), Err(CommandError::InvalidStatement));
    assert_eq!(rig.exec("$N0G0"), Err(CommandError::InvalidStatement));
    assert!(rig.gcode.executed.is_empty());
}

#[test]
fn unreadable_startup_slot() {
    let mut rig = Rig::new();
    rig.settings.store_startup_line(0, "G0X1");
    rig.settings.corrupt_startup_line(1);
    assert_eq!(rig.exec("$N"), Ok(()));
    assert_eq!(
        rig.take_output(),
        [
            Out::StartupLine(0, "G0X1".to_string()),
            Out::Status(StatusCode::SettingReadFail)
        ]
    );

    rig.run_startup();
    assert_eq!(
        rig.take_output(),
        [
            Out::Echo("G0X1".to_string()),
            Out::Status(StatusCode::Ok),
            Out::Status(StatusCode::SettingReadFail)
        ]
    );
}

// ── $RST ────────────────────────────────────────────────────────────

#[test]
fn restore_settings_requests_reset() {
    let mut rig = Rig::new();
    rig.exec("$100=80").unwrap();
    rig.settings.set_coordinate_offset(0, [1.0, 1.0, 1.0]);

    assert_eq!(rig.exec("$RST=$"), Ok(()));
    assert_eq!(rig.settings.value(100), Some(250.0));
    assert_eq!(rig.settings.coordinate_offsets()[0].offset, [1.0, 1.0, 1.0]);
    assert_eq!(
        rig.take_output(),
        [Out::Feedback(FeedbackMessage::RestoreDefaults)]
    );
    assert!(rig.reset_pending());
}

#[test]
fn restore_parameters_and_all() {
    let mut rig = Rig::new();
    rig.exec("$100=80").unwrap();
    rig.exec("$N0=G0").unwrap();
    rig.settings.set_coordinate_offset(2, [4.0, 4.0, 4.0]);

    rig.exec("$RST=#").unwrap();
    assert_eq!(rig.settings.coordinate_offsets()[2].offset, [0.0; 3]);
    assert_eq!(rig.settings.value(100), Some(80.0));

    rig.exec("$RST=*").unwrap();
    assert_eq!(rig.settings.value(100), Some(250.0));
    assert_eq!(rig.settings.read_startup_line(0).unwrap().as_str(), "");
}

#[test]
fn restore_rejects_unknown_scope() {
    let mut rig = Rig::new();
    assert_eq!(rig.exec("$RST=!"), Err(CommandError::InvalidStatement));
    assert_eq!(rig.exec("$RST"), Err(CommandError::InvalidStatement));
    assert!(!rig.reset_pending());
}

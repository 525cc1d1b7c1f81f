//! Command dispatch and the startup script runner.

use mcs_common::config::SupervisorConfig;
use mcs_common::machine::flags::{ExecFlags, SettingsFlags};
use mcs_common::machine::kinematics::{KinematicsKind, steps_to_mpos};
use mcs_common::machine::state::MachineState;
use mcs_common::machine::status::{FeedbackMessage, StatusCode};
use tracing::{debug, info, warn};

use super::parse::{self, SystemCommand};
use crate::collab::{Parameters, Services};
use crate::control_pins::ControlPinHandler;
use crate::error::{CommandError, CommandResult};
use crate::runtime::SystemRuntime;

/// `$` command interpreter.
#[derive(Debug, Clone)]
pub struct Interpreter {
    pins: ControlPinHandler,
    startup_line_count: u8,
    kinematics: KinematicsKind,
}

impl Interpreter {
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            pins: ControlPinHandler::from_config(config),
            startup_line_count: config.startup_line_count,
            kinematics: config.kinematics,
        }
    }

    #[inline]
    pub const fn startup_line_count(&self) -> u8 {
        self.startup_line_count
    }

    /// Execute one `$` line.
    ///
    /// Rejections leave runtime and collaborators untouched; any output
    /// produced before the result is the command's own data.
    pub fn execute_line(
        &self,
        line: &str,
        rt: &mut SystemRuntime,
        svc: &mut Services<'_>,
    ) -> CommandResult {
        let result = self.run(line, rt, svc);
        if let Err(err) = result {
            warn!(line, state = %rt.machine_state(), %err, "system command rejected");
        }
        result
    }

    fn run(&self, line: &str, rt: &mut SystemRuntime, svc: &mut Services<'_>) -> CommandResult {
        let body = line
            .strip_prefix('$')
            .ok_or(CommandError::InvalidStatement)?;
        parse::admit(body, rt.machine_state())?;
        let command = parse::parse(body, self.startup_line_count)?;
        debug!(?command, "system command");
        self.dispatch(command, rt, svc)
    }

    fn dispatch(
        &self,
        command: SystemCommand<'_>,
        rt: &mut SystemRuntime,
        svc: &mut Services<'_>,
    ) -> CommandResult {
        match command {
            SystemCommand::Help => svc.reporter.help(),
            SystemCommand::DumpSettings => {
                if rt.state.is_locked_for_settings_print() {
                    return Err(CommandError::IdleError);
                }
                let entries = svc.settings.entries();
                svc.reporter.settings(&entries);
            }
            SystemCommand::ParserModes => {
                let modes = svc.gcode.parser_modes();
                svc.reporter.parser_modes(&modes);
            }
            SystemCommand::ToggleCheckMode => self.toggle_check_mode(rt, svc)?,
            SystemCommand::Unlock => self.unlock(rt, svc),
            SystemCommand::Parameters => {
                let parameters = self.parameters(rt, svc);
                svc.reporter.parameters(&parameters);
            }
            SystemCommand::Home => self.home(rt, svc)?,
            SystemCommand::BuildInfo => match svc.settings.read_build_info() {
                Some(info) => svc.reporter.build_info(&info),
                None => {
                    svc.reporter.status(StatusCode::SettingReadFail);
                    svc.reporter.build_info("");
                }
            },
            SystemCommand::StoreBuildInfo(info) => svc.settings.store_build_info(info),
            SystemCommand::Restore(scope) => {
                info!(?scope, "restoring defaults");
                svc.settings.restore(scope);
                svc.reporter.feedback(FeedbackMessage::RestoreDefaults);
                rt.shared().request_reset();
            }
            SystemCommand::StartupLines => {
                for index in 0..self.startup_line_count {
                    match svc.settings.read_startup_line(index) {
                        Some(line) => svc.reporter.startup_line(index, &line),
                        None => svc.reporter.status(StatusCode::SettingReadFail),
                    }
                }
            }
            SystemCommand::StoreStartupLine { index, gcode } => {
                // Run once so that only valid blocks are stored.
                svc.gcode
                    .execute_line(gcode, rt)
                    .into_result()
                    .map_err(CommandError::from)?;
                svc.settings.store_startup_line(index, gcode);
            }
            SystemCommand::StoreSetting { index, value } => svc
                .settings
                .store_global_setting(index, value)
                .map_err(CommandError::from)?,
        }
        Ok(())
    }

    fn toggle_check_mode(&self, rt: &mut SystemRuntime, svc: &mut Services<'_>) -> CommandResult {
        if rt.state.is(MachineState::CheckMode) {
            rt.shared().request_reset();
            svc.reporter.feedback(FeedbackMessage::Disabled);
            return Ok(());
        }
        // Idle only: check mode is not a way out of an alarm.
        if !rt.state.is(MachineState::Idle) {
            return Err(CommandError::IdleError);
        }
        rt.state.transition(MachineState::CheckMode);
        svc.reporter.feedback(FeedbackMessage::Enabled);
        Ok(())
    }

    fn unlock(&self, rt: &mut SystemRuntime, svc: &mut Services<'_>) {
        if !rt.state.is(MachineState::Alarm) {
            return;
        }
        svc.reporter.feedback(FeedbackMessage::AlarmUnlock);
        rt.state.transition(MachineState::Idle);
        info!("alarm lock cleared");
        // No startup scripts here: stored moves must not run after an unlock.
        self.enter_door_if_ajar(rt, svc);
    }

    fn home(&self, rt: &mut SystemRuntime, svc: &mut Services<'_>) -> CommandResult {
        if !svc.settings.flags().contains(SettingsFlags::HOMING_ENABLE) {
            return Err(CommandError::SettingDisabled);
        }
        rt.state.transition(MachineState::Homing);
        self.enter_door_if_ajar(rt, svc);

        info!("homing cycle");
        svc.motion.homing_cycle(rt);
        if rt.abort {
            warn!("homing cycle aborted");
            return Ok(());
        }
        rt.state.transition(MachineState::Idle);
        svc.motion.stepper_go_idle();
        self.execute_startup(rt, svc);
        Ok(())
    }

    fn enter_door_if_ajar(&self, rt: &mut SystemRuntime, svc: &mut Services<'_>) {
        if self.pins.safety_door_ajar(svc.inputs.read_control_pins()) {
            rt.shared().signals.raise_exec(ExecFlags::SAFETY_DOOR);
            svc.motion.execute_realtime(rt);
        }
    }

    fn parameters(&self, rt: &SystemRuntime, svc: &Services<'_>) -> Parameters {
        let probe_steps = rt.shared().probe.position();
        Parameters {
            offsets: svc.settings.coordinate_offsets(),
            probe_position: steps_to_mpos(
                self.kinematics.mapping(),
                &probe_steps,
                &svc.settings.steps_per_mm(),
            ),
            probe_succeeded: rt.probe_succeeded,
        }
    }

    /// Run the stored startup lines.
    ///
    /// Each non-empty slot is echoed, executed and answered with its own
    /// status. Unreadable slots report `SettingReadFail`.
    pub fn execute_startup(&self, rt: &mut SystemRuntime, svc: &mut Services<'_>) {
        for index in 0..self.startup_line_count {
            let Some(line) = svc.settings.read_startup_line(index) else {
                warn!(index, "startup line unreadable");
                svc.reporter.status(StatusCode::SettingReadFail);
                continue;
            };
            if line.is_empty() {
                continue;
            }
            svc.reporter.startup_echo(&line);
            let status = svc.gcode.execute_line(&line, rt);
            if !status.is_ok() {
                warn!(index, line = line.as_str(), %status, "startup line failed");
            }
            svc.reporter.status(status);
        }
    }
}

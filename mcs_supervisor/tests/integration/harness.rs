//! Recording collaborators and a test rig around the interpreter.

use std::sync::Arc;

use mcs_common::config::{LogLevel, McsConfig, SettingsDefaults, SharedConfig, SupervisorConfig};
use mcs_common::consts::N_AXIS;
use mcs_common::machine::flags::{AlarmFlags, ControlPins, ExecFlags};
use mcs_common::machine::state::MachineState;
use mcs_common::machine::status::{FeedbackMessage, StatusCode};

use mcs_supervisor::collab::{
    ControlInputs, GcodeExecutor, MotionControl, Parameters, Reporter, Services,
};
use mcs_supervisor::sim::{MemorySettings, SimHost};
use mcs_supervisor::{CommandResult, Interpreter, SharedRuntime, Supervisor, SystemRuntime};

// ── Recorded output ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Out {
    Status(StatusCode),
    Feedback(FeedbackMessage),
    Help,
    Settings(Vec<(u8, f32)>),
    Modes(String),
    Parameters(Parameters),
    BuildInfo(String),
    StartupLine(u8, String),
    Echo(String),
    Realtime(MachineState),
    Alarm(AlarmFlags),
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub out: Vec<Out>,
}

impl Reporter for RecordingReporter {
    fn status(&mut self, status: StatusCode) {
        self.out.push(Out::Status(status));
    }
    fn feedback(&mut self, message: FeedbackMessage) {
        self.out.push(Out::Feedback(message));
    }
    fn help(&mut self) {
        self.out.push(Out::Help);
    }
    fn settings(&mut self, entries: &[(u8, f32)]) {
        self.out.push(Out::Settings(entries.to_vec()));
    }
    fn parser_modes(&mut self, modes: &str) {
        self.out.push(Out::Modes(modes.to_string()));
    }
    fn parameters(&mut self, parameters: &Parameters) {
        self.out.push(Out::Parameters(parameters.clone()));
    }
    fn build_info(&mut self, info: &str) {
        self.out.push(Out::BuildInfo(info.to_string()));
    }
    fn startup_line(&mut self, index: u8, line: &str) {
        self.out.push(Out::StartupLine(index, line.to_string()));
    }
    fn startup_echo(&mut self, line: &str) {
        self.out.push(Out::Echo(line.to_string()));
    }
    fn realtime_status(&mut self, state: MachineState, _mpos: &[f32; N_AXIS]) {
        self.out.push(Out::Realtime(state));
    }
    fn alarm(&mut self, alarm: AlarmFlags) {
        self.out.push(Out::Alarm(alarm));
    }
}

/// Records every executed line and answers with a fixed status.
#[derive(Debug)]
pub struct StubGcode {
    pub executed: Vec<String>,
    pub reply: StatusCode,
}

impl Default for StubGcode {
    fn default() -> Self {
        Self {
            executed: Vec::new(),
            reply: StatusCode::Ok,
        }
    }
}

impl GcodeExecutor for StubGcode {
    fn execute_line(&mut self, line: &str, _rt: &mut SystemRuntime) -> StatusCode {
        self.executed.push(line.to_string());
        self.reply
    }

    fn parser_modes(&self) -> String {
        "G0 G54 G17 G21 G90 G94".to_string()
    }
}

/// One motion call, with the state and pending exec flags seen on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionCall {
    Realtime(MachineState, ExecFlags),
    Homing(MachineState, ExecFlags),
}

#[derive(Debug, Default)]
pub struct StubMotion {
    pub homing_runs: usize,
    pub abort_homing: bool,
    pub idle_calls: usize,
    pub realtime_runs: usize,
    pub calls: Vec<MotionCall>,
}

fn entry(rt: &SystemRuntime) -> (MachineState, ExecFlags) {
    (rt.machine_state(), rt.shared().signals.pending_exec())
}

impl MotionControl for StubMotion {
    fn homing_cycle(&mut self, rt: &mut SystemRuntime) {
        let (state, pending) = entry(rt);
        self.calls.push(MotionCall::Homing(state, pending));
        self.homing_runs += 1;
        if self.abort_homing {
            rt.abort = true;
        }
    }

    fn stepper_go_idle(&mut self) {
        self.idle_calls += 1;
    }

    fn execute_realtime(&mut self, rt: &mut SystemRuntime) {
        let (state, pending) = entry(rt);
        self.calls.push(MotionCall::Realtime(state, pending));
        self.realtime_runs += 1;
        if rt.shared().signals.drain_exec().contains(ExecFlags::SAFETY_DOOR) {
            rt.state.transition(MachineState::SafetyDoor);
        }
    }
}

#[derive(Debug, Default)]
pub struct StubInputs(pub ControlPins);

impl ControlInputs for StubInputs {
    fn read_control_pins(&self) -> ControlPins {
        self.0
    }
}

// ── Rig ─────────────────────────────────────────────────────────────

/// Interpreter plus one of each collaborator.
pub struct Rig {
    pub rt: SystemRuntime,
    pub interpreter: Interpreter,
    pub reporter: RecordingReporter,
    pub settings: MemorySettings,
    pub gcode: StubGcode,
    pub motion: StubMotion,
    pub inputs: StubInputs,
}

/// Supervisor options used by most tests: door input on, no inversion.
pub fn supervisor_config() -> SupervisorConfig {
    SupervisorConfig {
        safety_door_input: true,
        control_invert: Vec::new(),
        ..Default::default()
    }
}

impl Rig {
    pub fn new() -> Self {
        Self::with(&supervisor_config(), &SettingsDefaults::default())
    }

    pub fn with_homing() -> Self {
        let defaults = SettingsDefaults {
            homing_enable: true,
            ..Default::default()
        };
        Self::with(&supervisor_config(), &defaults)
    }

    pub fn with(config: &SupervisorConfig, defaults: &SettingsDefaults) -> Self {
        Self {
            rt: SystemRuntime::new(Arc::new(SharedRuntime::new())),
            interpreter: Interpreter::new(config),
            reporter: RecordingReporter::default(),
            settings: MemorySettings::new(defaults, config.startup_line_count),
            gcode: StubGcode::default(),
            motion: StubMotion::default(),
            inputs: StubInputs::default(),
        }
    }

    pub fn exec(&mut self, line: &str) -> CommandResult {
        let mut svc = Services {
            reporter: &mut self.reporter,
            settings: &mut self.settings,
            gcode: &mut self.gcode,
            motion: &mut self.motion,
            inputs: &self.inputs,
        };
        self.interpreter.execute_line(line, &mut self.rt, &mut svc)
    }

    pub fn run_startup(&mut self) {
        let mut svc = Services {
            reporter: &mut self.reporter,
            settings: &mut self.settings,
            gcode: &mut self.gcode,
            motion: &mut self.motion,
            inputs: &self.inputs,
        };
        self.interpreter.execute_startup(&mut self.rt, &mut svc);
    }

    pub fn state(&self) -> MachineState {
        self.rt.machine_state()
    }

    pub fn set_state(&mut self, state: MachineState) {
        self.rt.state.transition(state);
    }

    pub fn take_output(&mut self) -> Vec<Out> {
        std::mem::take(&mut self.reporter.out)
    }

    pub fn reset_pending(&self) -> bool {
        self.rt
            .shared()
            .signals
            .pending_exec()
            .contains(ExecFlags::RESET)
    }
}

// ── Host sessions ───────────────────────────────────────────────────

pub fn mcs_config(supervisor: SupervisorConfig, settings: SettingsDefaults) -> McsConfig {
    McsConfig {
        shared: SharedConfig {
            log_level: LogLevel::Info,
            service_name: "mcs-test".to_string(),
        },
        supervisor,
        settings,
    }
}

/// Outcome of one complete run over a byte script.
pub struct Session {
    pub lines: Vec<String>,
    pub supervisor: Supervisor,
    pub settings: MemorySettings,
}

/// Power up, then run the supervisor over `input` until it is exhausted.
pub fn run_session(config: &McsConfig, input: &[u8], probe_surface: Option<f32>) -> Session {
    run_session_with_pins(config, input, probe_surface, None)
}

/// As [`run_session`], with the raw control port held at `pins` throughout.
pub fn run_session_with_pins(
    config: &McsConfig,
    input: &[u8],
    probe_surface: Option<f32>,
    pins: Option<ControlPins>,
) -> Session {
    let mut supervisor = Supervisor::new(&config.supervisor);
    supervisor.power_up(config.settings.flags());
    let mut host = SimHost::new(
        config,
        supervisor.shared(),
        input,
        Vec::new(),
        probe_surface,
    );
    if let Some(pins) = pins {
        host.inputs().set(pins);
    }
    supervisor.run(&mut host);

    let settings = host.settings().clone();
    let output = String::from_utf8(host.into_output()).unwrap();
    Session {
        lines: output.lines().map(str::to_string).collect(),
        supervisor,
        settings,
    }
}

pub fn banner() -> String {
    format!("MCS {} ['$' for help]", env!("CARGO_PKG_VERSION"))
}

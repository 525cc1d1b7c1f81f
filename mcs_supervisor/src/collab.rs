//! Collaborator interfaces.
//!
//! The supervisor core owns state and arbitration only. Everything it drives
//! (reporting, settings storage, the g-code executor, motion control, the
//! control inputs and the surrounding host) sits behind the traits below.

use mcs_common::consts::{LINE_BUFFER_CAPACITY, N_AXIS};
use mcs_common::machine::flags::{AlarmFlags, ControlPins, SettingsFlags};
use mcs_common::machine::state::MachineState;
use mcs_common::machine::status::{FeedbackMessage, StatusCode};

use crate::runtime::SystemRuntime;

/// Fixed-capacity text of a stored line (startup line, build info).
pub type StoredLine = heapless::String<LINE_BUFFER_CAPACITY>;

/// What `$RST=` restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestoreScope {
    /// `$RST=$`: global settings.
    Settings,
    /// `$RST=#`: coordinate parameters.
    Parameters,
    /// `$RST=*`: settings, parameters, startup lines and build info.
    All,
}

impl RestoreScope {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'$' => Some(Self::Settings),
            b'#' => Some(Self::Parameters),
            b'*' => Some(Self::All),
            _ => None,
        }
    }
}

/// Coordinate offset row of the `$#` report.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateOffset {
    pub name: &'static str,
    pub offset: [f32; N_AXIS],
}

/// Data of the `$#` report.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub offsets: Vec<CoordinateOffset>,
    /// Machine position of the last probe contact [mm].
    pub probe_position: [f32; N_AXIS],
    pub probe_succeeded: bool,
}

// ─── Reporter ───────────────────────────────────────────────────────

/// Formats responses for the host.
pub trait Reporter {
    fn status(&mut self, status: StatusCode);
    fn feedback(&mut self, message: FeedbackMessage);
    fn help(&mut self);
    /// `$$`: every global setting as `(index, value)`.
    fn settings(&mut self, entries: &[(u8, f32)]);
    fn parser_modes(&mut self, modes: &str);
    fn parameters(&mut self, parameters: &Parameters);
    fn build_info(&mut self, info: &str);
    fn startup_line(&mut self, index: u8, line: &str);
    /// Echo of a startup line about to run.
    fn startup_echo(&mut self, line: &str);
    /// Answer to a realtime status request.
    fn realtime_status(&mut self, state: MachineState, mpos: &[f32; N_AXIS]);
    fn alarm(&mut self, alarm: AlarmFlags);
}

// ─── Settings Store ─────────────────────────────────────────────────

/// Persistent settings.
pub trait SettingsStore {
    fn flags(&self) -> SettingsFlags;
    fn steps_per_mm(&self) -> [f32; N_AXIS];
    /// Every global setting as `(index, value)`, ascending.
    fn entries(&self) -> Vec<(u8, f32)>;
    fn store_global_setting(&mut self, index: u8, value: f32) -> Result<(), StatusCode>;
    fn restore(&mut self, scope: RestoreScope);
    /// `None` when the slot fails to read.
    fn read_startup_line(&self, index: u8) -> Option<StoredLine>;
    fn store_startup_line(&mut self, index: u8, line: &str);
    /// `None` when the record fails to read.
    fn read_build_info(&self) -> Option<StoredLine>;
    fn store_build_info(&mut self, info: &str);
    /// Stored coordinate systems, as printed by `$#`.
    fn coordinate_offsets(&self) -> Vec<CoordinateOffset>;
}

// ─── G-code Executor ────────────────────────────────────────────────

/// Block parser and executor.
pub trait GcodeExecutor {
    fn execute_line(&mut self, line: &str, rt: &mut SystemRuntime) -> StatusCode;
    /// Active modal state, as printed by `$G`.
    fn parser_modes(&self) -> String;
}

// ─── Motion Control ─────────────────────────────────────────────────

/// Motion layer entry points used by the supervisor.
pub trait MotionControl {
    /// Run the homing cycle. Sets `rt.abort` on failure or reset.
    fn homing_cycle(&mut self, rt: &mut SystemRuntime);
    /// Put the steppers into their configured idle state.
    fn stepper_go_idle(&mut self);
    /// Drain and act on pending realtime signals.
    fn execute_realtime(&mut self, rt: &mut SystemRuntime);
}

/// Raw control-port reader.
pub trait ControlInputs {
    fn read_control_pins(&self) -> ControlPins;
}

/// Collaborators borrowed for one command.
pub struct Services<'a> {
    pub reporter: &'a mut dyn Reporter,
    pub settings: &'a mut dyn SettingsStore,
    pub gcode: &'a mut dyn GcodeExecutor,
    pub motion: &'a mut dyn MotionControl,
    pub inputs: &'a dyn ControlInputs,
}

// ─── Host ───────────────────────────────────────────────────────────

/// Why the main loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// `abort` was set: reinitialize and re-enter.
    Abort,
    /// Input exhausted; leave the supervisor.
    Shutdown,
}

/// Platform around the supervisor.
///
/// Reinitialization calls the hooks in declaration order. Hooks default to
/// no-ops for subsystems a host does not model.
pub trait Host {
    fn reset_line_buffer(&mut self) {}
    fn gcode_init(&mut self) {}
    fn spindle_init(&mut self) {}
    fn coolant_init(&mut self) {}
    fn limits_init(&mut self) {}
    fn probe_init(&mut self) {}
    fn planner_reset(&mut self) {}
    fn stepper_reset(&mut self) {}
    fn planner_sync_position(&mut self, _rt: &SystemRuntime) {}
    fn gcode_sync_position(&mut self, _rt: &SystemRuntime) {}

    /// Line-processing loop. Returns when `rt.abort` is set or input ends.
    fn main_loop(&mut self, rt: &mut SystemRuntime) -> LoopExit;
}

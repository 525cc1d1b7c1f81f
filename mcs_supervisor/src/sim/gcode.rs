//! Minimal g-code executor.
//!
//! Enough of the block language to drive the simulation: modal words,
//! straight moves and probing moves. Moves are stepped one motor step per
//! tick with no acceleration; each tick runs the probe watcher.

use mcs_common::consts::{N_AXIS, PROBE_MASK, X_AXIS, Y_AXIS, Z_AXIS};
use mcs_common::machine::Position;
use mcs_common::machine::flags::{AlarmFlags, ExecFlags, SettingsFlags};
use mcs_common::machine::kinematics::{KinematicsKind, steps_to_mpos};
use mcs_common::machine::state::{MachineState, ProbeState};
use mcs_common::machine::status::StatusCode;
use tracing::debug;

use crate::collab::GcodeExecutor;
use crate::command::read_float;
use crate::runtime::SystemRuntime;

const MM_PER_INCH: f32 = 25.4;

/// Max travel [mm] per axis until the store says otherwise.
pub const DEFAULT_MAX_TRAVEL: f32 = 200.0;

// ─── Modal State ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Seek,
    Linear,
    /// Probe toward the workpiece (`G38.2`) or away from it (`G38.4`).
    Probe { away: bool },
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Modal {
    motion: Motion,
    coord_select: u8,
    plane: u8,
    inches: bool,
    incremental: bool,
    inverse_time: bool,
    program_flow: u8,
    spindle: u8,
    coolant: u8,
    tool: u32,
    feed_rate: f32,
    spindle_speed: f32,
}

impl Default for Modal {
    fn default() -> Self {
        Self {
            motion: Motion::Seek,
            coord_select: 0,
            plane: 17,
            inches: false,
            incremental: false,
            inverse_time: false,
            program_flow: 0,
            spindle: 5,
            coolant: 9,
            tool: 0,
            feed_rate: 0.0,
            spindle_speed: 0.0,
        }
    }
}

/// Modal groups, one bit each, for repeated-word detection.
mod group {
    pub const MOTION: u16 = 1 << 0;
    pub const PLANE: u16 = 1 << 1;
    pub const DISTANCE: u16 = 1 << 2;
    pub const FEED_MODE: u16 = 1 << 3;
    pub const UNITS: u16 = 1 << 4;
    pub const COORD: u16 = 1 << 5;
    pub const NON_MODAL: u16 = 1 << 6;
    pub const STOPPING: u16 = 1 << 7;
    pub const SPINDLE: u16 = 1 << 8;
    pub const COOLANT: u16 = 1 << 9;
}

/// One parsed block.
#[derive(Debug, Default)]
struct Block {
    modal: Modal,
    groups: u16,
    axis_words: [Option<f32>; N_AXIS],
    program_end: bool,
}

// ─── Executor ───────────────────────────────────────────────────────

/// Simulated g-code executor.
#[derive(Debug, Clone)]
pub struct SimGcode {
    modal: Modal,
    /// Programmed position [mm], machine frame.
    position: [f32; N_AXIS],
    kinematics: KinematicsKind,
    steps_per_mm: [f32; N_AXIS],
    /// Largest accepted |target| [mm] per axis.
    max_travel: [f32; N_AXIS],
    settings: SettingsFlags,
    /// Height [mm] at which the simulated probe touches the workpiece.
    probe_surface: Option<f32>,
}

impl SimGcode {
    pub fn new(kinematics: KinematicsKind, probe_surface: Option<f32>) -> Self {
        Self {
            modal: Modal::default(),
            position: [0.0; N_AXIS],
            kinematics,
            steps_per_mm: [1.0; N_AXIS],
            max_travel: [DEFAULT_MAX_TRAVEL; N_AXIS],
            settings: SettingsFlags::empty(),
            probe_surface,
        }
    }

    /// Refresh the settings the executor consults.
    pub fn sync_settings(&mut self, settings: SettingsFlags, steps_per_mm: [f32; N_AXIS]) {
        self.settings = settings;
        self.steps_per_mm = steps_per_mm;
    }

    pub fn set_max_travel(&mut self, max_travel: [f32; N_AXIS]) {
        self.max_travel = max_travel;
    }

    /// Back to power-on modal state.
    pub fn reset_modes(&mut self) {
        self.modal = Modal::default();
    }

    /// Take the programmed position from the step counters.
    pub fn sync_position(&mut self, rt: &SystemRuntime) {
        self.position = steps_to_mpos(
            self.kinematics.mapping(),
            &rt.shared().position.snapshot(),
            &self.steps_per_mm,
        );
    }

    #[inline]
    pub fn position(&self) -> [f32; N_AXIS] {
        self.position
    }

    fn parse_block(&self, line: &str) -> Result<Block, StatusCode> {
        let bytes = line.as_bytes();
        let mut block = Block::default();
        let mut modal = self.modal;
        let mut cursor = 0;

        while let Some(&letter) = bytes.get(cursor) {
            if !letter.is_ascii_uppercase() {
                return Err(StatusCode::ExpectedCommandLetter);
            }
            cursor += 1;
            let value = read_float(bytes, &mut cursor).ok_or(StatusCode::BadNumberFormat)?;
            // G38.2 → 382; everything else is an integer word.
            let code = (value * 10.0).round() as i32;

            let group = match letter {
                b'G' => apply_g(&mut modal, code)?,
                b'M' => {
                    let group = apply_m(&mut modal, code)?;
                    block.program_end |= matches!(code, 20 | 300);
                    group
                }
                b'F' => {
                    modal.feed_rate = value;
                    0
                }
                b'S' => {
                    modal.spindle_speed = value;
                    0
                }
                b'T' => {
                    modal.tool = value as u32;
                    0
                }
                b'P' => 0,
                b'X' | b'Y' | b'Z' => {
                    let axis = match letter {
                        b'X' => X_AXIS,
                        b'Y' => Y_AXIS,
                        _ => Z_AXIS,
                    };
                    if block.axis_words[axis].replace(value).is_some() {
                        return Err(StatusCode::GcodeWordRepeated);
                    }
                    0
                }
                _ => return Err(StatusCode::GcodeUnsupportedCommand),
            };
            if block.groups & group != 0 {
                return Err(StatusCode::GcodeWordRepeated);
            }
            block.groups |= group;
        }
        block.modal = modal;
        Ok(block)
    }

    fn target(&self, modal: &Modal, words: &[Option<f32>; N_AXIS]) -> [f32; N_AXIS] {
        let scale = if modal.inches { MM_PER_INCH } else { 1.0 };
        core::array::from_fn(|axis| match words[axis] {
            Some(v) if modal.incremental => self.position[axis] + v * scale,
            Some(v) => v * scale,
            None => self.position[axis],
        })
    }

    fn within_travel(&self, target: &[f32; N_AXIS]) -> bool {
        // NaN compares false and is refused too.
        target
            .iter()
            .zip(&self.max_travel)
            .all(|(t, max)| t.abs() <= *max)
    }

    /// Motor step targets, or `TravelExceeded` when they leave the counter range.
    fn motor_target(&self, target: &[f32; N_AXIS]) -> Result<Position, StatusCode> {
        let mut axis = [0i64; N_AXIS];
        for (i, steps) in axis.iter_mut().enumerate() {
            let exact = (f64::from(target[i]) * f64::from(self.steps_per_mm[i])).round();
            if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&exact) {
                return Err(StatusCode::TravelExceeded);
            }
            *steps = exact as i64;
        }
        let motors = match self.kinematics {
            KinematicsKind::Cartesian => axis,
            KinematicsKind::CoreXy => [
                axis[X_AXIS] + axis[Y_AXIS],
                axis[X_AXIS] - axis[Y_AXIS],
                axis[Z_AXIS],
            ],
        };
        let mut out: Position = [0; N_AXIS];
        for (dst, src) in out.iter_mut().zip(motors) {
            *dst = i32::try_from(src).map_err(|_| StatusCode::TravelExceeded)?;
        }
        Ok(out)
    }

    /// Simulated probe input level for the current step position.
    fn probe_level(&self, steps: &Position) -> u8 {
        let z = steps[Z_AXIS] as f32 / self.steps_per_mm[Z_AXIS];
        let touching = self.probe_surface.is_some_and(|surface| z <= surface);
        // Normally-open probe pulls the input low on contact.
        let high = touching == self.settings.contains(SettingsFlags::INVERT_PROBE_PIN);
        if high { PROBE_MASK } else { 0 }
    }

    /// Step toward `target`. A probing move stops at contact.
    fn step_to(&self, target: &Position, rt: &SystemRuntime, probing: bool) {
        let shared = rt.shared();
        loop {
            let now = shared.position.snapshot();
            if now == *target {
                return;
            }
            for motor in 0..N_AXIS {
                let delta = (target[motor] - now[motor]).signum();
                if delta != 0 {
                    shared.position.step(motor, delta);
                }
            }
            let steps = shared.position.snapshot();
            shared.stepper_tick(&|| self.probe_level(&steps));
            if probing && shared.probe.state() == ProbeState::Off {
                return;
            }
        }
    }

    fn run_motion(&mut self, motors: Position, rt: &mut SystemRuntime) {
        let prior = rt.state.transition(MachineState::Cycle);

        match self.modal.motion {
            Motion::Probe { away } => {
                let probe = &rt.shared().probe;
                probe.configure_invert_mask(away, self.settings);
                let level = self.probe_level(&rt.shared().position.snapshot());
                if probe.triggered(level) {
                    // Already in the end state: the move cannot make contact.
                    rt.shared().signals.raise_alarm(AlarmFlags::PROBE_FAIL);
                    rt.state.transition(prior);
                    return;
                }
                probe.start(away, self.settings);
                self.step_to(&motors, rt, true);

                rt.probe_succeeded = rt.shared().probe.state() == ProbeState::Off
                    && rt
                        .shared()
                        .signals
                        .pending_exec()
                        .contains(ExecFlags::MOTION_CANCEL);
                if !rt.probe_succeeded {
                    rt.shared().probe.cancel();
                    rt.shared().signals.raise_alarm(AlarmFlags::PROBE_FAIL);
                }
                debug!(succeeded = rt.probe_succeeded, "probe cycle");
            }
            _ => self.step_to(&motors, rt, false),
        }

        rt.state.transition(prior);
        self.sync_position(rt);
    }
}

fn apply_g(modal: &mut Modal, code: i32) -> Result<u16, StatusCode> {
    Ok(match code {
        0 => {
            modal.motion = Motion::Seek;
            group::MOTION
        }
        10 => {
            modal.motion = Motion::Linear;
            group::MOTION
        }
        382 => {
            modal.motion = Motion::Probe { away: false };
            group::MOTION
        }
        384 => {
            modal.motion = Motion::Probe { away: true };
            group::MOTION
        }
        800 => {
            modal.motion = Motion::Cancel;
            group::MOTION
        }
        40 => group::NON_MODAL,
        170 | 180 | 190 => {
            modal.plane = (code / 10) as u8;
            group::PLANE
        }
        200 | 210 => {
            modal.inches = code == 200;
            group::UNITS
        }
        540..=590 if code % 10 == 0 => {
            modal.coord_select = ((code - 540) / 10) as u8;
            group::COORD
        }
        900 | 910 => {
            modal.incremental = code == 910;
            group::DISTANCE
        }
        930 | 940 => {
            modal.inverse_time = code == 930;
            group::FEED_MODE
        }
        _ => return Err(StatusCode::GcodeUnsupportedCommand),
    })
}

fn apply_m(modal: &mut Modal, code: i32) -> Result<u16, StatusCode> {
    Ok(match code {
        0 | 10 | 20 | 300 => {
            modal.program_flow = (code / 10) as u8;
            group::STOPPING
        }
        30 | 40 | 50 => {
            modal.spindle = (code / 10) as u8;
            group::SPINDLE
        }
        80 | 90 => {
            modal.coolant = (code / 10) as u8;
            group::COOLANT
        }
        _ => return Err(StatusCode::GcodeUnsupportedCommand),
    })
}

impl GcodeExecutor for SimGcode {
    fn execute_line(&mut self, line: &str, rt: &mut SystemRuntime) -> StatusCode {
        let block = match self.parse_block(line) {
            Ok(block) => block,
            Err(status) => return status,
        };
        let modal = block.modal;
        let has_axis = block.axis_words.iter().any(Option::is_some);
        if has_axis && modal.motion == Motion::Cancel {
            return StatusCode::GcodeUnsupportedCommand;
        }

        let target = self.target(&modal, &block.axis_words);
        let check_mode = rt.state.is(MachineState::CheckMode);
        let motors = if has_axis {
            if !self.within_travel(&target) {
                return StatusCode::TravelExceeded;
            }
            let motors = match self.motor_target(&target) {
                Ok(motors) => motors,
                Err(status) => return status,
            };
            // No motion with the door open or a hold active.
            match rt.machine_state() {
                MachineState::SafetyDoor => return StatusCode::CheckDoor,
                MachineState::Hold => return StatusCode::IdleError,
                _ => {}
            }
            Some(motors)
        } else {
            None
        };
        self.modal = modal;

        // Check mode validates only.
        match motors {
            Some(motors) if !check_mode => self.run_motion(motors, rt),
            Some(_) => self.position = target,
            None => {}
        }
        if block.program_end {
            self.modal = Modal {
                program_flow: self.modal.program_flow,
                ..Modal::default()
            };
        }
        StatusCode::Ok
    }

    fn parser_modes(&self) -> String {
        let m = &self.modal;
        let motion = match m.motion {
            Motion::Seek => "G0",
            Motion::Linear => "G1",
            Motion::Probe { away: false } => "G38.2",
            Motion::Probe { away: true } => "G38.4",
            Motion::Cancel => "G80",
        };
        format!(
            "{motion} G{} G{} G{} G{} G{} M{} M{} M{} T{} F{:.1} S{:.1}",
            54 + m.coord_select,
            m.plane,
            if m.inches { 20 } else { 21 },
            if m.incremental { 91 } else { 90 },
            if m.inverse_time { 93 } else { 94 },
            m.program_flow,
            m.spindle,
            m.coolant,
            m.tool,
            m.feed_rate,
            m.spindle_speed,
        )
    }
}

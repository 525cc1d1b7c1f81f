//! Simulated realtime executor and control inputs.

use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use mcs_common::consts::N_AXIS;
use mcs_common::machine::flags::{AlarmFlags, AxisMask, ControlPins, ExecFlags, SuspendFlags};
use mcs_common::machine::kinematics::{KinematicsKind, steps_to_mpos};
use mcs_common::machine::state::MachineState;
use mcs_common::machine::status::FeedbackMessage;
use tracing::{debug, info, warn};

use crate::collab::{ControlInputs, MotionControl};
use crate::control_pins::ControlPinHandler;
use crate::runtime::SystemRuntime;

// ─── Control Inputs ─────────────────────────────────────────────────

/// Control port register, shared with whatever drives the simulated pins.
#[derive(Debug, Clone, Default)]
pub struct SimInputs {
    raw: Arc<AtomicU8>,
}

impl SimInputs {
    /// Port reading `raw` until changed.
    pub fn new(raw: ControlPins) -> Self {
        Self {
            raw: Arc::new(AtomicU8::new(raw.bits())),
        }
    }

    pub fn set(&self, raw: ControlPins) {
        self.raw.store(raw.bits(), Ordering::Relaxed);
    }
}

impl ControlInputs for SimInputs {
    fn read_control_pins(&self) -> ControlPins {
        ControlPins::from_bits_truncate(self.raw.load(Ordering::Relaxed))
    }
}

// ─── Realtime Executor ──────────────────────────────────────────────

/// Output produced while executing realtime requests.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    StatusReport {
        state: MachineState,
        mpos: [f32; N_AXIS],
    },
    Alarm(AlarmFlags),
    Feedback(FeedbackMessage),
}

/// Simulated motion layer: drains realtime signals and runs homing.
#[derive(Debug)]
pub struct SimMotion {
    kinematics: KinematicsKind,
    steps_per_mm: [f32; N_AXIS],
    pins: ControlPinHandler,
    inputs: SimInputs,
    events: Vec<RealtimeEvent>,
    /// Critical alarm latched; nothing but a reset is acted on.
    awaiting_reset: bool,
}

impl SimMotion {
    pub fn new(kinematics: KinematicsKind, pins: ControlPinHandler, inputs: SimInputs) -> Self {
        Self {
            kinematics,
            steps_per_mm: [1.0; N_AXIS],
            pins,
            inputs,
            events: Vec::new(),
            awaiting_reset: false,
        }
    }

    pub fn sync_settings(&mut self, steps_per_mm: [f32; N_AXIS]) {
        self.steps_per_mm = steps_per_mm;
    }

    /// Take everything produced since the last call.
    pub fn take_events(&mut self) -> Vec<RealtimeEvent> {
        core::mem::take(&mut self.events)
    }

    /// Critical alarm latched until reset.
    #[inline]
    pub fn awaiting_reset(&self) -> bool {
        self.awaiting_reset
    }

    fn machine_position(&self, rt: &SystemRuntime) -> [f32; N_AXIS] {
        steps_to_mpos(
            self.kinematics.mapping(),
            &rt.shared().position.snapshot(),
            &self.steps_per_mm,
        )
    }

    fn handle_alarm(&mut self, alarm: AlarmFlags, rt: &mut SystemRuntime) {
        warn!(?alarm, "alarm");
        rt.state.transition(MachineState::Alarm);
        self.events.push(RealtimeEvent::Alarm(alarm));
        if alarm.requires_acknowledged_reset() {
            self.events
                .push(RealtimeEvent::Feedback(FeedbackMessage::CriticalEvent));
            self.awaiting_reset = true;
        }
    }

    fn handle_exec(&mut self, exec: ExecFlags, rt: &mut SystemRuntime) {
        if exec.contains(ExecFlags::STATUS_REPORT) {
            self.events.push(RealtimeEvent::StatusReport {
                state: rt.machine_state(),
                mpos: self.machine_position(rt),
            });
        }

        // Moves complete synchronously, so a cancel finds nothing running.
        if exec.contains(ExecFlags::MOTION_CANCEL) {
            rt.suspend.remove(SuspendFlags::MOTION_CANCEL);
        }

        if exec.contains(ExecFlags::SAFETY_DOOR) && !rt.state.is_motion_locked() {
            if !rt.state.is(MachineState::SafetyDoor) {
                info!("safety door opened");
                self.events
                    .push(RealtimeEvent::Feedback(FeedbackMessage::SafetyDoorAjar));
            }
            rt.state.transition(MachineState::SafetyDoor);
            rt.suspend.insert(SuspendFlags::HOLD_ACTIVE | SuspendFlags::REENERGIZE_REQUIRED);
            rt.suspend.remove(SuspendFlags::READY_TO_RESUME);
        } else if exec.contains(ExecFlags::FEED_HOLD) && rt.state.is(MachineState::Cycle) {
            rt.state.transition(MachineState::Hold);
            rt.suspend.insert(SuspendFlags::HOLD_ACTIVE);
        }

        if exec.contains(ExecFlags::CYCLE_START) {
            self.resume(rt);
        }
        if exec.contains(ExecFlags::CYCLE_STOP) && rt.state.is(MachineState::Cycle) {
            rt.state.transition(MachineState::Idle);
        }
    }

    fn resume(&mut self, rt: &mut SystemRuntime) {
        match rt.machine_state() {
            MachineState::SafetyDoor => {
                if self.pins.safety_door_ajar(self.inputs.read_control_pins()) {
                    debug!("cycle start ignored, door still open");
                    return;
                }
                rt.suspend = SuspendFlags::empty();
                rt.state.transition(MachineState::Idle);
            }
            MachineState::Hold => {
                rt.suspend = SuspendFlags::empty();
                rt.state.transition(MachineState::Idle);
            }
            _ => {}
        }
    }
}

impl MotionControl for SimMotion {
    fn homing_cycle(&mut self, rt: &mut SystemRuntime) {
        rt.homing_axis_lock = AxisMask::all();
        // A reset pending at entry aborts the cycle before any motion.
        if rt
            .shared()
            .signals
            .pending_exec()
            .contains(ExecFlags::RESET)
        {
            rt.abort = true;
        } else {
            rt.shared().position.store(&[0; N_AXIS]);
        }
        rt.homing_axis_lock = AxisMask::empty();
    }

    fn stepper_go_idle(&mut self) {
        debug!("steppers idle");
    }

    fn execute_realtime(&mut self, rt: &mut SystemRuntime) {
        let alarm = rt.shared().signals.drain_alarm();
        if !alarm.is_empty() {
            self.handle_alarm(alarm, rt);
        }

        let exec = rt.shared().signals.drain_exec();
        if exec.contains(ExecFlags::RESET) {
            rt.abort = true;
            self.awaiting_reset = false;
            return;
        }
        if self.awaiting_reset {
            return;
        }
        self.handle_exec(exec, rt);
    }
}

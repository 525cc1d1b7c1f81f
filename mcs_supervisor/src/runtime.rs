//! System runtime context.
//!
//! Split by who may write what:
//!
//! - [`SharedRuntime`]: the only state interrupt contexts can reach
//!   (flag registers, probe watcher and live step position). Interior
//!   atomics only; shared through an `Arc`.
//! - [`SystemRuntime`]: single-writer state owned by the main loop. It is
//!   `!Sync`, so no interrupt-side closure can hold a reference to it.

use core::cell::Cell;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use mcs_common::consts::N_AXIS;
use mcs_common::machine::Position;
use mcs_common::machine::flags::{AxisMask, ControlPins, SuspendFlags};
use mcs_common::machine::state::MachineState;
use static_assertions::{assert_impl_all, assert_not_impl_any};

use crate::control_pins::ControlPinHandler;
use crate::probe::{ProbeMonitor, ProbePin};
use crate::signals::RealtimeSignals;
use crate::state::StateRegister;

// ─── Live Step Position ─────────────────────────────────────────────

/// Machine position in steps, advanced by the stepper interrupt.
#[derive(Debug)]
pub struct StepPosition {
    axes: [AtomicI32; N_AXIS],
}

impl Default for StepPosition {
    fn default() -> Self {
        Self::new()
    }
}

impl StepPosition {
    pub const fn new() -> Self {
        Self {
            axes: [const { AtomicI32::new(0) }; N_AXIS],
        }
    }

    /// Advance one axis by `delta` steps (stepper interrupt).
    #[inline]
    pub fn step(&self, axis: usize, delta: i32) {
        self.axes[axis].fetch_add(delta, Ordering::Relaxed);
    }

    /// Overwrite the whole vector (homing, power-up).
    pub fn store(&self, position: &Position) {
        for (dst, src) in self.axes.iter().zip(position) {
            dst.store(*src, Ordering::Relaxed);
        }
    }

    /// Copy of the current vector.
    pub fn snapshot(&self) -> Position {
        core::array::from_fn(|i| self.axes[i].load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn axes(&self) -> &[AtomicI32; N_AXIS] {
        &self.axes
    }
}

// ─── Interrupt-Shared Runtime ───────────────────────────────────────

/// Fields written from interrupt contexts.
#[derive(Debug, Default)]
pub struct SharedRuntime {
    /// Execute and alarm flag registers.
    pub signals: RealtimeSignals,
    /// Probe watcher and contact snapshot.
    pub probe: ProbeMonitor,
    /// Live machine position in steps.
    pub position: StepPosition,
}

impl SharedRuntime {
    pub const fn new() -> Self {
        Self {
            signals: RealtimeSignals::new(),
            probe: ProbeMonitor::new(),
            position: StepPosition::new(),
        }
    }

    // ── Interrupt entry points ──

    /// Stepper tick: run the probe watcher.
    #[inline]
    pub fn stepper_tick<P: ProbePin + ?Sized>(&self, probe_pin: &P) -> bool {
        self.probe.monitor(probe_pin, &self.position, &self.signals)
    }

    /// Pin-change interrupt on the control port.
    #[inline]
    pub fn control_pin_change(&self, handler: &ControlPinHandler, raw: ControlPins) {
        handler.on_pin_change(raw, self);
    }

    /// Soft reset request from any context.
    #[inline]
    pub fn request_reset(&self) -> bool {
        self.signals.request_reset()
    }
}

// ─── Main-Loop Runtime ──────────────────────────────────────────────

/// Main-loop owned system state.
#[derive(Debug)]
pub struct SystemRuntime {
    /// Authoritative machine state.
    pub state: StateRegister,
    /// Hold/resume sub-state, owned by the realtime executor.
    pub suspend: SuspendFlags,
    /// Discard in-flight work and reinitialize.
    pub abort: bool,
    /// Soft limit tripped; cleared on reinitialization.
    pub soft_limit_tripped: bool,
    /// Last probe cycle made contact.
    pub probe_succeeded: bool,
    /// Axes currently under homing-lock motion.
    pub homing_axis_lock: AxisMask,
    shared: Arc<SharedRuntime>,
    _not_sync: PhantomData<Cell<()>>,
}

impl SystemRuntime {
    pub fn new(shared: Arc<SharedRuntime>) -> Self {
        Self {
            state: StateRegister::new(),
            suspend: SuspendFlags::empty(),
            abort: false,
            soft_limit_tripped: false,
            probe_succeeded: false,
            homing_axis_lock: AxisMask::empty(),
            shared,
            _not_sync: PhantomData,
        }
    }

    /// Interrupt-shared half.
    #[inline]
    pub fn shared(&self) -> &SharedRuntime {
        &self.shared
    }

    /// Handle for handing to interrupt contexts.
    pub fn shared_handle(&self) -> Arc<SharedRuntime> {
        Arc::clone(&self.shared)
    }

    /// Shorthand for the current machine state.
    #[inline]
    pub fn machine_state(&self) -> MachineState {
        self.state.current()
    }

    /// Power-up reset: every field zeroed, abort set so the supervisor
    /// runs a full reinitialization pass before anything else.
    pub fn power_up(&mut self) {
        self.state = StateRegister::new();
        self.suspend = SuspendFlags::empty();
        self.abort = true;
        self.soft_limit_tripped = false;
        self.probe_succeeded = false;
        self.homing_axis_lock = AxisMask::empty();
        self.shared.signals.reset();
        self.shared.probe.clear();
        self.shared.position.store(&[0; N_AXIS]);
    }

    /// Per-pass reset of the fields governed by reinitialization.
    pub fn clear_for_main_loop(&mut self) {
        self.abort = false;
        self.shared.signals.reset();
        self.suspend = SuspendFlags::empty();
        self.soft_limit_tripped = false;
    }
}

assert_impl_all!(SharedRuntime: Send, Sync);
assert_not_impl_any!(SystemRuntime: Sync);

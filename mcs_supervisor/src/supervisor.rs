//! Power-up and reinitialization supervisor.
//!
//! Outermost control loop. Every `abort` brings the machine back through a
//! full reinitialization pass before the main loop runs again:
//!
//! ```text
//! power_up → [reinitialize → main_loop]* → Shutdown
//! ```

use std::sync::Arc;

use mcs_common::config::SupervisorConfig;
use mcs_common::machine::flags::SettingsFlags;
use mcs_common::machine::state::MachineState;
use tracing::{debug, info};

use crate::collab::{Host, LoopExit};
use crate::runtime::{SharedRuntime, SystemRuntime};

/// Owns the system runtime across reinitializations.
#[derive(Debug)]
pub struct Supervisor {
    runtime: SystemRuntime,
    homing_init_lock: bool,
    force_init_alarm: bool,
}

impl Supervisor {
    pub fn new(config: &SupervisorConfig) -> Self {
        Self::with_shared(config, Arc::new(SharedRuntime::new()))
    }

    /// Build around an existing interrupt-shared runtime.
    pub fn with_shared(config: &SupervisorConfig, shared: Arc<SharedRuntime>) -> Self {
        Self {
            runtime: SystemRuntime::new(shared),
            homing_init_lock: config.homing_init_lock,
            force_init_alarm: config.force_init_alarm,
        }
    }

    #[inline]
    pub fn runtime(&self) -> &SystemRuntime {
        &self.runtime
    }

    #[inline]
    pub fn runtime_mut(&mut self) -> &mut SystemRuntime {
        &mut self.runtime
    }

    /// Handle for interrupt contexts (pin change, stepper tick, serial RX).
    pub fn shared(&self) -> Arc<SharedRuntime> {
        self.runtime.shared_handle()
    }

    /// Power-up: zero the runtime, request the first reinitialization and
    /// apply the power-up alarm locks.
    pub fn power_up(&mut self, settings: SettingsFlags) {
        self.runtime.power_up();
        if self.homing_init_lock && settings.contains(SettingsFlags::HOMING_ENABLE) {
            info!("homing enabled, locking until homed");
            self.runtime.state.transition(MachineState::Alarm);
        }
        if self.force_init_alarm {
            info!("forced power-up alarm");
            self.runtime.state.transition(MachineState::Alarm);
        }
    }

    /// One reinitialization pass.
    ///
    /// Subsystems are brought back in dependency order, then the per-pass
    /// runtime fields are cleared. The machine state and step position survive.
    pub fn reinitialize<H: Host + ?Sized>(&mut self, host: &mut H) {
        info!(state = %self.runtime.machine_state(), "reinitializing");
        host.reset_line_buffer();
        host.gcode_init();
        host.spindle_init();
        host.coolant_init();
        host.limits_init();
        self.runtime.shared().probe.cancel();
        host.probe_init();
        host.planner_reset();
        host.stepper_reset();
        host.planner_sync_position(&self.runtime);
        host.gcode_sync_position(&self.runtime);
        self.runtime.clear_for_main_loop();
    }

    /// Supervisor loop. Returns only when the host reports end of input.
    pub fn run<H: Host + ?Sized>(&mut self, host: &mut H) {
        loop {
            self.reinitialize(host);
            match host.main_loop(&mut self.runtime) {
                LoopExit::Abort => debug!("main loop aborted"),
                LoopExit::Shutdown => {
                    info!("main loop finished");
                    return;
                }
            }
        }
    }
}

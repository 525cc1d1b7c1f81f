//! Control pin-change handler.
//!
//! Body of the pin-change interrupt for the grouped control inputs. Only one
//! request is issued per interrupt, in priority order:
//! reset > cycle start > safety door / feed hold.

use mcs_common::config::SupervisorConfig;
use mcs_common::machine::flags::{ControlPins, ExecFlags};

use crate::runtime::SharedRuntime;

/// Decodes raw control-port levels into realtime requests.
#[derive(Debug, Clone, Copy)]
pub struct ControlPinHandler {
    invert_mask: ControlPins,
    safety_door_input: bool,
}

impl ControlPinHandler {
    pub const fn new(invert_mask: ControlPins, safety_door_input: bool) -> Self {
        Self {
            invert_mask,
            safety_door_input,
        }
    }

    pub fn from_config(config: &SupervisorConfig) -> Self {
        Self::new(config.control_invert_mask(), config.safety_door_input)
    }

    #[inline]
    pub const fn safety_door_input(&self) -> bool {
        self.safety_door_input
    }

    /// Active inputs after inversion.
    #[inline]
    pub fn active(&self, raw: ControlPins) -> ControlPins {
        (raw ^ self.invert_mask) & ControlPins::all()
    }

    /// Pin-change interrupt body.
    pub fn on_pin_change(&self, raw: ControlPins, shared: &SharedRuntime) {
        let pins = self.active(raw);
        if pins.is_empty() {
            return;
        }
        if pins.contains(ControlPins::RESET) {
            shared.request_reset();
        } else if pins.contains(ControlPins::CYCLE_START) {
            shared.signals.raise_exec(ExecFlags::CYCLE_START);
        } else if self.safety_door_input {
            if pins.contains(ControlPins::SAFETY_DOOR) {
                shared.signals.raise_exec(ExecFlags::SAFETY_DOOR);
            }
        } else if pins.contains(ControlPins::FEED_HOLD) {
            shared.signals.raise_exec(ExecFlags::FEED_HOLD);
        }
    }

    /// Whether the safety door reads open. Always `false` without a door input.
    #[inline]
    pub fn safety_door_ajar(&self, raw: ControlPins) -> bool {
        self.safety_door_input && self.active(raw).contains(ControlPins::SAFETY_DOOR)
    }
}

impl Default for ControlPinHandler {
    fn default() -> Self {
        Self::from_config(&SupervisorConfig::default())
    }
}

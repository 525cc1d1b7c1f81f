//! State Register.
//!
//! Single authoritative [`MachineState`]. Transitions are unconditional
//! last-writer-wins writes and need `&mut`, so only the main loop can make
//! them. Interrupt contexts request changes through the realtime signals.

use mcs_common::machine::state::MachineState;
use tracing::debug;

/// Authoritative machine state.
#[derive(Debug, Clone, Default)]
pub struct StateRegister {
    state: MachineState,
}

impl StateRegister {
    pub const fn new() -> Self {
        Self {
            state: MachineState::Idle,
        }
    }

    /// Current state.
    #[inline]
    pub const fn current(&self) -> MachineState {
        self.state
    }

    /// Overwrite the state. Returns the previous one.
    pub fn transition(&mut self, next: MachineState) -> MachineState {
        let prev = self.state;
        if prev != next {
            debug!(from = %prev, to = %next, "state transition");
        }
        self.state = next;
        prev
    }

    /// Admin commands other than `$$ $G $C $X` are refused.
    #[inline]
    pub const fn is_locked_for_admin(&self) -> bool {
        !self.state.accepts_settings()
    }

    /// Settings dump is refused while motion is in progress.
    #[inline]
    pub const fn is_locked_for_settings_print(&self) -> bool {
        matches!(self.state, MachineState::Cycle | MachineState::Hold)
    }

    /// Motion-producing commands are refused.
    #[inline]
    pub const fn is_motion_locked(&self) -> bool {
        self.state.locks_motion()
    }

    #[inline]
    pub const fn accepts_settings(&self) -> bool {
        self.state.accepts_settings()
    }

    #[inline]
    pub fn is(&self, state: MachineState) -> bool {
        self.state == state
    }
}

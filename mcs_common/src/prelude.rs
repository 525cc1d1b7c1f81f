//! Prelude module for common re-exports.
//!
//! ```rust
//! use mcs_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    load_config, ConfigError, ConfigLoader, LogLevel, McsConfig, SettingsDefaults, SharedConfig,
    SupervisorConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{LINE_BUFFER_CAPACITY, LINE_BUFFER_SIZE, N_AXIS, N_STARTUP_LINE, PROBE_MASK};

// ─── Machine ────────────────────────────────────────────────────────
pub use crate::machine::flags::{
    AlarmFlags, AxisMask, ControlPin, ControlPins, ExecFlags, SettingsFlags, SuspendFlags,
};
pub use crate::machine::kinematics::{Kinematics, KinematicsKind, steps_to_mpos};
pub use crate::machine::state::{MachineState, ProbeState};
pub use crate::machine::status::{FeedbackMessage, StatusCode};
pub use crate::machine::Position;

//! System-wide constants for the MCS workspace.
//!
//! Single source of truth for numeric limits and defaults.
//! Imported by all crates; nothing here is redefined elsewhere.

/// Number of machine axes (X, Y, Z).
pub const N_AXIS: usize = 3;

/// Axis index of X.
pub const X_AXIS: usize = 0;
/// Axis index of Y.
pub const Y_AXIS: usize = 1;
/// Axis index of Z.
pub const Z_AXIS: usize = 2;

/// CoreXY motor A drives the X/Y belts together.
pub const A_MOTOR: usize = X_AXIS;
/// CoreXY motor B drives the X/Y belts in opposition.
pub const B_MOTOR: usize = Y_AXIS;

/// Default line buffer size of the serial line assembler [bytes].
pub const LINE_BUFFER_SIZE: usize = 80;

/// Upper bound of any line the protocol accepts (g-code standard limit).
pub const LINE_BUFFER_CAPACITY: usize = 256;

/// Default number of stored startup lines.
pub const N_STARTUP_LINE: u8 = 2;

/// Maximum number of startup line slots the settings store may expose.
pub const MAX_STARTUP_LINES: u8 = 8;

/// Highest addressable global setting index (`$<n>=<v>`).
pub const MAX_SETTING_INDEX: f32 = 255.0;

/// Probe input bit inside the probe port.
pub const PROBE_MASK: u8 = 1 << 5;

/// Default configuration file path of the supervisor binary.
pub const DEFAULT_CONFIG_PATH: &str = "config/mcs.toml";

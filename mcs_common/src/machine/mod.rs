//! Machine supervisor shared types.
//!
//! Everything the supervisor, the line protocol and the collaborators
//! exchange lives here: the state enums, the realtime flag registers,
//! status/feedback codes, and the steps → machine coordinates mapping.

pub mod flags;
pub mod kinematics;
pub mod state;
pub mod status;

use crate::consts::N_AXIS;

/// Machine position in step units, one signed counter per axis.
pub type Position = [i32; N_AXIS];

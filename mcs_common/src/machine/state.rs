//! State enums of the machine supervisor.
//!
//! All enums use `#[repr(u8)]` so they can live in an atomic byte when an
//! interrupt context has to observe them (see `ProbeState`).

use serde::{Deserialize, Serialize};

// ─── Machine State ──────────────────────────────────────────────────

/// Authoritative operating state of the machine.
///
/// Exactly one value holds at any instant. `MotionCancel` is a transient
/// sub-state layered on a hold/door sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum MachineState {
    /// Ready, no motion queued.
    #[default]
    Idle = 0,
    /// Locked out after a hazardous or unverified condition.
    Alarm = 1,
    /// G-code check mode: parser runs, planner and motion are locked.
    CheckMode = 2,
    /// Homing cycle in progress.
    Homing = 3,
    /// Cycle running or motions executing.
    Cycle = 4,
    /// Feed hold active.
    Hold = 5,
    /// Safety door ajar: feed hold, outputs de-energized.
    SafetyDoor = 6,
    /// Motion cancel in progress, returns to idle.
    MotionCancel = 7,
}

impl MachineState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Alarm),
            2 => Some(Self::CheckMode),
            3 => Some(Self::Homing),
            4 => Some(Self::Cycle),
            5 => Some(Self::Hold),
            6 => Some(Self::SafetyDoor),
            7 => Some(Self::MotionCancel),
            _ => None,
        }
    }

    /// States in which motion-producing commands are locked out.
    #[inline]
    pub const fn locks_motion(self) -> bool {
        matches!(self, Self::Alarm | Self::CheckMode)
    }

    /// States that accept settings-modifying and homing commands.
    #[inline]
    pub const fn accepts_settings(self) -> bool {
        matches!(self, Self::Idle | Self::Alarm)
    }

    /// Short display name, as used in status reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Alarm => "Alarm",
            Self::CheckMode => "Check",
            Self::Homing => "Home",
            Self::Cycle => "Run",
            Self::Hold => "Hold",
            Self::SafetyDoor => "Door",
            Self::MotionCancel => "Cancel",
        }
    }
}

impl core::fmt::Display for MachineState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Probe State ────────────────────────────────────────────────────

/// Probe watcher state, shared with the stepper tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ProbeState {
    /// Probing disabled or not in use.
    #[default]
    Off = 0,
    /// Actively watching the probe input.
    Active = 1,
}

impl ProbeState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Active),
            _ => None,
        }
    }
}

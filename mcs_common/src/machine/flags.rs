//! Bitflag registers exchanged between interrupt contexts and the main loop.
//!
//! All registers are single bytes so they fit one atomic word. Interrupt
//! producers only ever OR bits in; the main-loop consumer clears them.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

use crate::consts::N_AXIS;

bitflags! {
    /// Realtime execute requests.
    ///
    /// A set bit means "pending since it was last cleared", not "currently true".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecFlags: u8 {
        /// Status report requested.
        const STATUS_REPORT = 1 << 0;
        /// Cycle start / resume.
        const CYCLE_START   = 1 << 1;
        /// Motion queue finished.
        const CYCLE_STOP    = 1 << 2;
        /// Feed hold.
        const FEED_HOLD     = 1 << 3;
        /// Soft reset → abort.
        const RESET         = 1 << 4;
        /// Safety door opened.
        const SAFETY_DOOR   = 1 << 5;
        /// Cancel the current motion (probe contact).
        const MOTION_CANCEL = 1 << 6;
    }
}

impl Default for ExecFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Realtime alarm requests.
    ///
    /// `CRITICAL_EVENT` is a modifier: combined with any alarm bit it forbids
    /// automatic recovery until an acknowledged reset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AlarmFlags: u8 {
        /// Recovery forbidden without an acknowledged reset.
        const CRITICAL_EVENT = 1 << 0;
        /// Hard limit switch tripped.
        const HARD_LIMIT     = 1 << 1;
        /// Soft travel limit exceeded.
        const SOFT_LIMIT     = 1 << 2;
        /// Reset while in motion.
        const ABORT_CYCLE    = 1 << 3;
        /// Probe cycle finished without contact.
        const PROBE_FAIL     = 1 << 4;
        /// Homing cycle failed.
        const HOMING_FAIL    = 1 << 5;
    }
}

impl AlarmFlags {
    /// Every alarm bit except the `CRITICAL_EVENT` modifier.
    pub const ALARM_MASK: Self = Self::from_bits_truncate(
        Self::HARD_LIMIT.bits()
            | Self::SOFT_LIMIT.bits()
            | Self::ABORT_CYCLE.bits()
            | Self::PROBE_FAIL.bits()
            | Self::HOMING_FAIL.bits(),
    );

    /// Returns true if any alarm bit (ignoring the modifier) is set.
    #[inline]
    pub const fn has_alarm(&self) -> bool {
        self.intersects(Self::ALARM_MASK)
    }

    /// Returns true if only an explicit acknowledged reset may clear this.
    #[inline]
    pub const fn requires_acknowledged_reset(&self) -> bool {
        self.contains(Self::CRITICAL_EVENT) && self.has_alarm()
    }
}

impl Default for AlarmFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Suspend state owned by the realtime executor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SuspendFlags: u8 {
        /// Cycle active and a hold is in progress.
        const HOLD_ACTIVE         = 1 << 0;
        /// Ready to resume with a cycle start.
        const READY_TO_RESUME     = 1 << 1;
        /// Outputs must be re-energized before resuming.
        const REENERGIZE_REQUIRED = 1 << 2;
        /// Resume cancelled; used by the probing routine.
        const MOTION_CANCEL       = 1 << 3;
    }
}

impl Default for SuspendFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Grouped pin-change control inputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlPins: u8 {
        const RESET       = 1 << 0;
        const FEED_HOLD   = 1 << 1;
        const CYCLE_START = 1 << 2;
        const SAFETY_DOOR = 1 << 3;
    }
}

impl Default for ControlPins {
    fn default() -> Self {
        Self::empty()
    }
}

/// Named control input, used by configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPin {
    Reset,
    FeedHold,
    CycleStart,
    SafetyDoor,
}

impl From<ControlPin> for ControlPins {
    fn from(pin: ControlPin) -> Self {
        match pin {
            ControlPin::Reset => Self::RESET,
            ControlPin::FeedHold => Self::FEED_HOLD,
            ControlPin::CycleStart => Self::CYCLE_START,
            ControlPin::SafetyDoor => Self::SAFETY_DOOR,
        }
    }
}

impl FromIterator<ControlPin> for ControlPins {
    fn from_iter<I: IntoIterator<Item = ControlPin>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |acc, pin| acc | Self::from(pin))
    }
}

bitflags! {
    /// One bit per axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AxisMask: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
    }
}

impl AxisMask {
    /// Mask bit of axis `idx`.
    #[inline]
    pub const fn axis(idx: usize) -> Self {
        Self::from_bits_truncate(1 << idx)
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::empty()
    }
}

const_assert_eq!(AxisMask::all().bits().count_ones() as usize, N_AXIS);

bitflags! {
    /// Boolean global settings consulted by the supervisor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SettingsFlags: u8 {
        const REPORT_INCHES     = 1 << 0;
        const AUTO_START        = 1 << 1;
        const INVERT_ST_ENABLE  = 1 << 2;
        const HARD_LIMIT_ENABLE = 1 << 3;
        const HOMING_ENABLE     = 1 << 4;
        const SOFT_LIMIT_ENABLE = 1 << 5;
        const INVERT_LIMIT_PINS = 1 << 6;
        const INVERT_PROBE_PIN  = 1 << 7;
    }
}

impl Default for SettingsFlags {
    fn default() -> Self {
        Self::empty()
    }
}

const_assert_eq!(core::mem::size_of::<ExecFlags>(), 1);
const_assert_eq!(core::mem::size_of::<AlarmFlags>(), 1);

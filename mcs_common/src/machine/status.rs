//! Status and feedback codes returned to the reporting collaborator.

use serde::{Deserialize, Serialize};

/// Response code of a processed line.
///
/// Small integers on the wire; the reporter decides how to render them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum StatusCode {
    #[default]
    Ok = 0,
    ExpectedCommandLetter = 1,
    BadNumberFormat = 2,
    InvalidStatement = 3,
    NegativeValue = 4,
    SettingDisabled = 5,
    SettingStepPulseMin = 6,
    SettingReadFail = 7,
    IdleError = 8,
    AlarmLock = 9,
    SoftLimitError = 10,
    Overflow = 11,
    CheckDoor = 13,
    TravelExceeded = 15,
    GcodeUnsupportedCommand = 20,
    GcodeWordRepeated = 25,
}

impl StatusCode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::ExpectedCommandLetter),
            2 => Some(Self::BadNumberFormat),
            3 => Some(Self::InvalidStatement),
            4 => Some(Self::NegativeValue),
            5 => Some(Self::SettingDisabled),
            6 => Some(Self::SettingStepPulseMin),
            7 => Some(Self::SettingReadFail),
            8 => Some(Self::IdleError),
            9 => Some(Self::AlarmLock),
            10 => Some(Self::SoftLimitError),
            11 => Some(Self::Overflow),
            13 => Some(Self::CheckDoor),
            15 => Some(Self::TravelExceeded),
            20 => Some(Self::GcodeUnsupportedCommand),
            25 => Some(Self::GcodeWordRepeated),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// `Ok(())` for `StatusCode::Ok`, the code itself otherwise.
    #[inline]
    pub const fn into_result(self) -> Result<(), StatusCode> {
        match self {
            Self::Ok => Ok(()),
            other => Err(other),
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ExpectedCommandLetter => "Expected command letter",
            Self::BadNumberFormat => "Bad number format",
            Self::InvalidStatement => "Invalid statement",
            Self::NegativeValue => "Value < 0",
            Self::SettingDisabled => "Setting disabled",
            Self::SettingStepPulseMin => "Value < 3 usec",
            Self::SettingReadFail => "EEPROM read fail. Using defaults",
            Self::IdleError => "Not idle",
            Self::AlarmLock => "Alarm lock",
            Self::SoftLimitError => "Homing not enabled",
            Self::Overflow => "Line overflow",
            Self::CheckDoor => "Check Door",
            Self::TravelExceeded => "Travel exceeded",
            Self::GcodeUnsupportedCommand => "Unsupported command",
            Self::GcodeWordRepeated => "Word repeated",
        }
    }
}

impl core::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            other => write!(f, "error: {}", other.description()),
        }
    }
}

/// Out-of-band feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FeedbackMessage {
    CriticalEvent = 1,
    AlarmLock = 2,
    AlarmUnlock = 3,
    Enabled = 4,
    Disabled = 5,
    SafetyDoorAjar = 6,
    ProgramEnd = 7,
    RestoreDefaults = 8,
}

impl FeedbackMessage {
    pub const fn text(self) -> &'static str {
        match self {
            Self::CriticalEvent => "Reset to continue",
            Self::AlarmLock => "'$H'|'$X' to unlock",
            Self::AlarmUnlock => "Caution: Unlocked",
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
            Self::SafetyDoorAjar => "Check Door",
            Self::ProgramEnd => "Pgm End",
            Self::RestoreDefaults => "Restoring defaults",
        }
    }
}

impl core::fmt::Display for FeedbackMessage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}]", self.text())
    }
}

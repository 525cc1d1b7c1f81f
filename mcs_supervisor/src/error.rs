//! Administrative command errors.

use mcs_common::machine::status::StatusCode;
use thiserror::Error;

/// Rejection of a `$` command line.
///
/// Syntax and state errors are raised before any side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Malformed command or trailing characters.
    #[error("invalid statement")]
    InvalidStatement,

    /// Expected a number.
    #[error("bad number format")]
    BadNumberFormat,

    /// Command needs Idle (or Idle/Alarm).
    #[error("command not allowed in current state")]
    IdleError,

    #[error("setting read failed")]
    SettingReadFail,

    /// Command requires a setting that is off.
    #[error("setting disabled")]
    SettingDisabled,

    /// Status passed through from the settings store or g-code executor.
    #[error("rejected: {}", .0.description())]
    Rejected(StatusCode),
}

impl CommandError {
    /// Wire status code.
    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidStatement => StatusCode::InvalidStatement,
            Self::BadNumberFormat => StatusCode::BadNumberFormat,
            Self::IdleError => StatusCode::IdleError,
            Self::SettingReadFail => StatusCode::SettingReadFail,
            Self::SettingDisabled => StatusCode::SettingDisabled,
            Self::Rejected(status) => status,
        }
    }
}

impl From<StatusCode> for CommandError {
    fn from(status: StatusCode) -> Self {
        match status {
            StatusCode::InvalidStatement => Self::InvalidStatement,
            StatusCode::BadNumberFormat => Self::BadNumberFormat,
            StatusCode::IdleError => Self::IdleError,
            StatusCode::SettingReadFail => Self::SettingReadFail,
            StatusCode::SettingDisabled => Self::SettingDisabled,
            other => Self::Rejected(other),
        }
    }
}

impl From<CommandError> for StatusCode {
    fn from(err: CommandError) -> Self {
        err.status()
    }
}

/// Result of one command line.
pub type CommandResult = Result<(), CommandError>;

/// Collapse a command result into its wire status.
pub fn status_of(result: CommandResult) -> StatusCode {
    match result {
        Ok(()) => StatusCode::Ok,
        Err(err) => err.status(),
    }
}

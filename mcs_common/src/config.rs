//! Configuration loading traits and types.
//!
//! The supervisor binary reads one TOML file:
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "mcs-sim"
//!
//! [supervisor]
//! line_buffer_size = 80
//! startup_line_count = 2
//! homing_init_lock = true
//! kinematics = "corexy"
//!
//! [settings]
//! homing_enable = true
//! steps_per_mm = [80.0, 80.0, 400.0]
//! ```
//!
//! Every section except `[shared]` falls back to its defaults.
//!
//! ```rust,no_run
//! use mcs_common::config::{load_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = load_config(Path::new("config/mcs.toml"))?;
//!     println!("line buffer: {}", config.supervisor.line_buffer_size);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::{
    LINE_BUFFER_CAPACITY, LINE_BUFFER_SIZE, MAX_STARTUP_LINES, N_AXIS, N_STARTUP_LINE,
};
use crate::machine::flags::{ControlPin, ControlPins, SettingsFlags};
use crate::machine::kinematics::KinematicsKind;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across MCS applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Supervisor build-time options, read once at power-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Maximum accepted line length [bytes].
    pub line_buffer_size: usize,

    /// Number of startup line slots.
    pub startup_line_count: u8,

    /// Power up in Alarm when homing is enabled.
    pub homing_init_lock: bool,

    /// Power up in Alarm regardless of homing.
    pub force_init_alarm: bool,

    /// Treat the fourth control input as a safety door instead of feed hold.
    pub safety_door_input: bool,

    /// Control inputs whose raw level is inverted before use.
    pub control_invert: Vec<ControlPin>,

    /// Motor → axis mapping.
    pub kinematics: KinematicsKind,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            line_buffer_size: LINE_BUFFER_SIZE,
            startup_line_count: N_STARTUP_LINE,
            homing_init_lock: true,
            force_init_alarm: false,
            safety_door_input: false,
            // Pull-ups: inactive inputs read high.
            control_invert: vec![
                ControlPin::Reset,
                ControlPin::FeedHold,
                ControlPin::CycleStart,
                ControlPin::SafetyDoor,
            ],
            kinematics: KinematicsKind::Cartesian,
        }
    }
}

impl SupervisorConfig {
    /// Combined invert mask of the control inputs.
    pub fn control_invert_mask(&self) -> ControlPins {
        self.control_invert.iter().copied().collect()
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_buffer_size == 0 || self.line_buffer_size > LINE_BUFFER_CAPACITY {
            return Err(ConfigError::ValidationError(format!(
                "line_buffer_size {} out of range [1, {}]",
                self.line_buffer_size, LINE_BUFFER_CAPACITY
            )));
        }
        if self.startup_line_count == 0 || self.startup_line_count > MAX_STARTUP_LINES {
            return Err(ConfigError::ValidationError(format!(
                "startup_line_count {} out of range [1, {}]",
                self.startup_line_count, MAX_STARTUP_LINES
            )));
        }
        Ok(())
    }
}

/// Initial values of the simulated settings store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsDefaults {
    pub homing_enable: bool,
    pub invert_probe_pin: bool,
    pub soft_limit_enable: bool,
    pub hard_limit_enable: bool,
    pub steps_per_mm: [f32; N_AXIS],
    pub build_info: String,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            homing_enable: false,
            invert_probe_pin: false,
            soft_limit_enable: false,
            hard_limit_enable: false,
            steps_per_mm: [250.0; N_AXIS],
            build_info: String::new(),
        }
    }
}

impl SettingsDefaults {
    /// Boolean settings as a flag set.
    pub fn flags(&self) -> SettingsFlags {
        let mut flags = SettingsFlags::empty();
        flags.set(SettingsFlags::HOMING_ENABLE, self.homing_enable);
        flags.set(SettingsFlags::INVERT_PROBE_PIN, self.invert_probe_pin);
        flags.set(SettingsFlags::SOFT_LIMIT_ENABLE, self.soft_limit_enable);
        flags.set(SettingsFlags::HARD_LIMIT_ENABLE, self.hard_limit_enable);
        flags
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bad) = self.steps_per_mm.iter().find(|v| v.is_nan() || **v <= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "steps_per_mm must be > 0, got {bad}"
            )));
        }
        if self.soft_limit_enable && !self.homing_enable {
            return Err(ConfigError::ValidationError(
                "soft_limit_enable requires homing_enable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration file of the supervisor binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McsConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub settings: SettingsDefaults,
}

impl McsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.supervisor.validate()?;
        self.settings.validate()
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Load and validate the supervisor configuration file.
pub fn load_config(path: &Path) -> Result<McsConfig, ConfigError> {
    let config = McsConfig::load(path)?;
    config.validate()?;
    tracing::debug!(
        service = %config.shared.service_name,
        kinematics = ?config.supervisor.kinematics,
        "configuration loaded from {}",
        path.display()
    );
    Ok(config)
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

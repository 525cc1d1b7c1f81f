//! MCS Common Library
//!
//! Shared types for the machine controller supervisor workspace.
//!
//! # Module Structure
//!
//! - [`machine`] - Machine state, realtime flag registers, status codes, kinematics
//! - [`config`] - TOML configuration loading and validation
//! - [`consts`] - System-wide numeric limits and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use mcs_common::prelude::*;
//!
//! let flags = ExecFlags::FEED_HOLD | ExecFlags::STATUS_REPORT;
//! assert!(flags.contains(ExecFlags::FEED_HOLD));
//! assert!(MachineState::Alarm.accepts_settings());
//! ```

pub mod config;
pub mod consts;
pub mod machine;
pub mod prelude;

//! # MCS Supervisor Library
//!
//! Operational supervisor of a CNC motion controller. It owns the global
//! machine state and the realtime request registers, and it keeps the probe
//! synchronized with the step pulses. It also interprets the `$` admin
//! commands and sequences power-up and every reinitialization after an abort.
//!
//! ## Concurrency
//!
//! Two contexts touch the runtime:
//!
//! 1. **Asynchronous producers** (stepper tick, pin-change, serial receive)
//!    only see [`runtime::SharedRuntime`]: atomic flag registers, the probe
//!    monitor and the step position.
//! 2. **Main loop** owns [`runtime::SystemRuntime`] exclusively: state,
//!    suspend flags, abort and the homing lock.
//!
//! Motion, g-code, settings storage and reporting are reached through the
//! traits in [`collab`]; [`sim`] provides in-process stand-ins for all of them.

pub mod collab;
pub mod command;
pub mod control_pins;
pub mod error;
pub mod probe;
pub mod runtime;
pub mod signals;
pub mod sim;
pub mod state;
pub mod supervisor;

pub use command::{Interpreter, SystemCommand};
pub use error::{CommandError, CommandResult};
pub use runtime::{SharedRuntime, SystemRuntime};
pub use supervisor::Supervisor;

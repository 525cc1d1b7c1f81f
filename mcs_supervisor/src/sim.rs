//! Host simulation.
//!
//! Stand-ins for every collaborator of the supervisor core, so the binary
//! runs on a workstation and the tests have something to drive. None of
//! them model real timing, kinematics limits or persistent storage.

pub mod gcode;
pub mod host;
pub mod protocol;
pub mod realtime;
pub mod report;
pub mod settings;

pub use gcode::SimGcode;
pub use host::SimHost;
pub use protocol::{LineAssembler, RealtimeCommand, Received};
pub use realtime::{RealtimeEvent, SimInputs, SimMotion};
pub use report::TextReporter;
pub use settings::MemorySettings;

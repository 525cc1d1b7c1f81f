//! Administrative (`$`) command interpreter.
//!
//! A line is handled in three steps:
//!
//! 1. **admission**: the leading letters are checked against the machine
//!    state, before any syntax is looked at;
//! 2. **parse**: the remainder becomes a [`SystemCommand`] borrowing
//!    sub-slices of the line;
//! 3. **dispatch**: the command runs against the runtime and collaborators.

mod interpreter;
pub mod parse;

pub use interpreter::Interpreter;
pub use parse::{SystemCommand, read_float};

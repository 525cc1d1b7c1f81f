//! Character stream → lines.
//!
//! Realtime characters are picked off the stream as they arrive and never
//! reach the line buffer. Everything else is normalized (upper case, no
//! whitespace, no comments) and collected until end of line.

use mcs_common::consts::LINE_BUFFER_CAPACITY;
use mcs_common::machine::flags::ExecFlags;

use crate::runtime::SharedRuntime;

/// Realtime command characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeCommand {
    StatusReport,
    CycleStart,
    FeedHold,
    Reset,
}

impl RealtimeCommand {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'?' => Some(Self::StatusReport),
            b'~' => Some(Self::CycleStart),
            b'!' => Some(Self::FeedHold),
            0x18 => Some(Self::Reset),
            _ => None,
        }
    }

    /// Raise the matching request (serial receive interrupt).
    pub fn raise(self, shared: &SharedRuntime) {
        match self {
            Self::StatusReport => shared.signals.raise_exec(ExecFlags::STATUS_REPORT),
            Self::CycleStart => shared.signals.raise_exec(ExecFlags::CYCLE_START),
            Self::FeedHold => shared.signals.raise_exec(ExecFlags::FEED_HOLD),
            Self::Reset => {
                shared.request_reset();
            }
        }
    }
}

/// Result of feeding one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Byte consumed, line not complete.
    Pending,
    Realtime(RealtimeCommand),
    /// Complete line; empty for blank or comment-only lines.
    Line(heapless::String<LINE_BUFFER_CAPACITY>),
    /// Line exceeded the buffer and was dropped.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Comment {
    #[default]
    None,
    /// `( ... )`
    Paren,
    /// `;` to end of line.
    Semicolon,
}

/// Line assembler with a configurable length limit.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    buf: heapless::String<LINE_BUFFER_CAPACITY>,
    limit: usize,
    overflow: bool,
    comment: Comment,
}

impl LineAssembler {
    /// `limit` is clamped to the buffer capacity.
    pub fn new(limit: usize) -> Self {
        Self {
            buf: heapless::String::new(),
            limit: limit.min(LINE_BUFFER_CAPACITY),
            overflow: false,
            comment: Comment::None,
        }
    }

    /// Drop any partial line.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflow = false;
        self.comment = Comment::None;
    }

    pub fn push(&mut self, byte: u8) -> Received {
        if let Some(command) = RealtimeCommand::from_byte(byte) {
            return Received::Realtime(command);
        }
        if byte == b'\n' || byte == b'\r' {
            let overflow = self.overflow;
            let line = core::mem::take(&mut self.buf);
            self.clear();
            return if overflow {
                Received::Overflow
            } else {
                Received::Line(line)
            };
        }

        match self.comment {
            Comment::Semicolon => return Received::Pending,
            Comment::Paren => {
                if byte == b')' {
                    self.comment = Comment::None;
                }
                return Received::Pending;
            }
            Comment::None => {}
        }

        match byte {
            // Whitespace, control characters and block delete.
            0..=b' ' | b'/' | 0x7F.. => {}
            b'(' => self.comment = Comment::Paren,
            b';' => self.comment = Comment::Semicolon,
            _ if self.overflow => {}
            _ if self.buf.len() >= self.limit => self.overflow = true,
            _ => {
                let ch = char::from(byte.to_ascii_uppercase());
                if self.buf.push(ch).is_err() {
                    self.overflow = true;
                }
            }
        }
        Received::Pending
    }
}

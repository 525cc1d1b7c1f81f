//! `$` line admission and parsing.
//!
//! All functions take the line *without* its leading `$`.

use mcs_common::consts::MAX_SETTING_INDEX;
use mcs_common::machine::state::MachineState;

use crate::collab::RestoreScope;
use crate::error::CommandError;

/// Parsed administrative command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SystemCommand<'a> {
    /// `$`
    Help,
    /// `$$`
    DumpSettings,
    /// `$G`
    ParserModes,
    /// `$C`
    ToggleCheckMode,
    /// `$X`
    Unlock,
    /// `$#`
    Parameters,
    /// `$H`
    Home,
    /// `$I`
    BuildInfo,
    /// `$I=<text>`
    StoreBuildInfo(&'a str),
    /// `$RST=$`, `$RST=#`, `$RST=*`
    Restore(RestoreScope),
    /// `$N`
    StartupLines,
    /// `$N<index>=<gcode>`
    StoreStartupLine { index: u8, gcode: &'a str },
    /// `$<index>=<value>`
    StoreSetting { index: u8, value: f32 },
}

impl SystemCommand<'_> {
    /// Commands outside the Idle/Alarm admission gate.
    const fn is_state_free(head: Option<u8>) -> bool {
        matches!(head, None | Some(b'$' | b'G' | b'C' | b'X'))
    }
}

// ─── Numbers ────────────────────────────────────────────────────────

/// Read a decimal number at `*cursor` and advance past it.
///
/// Accepts an optional sign, digits and at most one decimal point. At least
/// one digit is required; exponents are not. On failure the cursor is left
/// untouched.
pub fn read_float(line: &[u8], cursor: &mut usize) -> Option<f32> {
    let mut pos = *cursor;
    let negative = match line.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let mut value: f64 = 0.0;
    let mut scale: f64 = 1.0;
    let mut digits = 0usize;
    let mut point = false;
    while let Some(&byte) = line.get(pos) {
        match byte {
            b'0'..=b'9' => {
                value = value * 10.0 + f64::from(byte - b'0');
                if point {
                    scale *= 10.0;
                }
                digits += 1;
            }
            b'.' if !point => point = true,
            _ => break,
        }
        pos += 1;
    }
    if digits == 0 {
        return None;
    }

    *cursor = pos;
    let value = (value / scale) as f32;
    Some(if negative { -value } else { value })
}

// ─── Admission ──────────────────────────────────────────────────────

/// State gate, checked before any syntax.
///
/// `$`, `$$`, `$G`, `$C` and `$X` pass here and apply their own state rules
/// at dispatch. Everything else needs Idle or Alarm; storing a startup line
/// needs Idle.
pub fn admit(body: &str, state: MachineState) -> Result<(), CommandError> {
    let bytes = body.as_bytes();
    let head = bytes.first().copied();
    if SystemCommand::is_state_free(head) {
        return Ok(());
    }
    if !state.accepts_settings() {
        return Err(CommandError::IdleError);
    }
    if head == Some(b'N') && bytes.len() > 1 && state != MachineState::Idle {
        return Err(CommandError::IdleError);
    }
    Ok(())
}

// ─── Parse ──────────────────────────────────────────────────────────

/// Parse an admitted line.
///
/// `startup_line_count` bounds the `$N<index>=` slot.
pub fn parse(body: &str, startup_line_count: u8) -> Result<SystemCommand<'_>, CommandError> {
    let Some(&head) = body.as_bytes().first() else {
        return Ok(SystemCommand::Help);
    };
    let rest = body.get(1..).unwrap_or_default();

    match head {
        b'$' | b'G' | b'C' | b'X' => {
            expect_end(rest)?;
            Ok(match head {
                b'$' => SystemCommand::DumpSettings,
                b'G' => SystemCommand::ParserModes,
                b'C' => SystemCommand::ToggleCheckMode,
                _ => SystemCommand::Unlock,
            })
        }
        b'#' => expect_end(rest).map(|()| SystemCommand::Parameters),
        b'H' => expect_end(rest).map(|()| SystemCommand::Home),
        b'I' => parse_build_info(rest),
        b'R' => parse_restore(rest),
        b'N' if rest.is_empty() => Ok(SystemCommand::StartupLines),
        b'N' => parse_startup_line(body, startup_line_count),
        _ => parse_setting(body),
    }
}

fn expect_end(rest: &str) -> Result<(), CommandError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CommandError::InvalidStatement)
    }
}

fn parse_build_info(rest: &str) -> Result<SystemCommand<'_>, CommandError> {
    if rest.is_empty() {
        return Ok(SystemCommand::BuildInfo);
    }
    rest.strip_prefix('=')
        .map(SystemCommand::StoreBuildInfo)
        .ok_or(CommandError::InvalidStatement)
}

fn parse_restore(rest: &str) -> Result<SystemCommand<'static>, CommandError> {
    match rest.as_bytes() {
        [b'S', b'T', b'=', scope] => RestoreScope::from_byte(*scope)
            .map(SystemCommand::Restore)
            .ok_or(CommandError::InvalidStatement),
        _ => Err(CommandError::InvalidStatement),
    }
}

/// Number at `*cursor` followed by `=`.
fn read_assignment_target(bytes: &[u8], cursor: &mut usize) -> Result<f32, CommandError> {
    let target = read_float(bytes, cursor).ok_or(CommandError::BadNumberFormat)?;
    if bytes.get(*cursor) != Some(&b'=') {
        return Err(CommandError::InvalidStatement);
    }
    *cursor += 1;
    Ok(target)
}

fn parse_startup_line(body: &str, startup_line_count: u8) -> Result<SystemCommand<'_>, CommandError> {
    let mut cursor = 1;
    let index = read_assignment_target(body.as_bytes(), &mut cursor)?.trunc();
    if index < 0.0 || index >= f32::from(startup_line_count) {
        return Err(CommandError::InvalidStatement);
    }
    let gcode = body.get(cursor..).ok_or(CommandError::InvalidStatement)?;
    Ok(SystemCommand::StoreStartupLine {
        index: index as u8,
        gcode,
    })
}

fn parse_setting(body: &str) -> Result<SystemCommand<'static>, CommandError> {
    let bytes = body.as_bytes();
    let mut cursor = 0;
    let index = read_assignment_target(bytes, &mut cursor)?;
    let value = read_float(bytes, &mut cursor).ok_or(CommandError::BadNumberFormat)?;
    if cursor != bytes.len() || !(0.0..=MAX_SETTING_INDEX).contains(&index) {
        return Err(CommandError::InvalidStatement);
    }
    Ok(SystemCommand::StoreSetting {
        index: index as u8,
        value,
    })
}

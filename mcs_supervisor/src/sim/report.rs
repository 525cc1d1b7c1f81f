//! Line-oriented text reporter.

use std::io::{self, Write};

use mcs_common::consts::N_AXIS;
use mcs_common::machine::flags::AlarmFlags;
use mcs_common::machine::state::MachineState;
use mcs_common::machine::status::{FeedbackMessage, StatusCode};

use super::realtime::RealtimeEvent;
use crate::collab::{Parameters, Reporter};

const HELP: &str = "[HLP:$$ $# $G $I $N $x=val $Nx=line $C $X $H $RST=$|#|* ~ ! ? ctrl-x]";

/// Alarm names, most severe first.
const ALARM_NAMES: [(AlarmFlags, &str); 5] = [
    (AlarmFlags::HARD_LIMIT, "Hard limit"),
    (AlarmFlags::SOFT_LIMIT, "Soft limit"),
    (AlarmFlags::ABORT_CYCLE, "Abort during cycle"),
    (AlarmFlags::PROBE_FAIL, "Probe fail"),
    (AlarmFlags::HOMING_FAIL, "Homing fail"),
];

fn axes(values: &[f32; N_AXIS]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.3}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Writes responses as text lines.
///
/// The first write error is kept and every later write is skipped; the host
/// polls [`TextReporter::take_error`] after each line.
#[derive(Debug)]
pub struct TextReporter<W> {
    out: W,
    version: &'static str,
    error: Option<io::Error>,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W, version: &'static str) -> Self {
        Self {
            out,
            version,
            error: None,
        }
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Banner printed at every (re)initialization.
    pub fn welcome(&mut self) {
        let banner = format!("MCS {} ['$' for help]", self.version);
        self.line(&banner);
    }

    pub fn event(&mut self, event: &RealtimeEvent) {
        match event {
            RealtimeEvent::StatusReport { state, mpos } => self.realtime_status(*state, mpos),
            RealtimeEvent::Alarm(alarm) => self.alarm(*alarm),
            RealtimeEvent::Feedback(message) => self.feedback(*message),
        }
    }

    fn line(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            self.error = Some(err);
        }
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn status(&mut self, status: StatusCode) {
        self.line(&status.to_string());
    }

    fn feedback(&mut self, message: FeedbackMessage) {
        self.line(&message.to_string());
    }

    fn help(&mut self) {
        self.line(HELP);
    }

    fn settings(&mut self, entries: &[(u8, f32)]) {
        for (index, value) in entries {
            self.line(&format!("${index}={value}"));
        }
    }

    fn parser_modes(&mut self, modes: &str) {
        self.line(&format!("[{modes}]"));
    }

    fn parameters(&mut self, parameters: &Parameters) {
        for row in &parameters.offsets {
            self.line(&format!("[{}:{}]", row.name, axes(&row.offset)));
        }
        self.line(&format!(
            "[PRB:{}:{}]",
            axes(&parameters.probe_position),
            u8::from(parameters.probe_succeeded)
        ));
    }

    fn build_info(&mut self, info: &str) {
        self.line(&format!("[{}:{info}]", self.version));
    }

    fn startup_line(&mut self, index: u8, line: &str) {
        self.line(&format!("$N{index}={line}"));
    }

    fn startup_echo(&mut self, line: &str) {
        self.line(&format!(">{line}"));
    }

    fn realtime_status(&mut self, state: MachineState, mpos: &[f32; N_AXIS]) {
        self.line(&format!("<{state},MPos:{}>", axes(mpos)));
    }

    fn alarm(&mut self, alarm: AlarmFlags) {
        let name = ALARM_NAMES
            .iter()
            .find(|(flag, _)| alarm.contains(*flag))
            .map_or("Unknown", |(_, name)| *name);
        self.line(&format!("ALARM: {name}"));
    }
}

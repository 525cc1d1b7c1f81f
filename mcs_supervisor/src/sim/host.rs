//! Simulated host: a byte stream in, text lines out.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use mcs_common::config::McsConfig;
use mcs_common::machine::state::MachineState;
use mcs_common::machine::status::{FeedbackMessage, StatusCode};
use tracing::{debug, error, info};

use super::gcode::SimGcode;
use super::protocol::{LineAssembler, Received};
use super::realtime::{SimInputs, SimMotion};
use super::report::TextReporter;
use super::settings::MemorySettings;
use crate::collab::{
    GcodeExecutor, Host, LoopExit, MotionControl, Reporter, Services, SettingsStore,
};
use crate::command::Interpreter;
use crate::control_pins::ControlPinHandler;
use crate::error::status_of;
use crate::runtime::{SharedRuntime, SystemRuntime};

/// Host around the supervisor, driven by a byte stream.
pub struct SimHost<R, W> {
    input: R,
    reporter: TextReporter<W>,
    settings: MemorySettings,
    gcode: SimGcode,
    motion: SimMotion,
    inputs: SimInputs,
    interpreter: Interpreter,
    assembler: LineAssembler,
    shared: Arc<SharedRuntime>,
}

impl<R: BufRead, W: Write> SimHost<R, W> {
    pub fn new(
        config: &McsConfig,
        shared: Arc<SharedRuntime>,
        input: R,
        output: W,
        probe_surface: Option<f32>,
    ) -> Self {
        let sup = &config.supervisor;
        let pins = ControlPinHandler::from_config(sup);
        // Released inputs read at their idle level.
        let inputs = SimInputs::new(sup.control_invert_mask());
        Self {
            input,
            reporter: TextReporter::new(output, env!("CARGO_PKG_VERSION")),
            settings: MemorySettings::new(&config.settings, sup.startup_line_count),
            gcode: SimGcode::new(sup.kinematics, probe_surface),
            motion: SimMotion::new(sup.kinematics, pins, inputs.clone()),
            inputs,
            interpreter: Interpreter::new(sup),
            assembler: LineAssembler::new(sup.line_buffer_size),
            shared,
        }
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut MemorySettings {
        &mut self.settings
    }

    /// Control port, for driving the simulated pins.
    pub fn inputs(&self) -> &SimInputs {
        &self.inputs
    }

    pub fn reporter(&self) -> &TextReporter<W> {
        &self.reporter
    }

    pub fn into_output(self) -> W {
        self.reporter.into_inner()
    }

    /// Push settings changes into the collaborators that cache them.
    fn sync_settings(&mut self) {
        let steps_per_mm = self.settings.steps_per_mm();
        self.gcode.sync_settings(self.settings.flags(), steps_per_mm);
        self.gcode.set_max_travel(self.settings.max_travel());
        self.motion.sync_settings(steps_per_mm);
    }

    fn execute_realtime(&mut self, rt: &mut SystemRuntime) {
        self.motion.execute_realtime(rt);
        for event in self.motion.take_events() {
            self.reporter.event(&event);
        }
    }

    fn with_services<T>(
        &mut self,
        rt: &mut SystemRuntime,
        f: impl FnOnce(&Interpreter, &mut SystemRuntime, &mut Services<'_>) -> T,
    ) -> T {
        self.sync_settings();
        let Self {
            reporter,
            settings,
            gcode,
            motion,
            inputs,
            interpreter,
            ..
        } = self;
        let mut svc = Services {
            reporter: &mut *reporter,
            settings: &mut *settings,
            gcode: &mut *gcode,
            motion: &mut *motion,
            inputs: &*inputs,
        };
        let out = f(interpreter, rt, &mut svc);
        for event in motion.take_events() {
            reporter.event(&event);
        }
        out
    }

    fn process_line(&mut self, line: &str, rt: &mut SystemRuntime) {
        debug!(line, "line received");
        let status = if line.is_empty() {
            StatusCode::Ok
        } else if line.starts_with('$') {
            self.with_services(rt, |interp, rt, svc| {
                status_of(interp.execute_line(line, rt, svc))
            })
        } else if rt.state.is(MachineState::Alarm) {
            StatusCode::AlarmLock
        } else {
            self.sync_settings();
            self.gcode.execute_line(line, rt)
        };
        self.reporter.status(status);
    }

    /// Banner, alarm notice or startup scripts at the top of each pass.
    fn enter_main_loop(&mut self, rt: &mut SystemRuntime) {
        self.reporter.welcome();
        if rt.state.is(MachineState::Alarm) {
            self.reporter.feedback(FeedbackMessage::AlarmLock);
            return;
        }
        rt.state.transition(MachineState::Idle);
        self.with_services(rt, |interp, rt, svc| interp.execute_startup(rt, svc));
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let buf = self.input.fill_buf()?;
        let Some(&byte) = buf.first() else {
            return Ok(None);
        };
        self.input.consume(1);
        Ok(Some(byte))
    }
}

impl<R: BufRead, W: Write> Host for SimHost<R, W> {
    fn reset_line_buffer(&mut self) {
        self.assembler.clear();
    }

    fn gcode_init(&mut self) {
        self.gcode.reset_modes();
    }

    fn stepper_reset(&mut self) {
        self.sync_settings();
    }

    fn gcode_sync_position(&mut self, rt: &SystemRuntime) {
        self.gcode.sync_position(rt);
    }

    fn main_loop(&mut self, rt: &mut SystemRuntime) -> LoopExit {
        self.enter_main_loop(rt);

        loop {
            self.execute_realtime(rt);
            if rt.abort {
                return LoopExit::Abort;
            }
            if let Some(err) = self.reporter.take_error() {
                error!(%err, "output closed");
                return LoopExit::Shutdown;
            }

            let byte = match self.next_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => {
                    info!("end of input");
                    return LoopExit::Shutdown;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    error!(%err, "input error");
                    return LoopExit::Shutdown;
                }
            };

            match self.assembler.push(byte) {
                Received::Pending => {}
                Received::Realtime(command) => command.raise(&self.shared),
                Received::Overflow => self.reporter.status(StatusCode::Overflow),
                Received::Line(line) => {
                    if self.motion.awaiting_reset() {
                        debug!(line = line.as_str(), "line ignored until reset");
                        continue;
                    }
                    self.process_line(&line, rt);
                }
            }
        }
    }
}

//! In-memory settings store.
//!
//! Numbered like the classic `$` settings table. Values live in RAM only;
//! individual records can be marked unreadable to model a corrupt store.

use std::collections::BTreeMap;

use mcs_common::config::SettingsDefaults;
use mcs_common::consts::{N_AXIS, X_AXIS, Y_AXIS, Z_AXIS};
use mcs_common::machine::flags::SettingsFlags;
use mcs_common::machine::status::StatusCode;

use super::gcode::DEFAULT_MAX_TRAVEL;
use crate::collab::{CoordinateOffset, RestoreScope, SettingsStore, StoredLine};

/// Minimum step pulse length [µs].
const STEP_PULSE_MIN_US: f32 = 3.0;

/// `$#` rows, in report order.
const COORDINATE_NAMES: [&str; 8] = ["G54", "G55", "G56", "G57", "G58", "G59", "G28", "G30"];

/// Boolean settings and the flag each one drives.
const FLAG_SETTINGS: [(u8, SettingsFlags); 7] = [
    (4, SettingsFlags::INVERT_ST_ENABLE),
    (5, SettingsFlags::INVERT_LIMIT_PINS),
    (6, SettingsFlags::INVERT_PROBE_PIN),
    (13, SettingsFlags::REPORT_INCHES),
    (20, SettingsFlags::SOFT_LIMIT_ENABLE),
    (21, SettingsFlags::HARD_LIMIT_ENABLE),
    (22, SettingsFlags::HOMING_ENABLE),
];

const STEP_PULSE: u8 = 0;
const SOFT_LIMITS: u8 = 20;
const HOMING: u8 = 22;
const STEPS_PER_MM: u8 = 100;
const MAX_TRAVEL: u8 = 130;

/// Copy `text` into a stored line, truncating at capacity.
pub fn stored_line(text: &str) -> StoredLine {
    let mut line = StoredLine::new();
    for ch in text.chars() {
        if line.push(ch).is_err() {
            break;
        }
    }
    line
}

fn factory_table(defaults: &SettingsDefaults) -> BTreeMap<u8, f32> {
    let flag = |on: bool| -> f32 { if on { 1.0 } else { 0.0 } };
    let mut table = BTreeMap::from([
        (0, 10.0),
        (1, 25.0),
        (2, 0.0),
        (3, 0.0),
        (4, 0.0),
        (5, 0.0),
        (6, flag(defaults.invert_probe_pin)),
        (10, 3.0),
        (11, 0.010),
        (12, 0.002),
        (13, 0.0),
        (20, flag(defaults.soft_limit_enable)),
        (21, flag(defaults.hard_limit_enable)),
        (22, flag(defaults.homing_enable)),
        (23, 0.0),
        (24, 25.0),
        (25, 500.0),
        (26, 250.0),
        (27, 1.0),
    ]);
    for axis in [X_AXIS, Y_AXIS, Z_AXIS] {
        let offset = axis as u8;
        table.insert(STEPS_PER_MM + offset, defaults.steps_per_mm[axis]);
        table.insert(110 + offset, 500.0);
        table.insert(120 + offset, 10.0);
        table.insert(MAX_TRAVEL + offset, DEFAULT_MAX_TRAVEL);
    }
    table
}

/// Settings store held in memory.
#[derive(Debug, Clone)]
pub struct MemorySettings {
    values: BTreeMap<u8, f32>,
    factory: BTreeMap<u8, f32>,
    startup: Vec<Option<StoredLine>>,
    build_info: Option<StoredLine>,
    factory_build_info: StoredLine,
    coordinates: [[f32; N_AXIS]; COORDINATE_NAMES.len()],
}

impl MemorySettings {
    pub fn new(defaults: &SettingsDefaults, startup_line_count: u8) -> Self {
        let factory = factory_table(defaults);
        let factory_build_info = stored_line(&defaults.build_info);
        Self {
            values: factory.clone(),
            factory,
            startup: vec![Some(StoredLine::new()); usize::from(startup_line_count)],
            build_info: Some(factory_build_info.clone()),
            factory_build_info,
            coordinates: [[0.0; N_AXIS]; COORDINATE_NAMES.len()],
        }
    }

    /// Current value of setting `index`.
    pub fn value(&self, index: u8) -> Option<f32> {
        self.values.get(&index).copied()
    }

    /// Max travel [mm] per axis (`$130`..`$132`).
    pub fn max_travel(&self) -> [f32; N_AXIS] {
        core::array::from_fn(|axis| self.value(MAX_TRAVEL + axis as u8).unwrap_or(DEFAULT_MAX_TRAVEL))
    }

    /// Mark a startup slot unreadable until it is stored again.
    pub fn corrupt_startup_line(&mut self, index: u8) {
        if let Some(slot) = self.startup.get_mut(usize::from(index)) {
            *slot = None;
        }
    }

    /// Mark the build info unreadable until it is stored again.
    pub fn corrupt_build_info(&mut self) {
        self.build_info = None;
    }

    /// Store a coordinate system row (`G10 L2`).
    pub fn set_coordinate_offset(&mut self, index: usize, offset: [f32; N_AXIS]) {
        if let Some(row) = self.coordinates.get_mut(index) {
            *row = offset;
        }
    }

    fn flag(&self, index: u8) -> bool {
        self.value(index).is_some_and(|v| v != 0.0)
    }
}

impl SettingsStore for MemorySettings {
    fn flags(&self) -> SettingsFlags {
        FLAG_SETTINGS
            .iter()
            .filter(|(index, _)| self.flag(*index))
            .fold(SettingsFlags::empty(), |acc, (_, flag)| acc | *flag)
    }

    fn steps_per_mm(&self) -> [f32; N_AXIS] {
        core::array::from_fn(|axis| self.value(STEPS_PER_MM + axis as u8).unwrap_or(1.0))
    }

    fn entries(&self) -> Vec<(u8, f32)> {
        self.values.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn store_global_setting(&mut self, index: u8, value: f32) -> Result<(), StatusCode> {
        if value < 0.0 {
            return Err(StatusCode::NegativeValue);
        }
        if !self.values.contains_key(&index) {
            return Err(StatusCode::InvalidStatement);
        }
        let is_flag = FLAG_SETTINGS.iter().any(|(i, _)| *i == index);
        let value = if is_flag {
            if value != 0.0 { 1.0 } else { 0.0 }
        } else {
            value
        };

        match index {
            STEP_PULSE if value < STEP_PULSE_MIN_US => return Err(StatusCode::SettingStepPulseMin),
            SOFT_LIMITS if value != 0.0 && !self.flag(HOMING) => {
                return Err(StatusCode::SoftLimitError);
            }
            HOMING if value == 0.0 => {
                // Soft limits need homed coordinates.
                self.values.insert(SOFT_LIMITS, 0.0);
            }
            i if (STEPS_PER_MM..STEPS_PER_MM + N_AXIS as u8).contains(&i) && value == 0.0 => {
                return Err(StatusCode::InvalidStatement);
            }
            _ => {}
        }
        self.values.insert(index, value);
        Ok(())
    }

    fn restore(&mut self, scope: RestoreScope) {
        if matches!(scope, RestoreScope::Settings | RestoreScope::All) {
            self.values = self.factory.clone();
        }
        if matches!(scope, RestoreScope::Parameters | RestoreScope::All) {
            self.coordinates = [[0.0; N_AXIS]; COORDINATE_NAMES.len()];
        }
        if scope == RestoreScope::All {
            self.startup.fill(Some(StoredLine::new()));
            self.build_info = Some(self.factory_build_info.clone());
        }
    }

    fn read_startup_line(&self, index: u8) -> Option<StoredLine> {
        self.startup.get(usize::from(index)).cloned().flatten()
    }

    fn store_startup_line(&mut self, index: u8, line: &str) {
        if let Some(slot) = self.startup.get_mut(usize::from(index)) {
            *slot = Some(stored_line(line));
        }
    }

    fn read_build_info(&self) -> Option<StoredLine> {
        self.build_info.clone()
    }

    fn store_build_info(&mut self, info: &str) {
        self.build_info = Some(stored_line(info));
    }

    fn coordinate_offsets(&self) -> Vec<CoordinateOffset> {
        COORDINATE_NAMES
            .iter()
            .zip(&self.coordinates)
            .map(|(name, offset)| CoordinateOffset {
                name: *name,
                offset: *offset,
            })
            .collect()
    }
}

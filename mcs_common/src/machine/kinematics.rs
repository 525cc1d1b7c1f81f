//! Motor steps → machine coordinates.
//!
//! Motor step counters and machine axes are not always the same frame:
//! CoreXY couples X and Y through two belts. The mapping is selected once
//! from configuration and used wherever positions are reported.

use serde::{Deserialize, Serialize};

use super::Position;
use crate::consts::{A_MOTOR, B_MOTOR, N_AXIS, X_AXIS, Y_AXIS};

/// Motor-to-axis step mapping.
pub trait Kinematics: Send + Sync {
    /// Axis `axis` position in that axis' step units.
    fn axis_steps(&self, steps: &Position, axis: usize) -> i32;

    /// Motor whose steps-per-mm scale axis `axis`.
    fn scale_motor(&self, axis: usize) -> usize {
        axis
    }
}

/// Axes map one-to-one onto motors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cartesian;

impl Kinematics for Cartesian {
    #[inline]
    fn axis_steps(&self, steps: &Position, axis: usize) -> i32 {
        steps[axis]
    }
}

/// CoreXY: X = (A + B) / 2, Y = (A − B) / 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreXy;

impl Kinematics for CoreXy {
    #[inline]
    fn axis_steps(&self, steps: &Position, axis: usize) -> i32 {
        match axis {
            X_AXIS => half_i32(i64::from(steps[A_MOTOR]) + i64::from(steps[B_MOTOR])),
            Y_AXIS => half_i32(i64::from(steps[A_MOTOR]) - i64::from(steps[B_MOTOR])),
            _ => steps[axis],
        }
    }

    fn scale_motor(&self, axis: usize) -> usize {
        match axis {
            X_AXIS => A_MOTOR,
            Y_AXIS => B_MOTOR,
            _ => axis,
        }
    }
}

/// Half of a sum or difference of two `i32`, which always fits back.
#[inline]
fn half_i32(twice: i64) -> i32 {
    (twice / 2) as i32
}

/// Kinematics variant selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KinematicsKind {
    #[default]
    Cartesian,
    CoreXy,
}

impl KinematicsKind {
    /// Static instance of the selected mapping.
    pub fn mapping(self) -> &'static dyn Kinematics {
        match self {
            Self::Cartesian => &Cartesian,
            Self::CoreXy => &CoreXy,
        }
    }
}

/// Machine position [mm] of a single axis.
#[inline]
pub fn axis_steps_to_mpos(
    kin: &dyn Kinematics,
    steps: &Position,
    steps_per_mm: &[f32; N_AXIS],
    axis: usize,
) -> f32 {
    kin.axis_steps(steps, axis) as f32 / steps_per_mm[kin.scale_motor(axis)]
}

/// Machine position [mm] of all axes.
pub fn steps_to_mpos(
    kin: &dyn Kinematics,
    steps: &Position,
    steps_per_mm: &[f32; N_AXIS],
) -> [f32; N_AXIS] {
    core::array::from_fn(|axis| axis_steps_to_mpos(kin, steps, steps_per_mm, axis))
}

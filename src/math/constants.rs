/* Copyright 2020 @Yuchen Wong */

use nalgebra as na;

pub type Float = f64;
pub type Int = i64;

pub type Vector2f = na::Vector2<Float>;

pub const EPSILON: Float = 1e-9;
pub const PI: Float = std::f64::consts::PI;

/// Detector thickness in microns.
pub const SENSOR_THICKNESS: Float = 100.0;
/// kT/q in volts at room temperature.
pub const THERMAL_VOLTAGE_298K: Float = 0.026;
pub const ROOM_TEMPERATURE: Float = 298.0;

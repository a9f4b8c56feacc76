// Copyright @yucwang 2026

use crate::core::config::{Config, ConfigError, ConfigValue};
use crate::error::SensorError;
use crate::math::constants::{Float, Int, ROOM_TEMPERATURE, SENSOR_THICKNESS, THERMAL_VOLTAGE_298K};

/// Detector electronics that set the thermal diffusion of collected charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionParams {
    /// None when the configured value is not a whole number.
    pub collecting_phases: Option<Int>,
    /// Microns.
    pub pixel_size: Float,
    /// Microns.
    pub channel_stop_width: Float,
    pub vbb: Float,
    pub vparallel_lo: Float,
    pub vparallel_hi: Float,
    /// Kelvin.
    pub temperature: Float,
}

impl DiffusionParams {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            collecting_phases: whole_number(config.require("CollectingPhases")?),
            pixel_size: config.require_float("PixelSize")?,
            channel_stop_width: config.require_float("ChannelStopWidth")?,
            vbb: config.require_float("Vbb")?,
            vparallel_lo: config.require_float("Vparallel_lo")?,
            vparallel_hi: config.require_float("Vparallel_hi")?,
            temperature: config.require_float("CCDTemperature")?,
        })
    }

    /// Collection well in units of the pixel, or None when the number of
    /// collecting phases is not modelled. Informational only: the diffusion
    /// step does not depend on it.
    pub fn collection_area(&self) -> Option<CollectionArea> {
        let (y_min, y_width) = match self.collecting_phases {
            Some(1) => (1.0 / 3.0, 1.0 / 3.0),
            Some(2) => (1.0 / 6.0, 2.0 / 3.0),
            _ => return None,
        };
        Some(CollectionArea {
            x_min: self.channel_stop_width / (2.0 * self.pixel_size),
            x_width: (self.pixel_size - self.channel_stop_width) / self.pixel_size,
            y_min,
            y_width,
        })
    }

    /// Potential difference between the collecting gates and the back
    /// contact, None when the number of collecting phases is not modelled.
    pub fn vdiff(&self) -> Option<Float> {
        match self.collecting_phases {
            Some(1) => Some((2.0 * self.vparallel_lo + self.vparallel_hi) / 3.0 - self.vbb),
            Some(2) => Some((self.vparallel_lo + 2.0 * self.vparallel_hi) / 3.0 - self.vbb),
            _ => None,
        }
    }
}

fn whole_number(value: &ConfigValue) -> Option<Int> {
    match value {
        ConfigValue::Int(v) => Some(*v),
        ConfigValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as Int),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionArea {
    pub x_min: Float,
    pub x_width: Float,
    pub y_min: Float,
    pub y_width: Float,
}

/// Mean lateral diffusion, in microns, of a carrier crossing the full
/// thickness of the sensor.
///
/// Returns 0.0 (diffusion off) with a warning when `collecting_phases` is
/// neither 1 nor 2. A non-positive potential difference gives a non-finite
/// step, which is reported as [`SensorError::NonFiniteDiffusion`]; a negative
/// `diff_mult` is [`SensorError::NegativeDiffMult`].
pub fn calc_diff_step(params: &DiffusionParams, diff_mult: Float) -> Result<Float, SensorError> {
    if diff_mult < 0.0 {
        return Err(SensorError::NegativeDiffMult(diff_mult));
    }
    let vdiff = match params.vdiff() {
        Some(v) => v,
        None => {
            match params.collecting_phases {
                Some(n) => log::warn!("CollectingPhases = {} is not supported, diffusion turned off.", n),
                None => log::warn!("CollectingPhases is not a whole number, diffusion turned off."),
            }
            return Ok(0.0);
        }
    };
    if let Some(area) = params.collection_area() {
        log::debug!("Collection area: {:?}", area);
    }

    let diff_step = SENSOR_THICKNESS
        * (2.0 * THERMAL_VOLTAGE_298K * params.temperature / ROOM_TEMPERATURE / vdiff).sqrt()
        * diff_mult;
    if !diff_step.is_finite() {
        return Err(SensorError::NonFiniteDiffusion { vdiff });
    }
    Ok(diff_step)
}

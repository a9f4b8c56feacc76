// Copyright @yucwang 2026

use crate::core::photon::PhotonArray;
use crate::core::sensor::Sensor;
use crate::error::SensorError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

/// Each photon becomes charge in the pixel directly beneath it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSensor;

impl SimpleSensor {
    pub fn new() -> Self {
        Self
    }
}

impl Sensor for SimpleSensor {
    fn accumulate(&mut self, photons: &PhotonArray, image: &mut Bitmap) -> Result<Float, SensorError> {
        Ok(photons.add_to(image))
    }

    fn describe(&self) -> String {
        String::from("SimpleSensor")
    }
}

// Copyright @yucwang 2026

use crate::core::photon::PhotonArray;
use crate::error::SensorError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

/// Turns photons incident on the top of the detector into charge in the
/// pixels of an image.
pub trait Sensor {
    /// Adds the charge of `photons` to `image`, returning the total added.
    fn accumulate(&mut self, photons: &PhotonArray, image: &mut Bitmap) -> Result<Float, SensorError>;

    fn describe(&self) -> String {
        String::from("Sensor")
    }
}

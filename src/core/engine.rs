// Copyright @yucwang 2026

use crate::core::photon::PhotonArray;
use crate::core::rng::RandomSource;
use crate::error::SensorError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

/// Everything a charge transport engine is built from.
#[derive(Debug, Clone)]
pub struct EngineParams {
    pub num_vertices: usize,
    /// Electrons in the reference pixel of the Poisson simulation.
    pub num_elec: usize,
    pub nx: usize,
    pub ny: usize,
    /// Reach, in pixels, of the charge-induced distortion.
    pub qdist: usize,
    /// Photons between recomputations of the distorted pixel shapes.
    pub nrecalc: usize,
    /// Microns.
    pub diff_step: Float,
    /// Microns.
    pub pixel_size: Float,
    pub geometry: Vec<Float>,
}

/// Converts photons into electrons and drifts them into the image pixels.
/// Implementations may keep state between calls.
pub trait AccumulationEngine {
    fn from_params(params: EngineParams) -> Result<Self, SensorError>
    where
        Self: Sized;

    /// Adds the collected charge to `image` and returns the total added.
    fn accumulate(&mut self, photons: &PhotonArray, rng: &mut dyn RandomSource, image: &mut Bitmap) -> Float;

    fn describe(&self) -> String {
        String::from("AccumulationEngine")
    }
}

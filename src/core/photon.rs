// Copyright @yucwang 2026

use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Int};

/// Batch of photons incident on the top of the sensor. Positions are in
/// pixel units; wavelengths and incidence slopes are optional per batch.
#[derive(Debug, Clone, Default)]
pub struct PhotonArray {
    x: Vec<Float>,
    y: Vec<Float>,
    flux: Vec<Float>,
    wavelength: Option<Vec<Float>>,
    angles: Option<(Vec<Float>, Vec<Float>)>,
}

impl PhotonArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Photons of unit flux at the given positions.
    pub fn from_positions(x: Vec<Float>, y: Vec<Float>) -> Self {
        assert_eq!(x.len(), y.len());
        let flux = vec![1.0; x.len()];
        Self { x, y, flux, wavelength: None, angles: None }
    }

    pub fn push(&mut self, x: Float, y: Float, flux: Float) {
        self.x.push(x);
        self.y.push(y);
        self.flux.push(flux);
        if let Some(wavelength) = self.wavelength.as_mut() {
            wavelength.push(0.0);
        }
        if let Some((dxdz, dydz)) = self.angles.as_mut() {
            dxdz.push(0.0);
            dydz.push(0.0);
        }
    }

    pub fn with_wavelengths(mut self, wavelength: Vec<Float>) -> Self {
        assert_eq!(wavelength.len(), self.x.len());
        self.wavelength = Some(wavelength);
        self
    }

    pub fn with_angles(mut self, dxdz: Vec<Float>, dydz: Vec<Float>) -> Self {
        assert_eq!(dxdz.len(), self.x.len());
        assert_eq!(dydz.len(), self.x.len());
        self.angles = Some((dxdz, dydz));
        self
    }

    pub fn size(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self, i: usize) -> Float {
        self.x[i]
    }

    pub fn y(&self, i: usize) -> Float {
        self.y[i]
    }

    pub fn flux(&self, i: usize) -> Float {
        self.flux[i]
    }

    pub fn has_allocated_wavelengths(&self) -> bool {
        self.wavelength.is_some()
    }

    pub fn has_allocated_angles(&self) -> bool {
        self.angles.is_some()
    }

    pub fn wavelength(&self, i: usize) -> Option<Float> {
        self.wavelength.as_ref().map(|w| w[i])
    }

    pub fn dxdz(&self, i: usize) -> Option<Float> {
        self.angles.as_ref().map(|(dxdz, _)| dxdz[i])
    }

    pub fn dydz(&self, i: usize) -> Option<Float> {
        self.angles.as_ref().map(|(_, dydz)| dydz[i])
    }

    pub fn total_flux(&self) -> Float {
        self.flux.iter().sum()
    }

    /// Drops every photon into the pixel whose centre is nearest. Photons
    /// falling off the image are ignored. Returns the flux actually added.
    pub fn add_to(&self, image: &mut Bitmap) -> Float {
        let mut added = 0.0;
        for i in 0..self.size() {
            let ix = (self.x[i] + 0.5).floor() as Int;
            let iy = (self.y[i] + 0.5).floor() as Int;
            if image.add(ix, iy, self.flux[i]) {
                added += self.flux[i];
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_to_nearest_pixel() {
        let photons = PhotonArray::from_positions(vec![3.0, 3.49, 2.51, 9.0],
                                                  vec![4.0, 3.6, 4.2, 1.0]);
        let mut image = Bitmap::new(8, 8);
        let added = photons.add_to(&mut image);

        assert_eq!(added, 3.0);
        assert_eq!(image.get(3, 4), 3.0);
        assert_eq!(image.sum(), 3.0);
    }

    #[test]
    fn test_optional_fields() {
        let photons = PhotonArray::from_positions(vec![0.0, 1.0], vec![0.0, 1.0]);
        assert!(!photons.has_allocated_wavelengths());
        assert!(!photons.has_allocated_angles());
        assert_eq!(photons.wavelength(1), None);

        let photons = photons.with_wavelengths(vec![500.0, 600.0])
                             .with_angles(vec![0.1, 0.2], vec![-0.1, -0.2]);
        assert_eq!(photons.wavelength(1), Some(600.0));
        assert_eq!(photons.dxdz(0), Some(0.1));
        assert_eq!(photons.dydz(1), Some(-0.2));
    }
}

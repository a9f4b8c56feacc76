// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Int };

use std::ops;
use std::vec::Vec;

/// Charge image. Pixel `(x_min, y_min)` is the first element and pixel
/// centres sit at integer coordinates.
#[derive(Debug, Clone)]
pub struct Bitmap {
    data: Vec<Float>,
    height: usize,
    width: usize,
    x_min: Int,
    y_min: Int,
}

impl ops::Index<(usize, usize)> for Bitmap {
    type Output = Float;

    fn index(&self, index: (usize, usize)) -> &Float {
        assert!(index.0 < self.width && index.1 < self.height);
        &self.data[index.0 + self.width * index.1]
    }
}

impl ops::IndexMut<(usize, usize)> for Bitmap {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Float {
        assert!(index.0 < self.width && index.1 < self.height);
        &mut self.data[index.0 + self.width * index.1]
    }
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_origin(width, height, 0, 0)
    }

    pub fn with_origin(width: usize, height: usize, x_min: Int, y_min: Int) -> Self {
        Self { data: vec![0.0; width * height],
               width,
               height,
               x_min,
               y_min }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn x_min(&self) -> Int {
        self.x_min
    }

    pub fn y_min(&self) -> Int {
        self.y_min
    }

    pub fn x_max(&self) -> Int {
        self.x_min + self.width as Int - 1
    }

    pub fn y_max(&self) -> Int {
        self.y_min + self.height as Int - 1
    }

    fn offset(&self, ix: Int, iy: Int) -> Option<usize> {
        let dx = ix - self.x_min;
        let dy = iy - self.y_min;
        if dx < 0 || dy < 0 || dx >= self.width as Int || dy >= self.height as Int {
            return None;
        }
        Some(dx as usize + self.width * dy as usize)
    }

    pub fn contains(&self, ix: Int, iy: Int) -> bool {
        self.offset(ix, iy).is_some()
    }

    /// Value of the pixel at absolute coordinates, zero outside the image.
    pub fn get(&self, ix: Int, iy: Int) -> Float {
        self.offset(ix, iy).map(|i| self.data[i]).unwrap_or(0.0)
    }

    /// Adds `value` to the pixel at absolute coordinates. Returns false when
    /// the pixel lies outside the image and nothing was added.
    pub fn add(&mut self, ix: Int, iy: Int, value: Float) -> bool {
        match self.offset(ix, iy) {
            Some(i) => {
                self.data[i] += value;
                true
            }
            None => false,
        }
    }

    pub fn sum(&self) -> Float {
        self.data.iter().sum()
    }

    pub fn max(&self) -> Float {
        self.data.iter().cloned().fold(Float::NEG_INFINITY, Float::max)
    }

    pub fn fill(&mut self, value: Float) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    pub fn as_slice(&self) -> &[Float] {
        &self.data
    }
}

// Copyright @yucwang 2026

//! Charge collection with thermal diffusion and pixel boundaries that move
//! in proportion to the charge already collected nearby.
//!
//! The vertex data comes from a Poisson simulation of an `nx x ny` grid with
//! `num_elec` electrons in its central pixel `(nx/2, ny/2)`. Each row is
//! `ix iy theta x y`: the pixel, the angle (radians) of the vertex seen from
//! the pixel centre, and the vertex position in microns, pixel `(ix, iy)`
//! spanning `[ix, ix+1) x [iy, iy+1)` pixel sizes. Dividing the offset of
//! every vertex from the square boundary by `num_elec` gives the shift that
//! one electron at a given pixel offset induces.

use crate::core::engine::{AccumulationEngine, EngineParams};
use crate::core::photon::PhotonArray;
use crate::core::rng::RandomSource;
use crate::error::SensorError;
use crate::io::vertex::{expected_vertex_count, vertex_pixel_rows, VERTEX_COLUMNS};
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Int, Vector2f, PI, SENSOR_THICKNESS};
use crate::math::polygon::{square_boundary_point, Polygon};

pub struct BrighterFatterEngine {
    qdist: usize,
    nrecalc: usize,
    diff_step: Float,
    pixel_size: Float,
    base: Polygon,
    // per-electron vertex shifts, row-major over offsets -qdist..=qdist
    shifts: Vec<Vec<Vector2f>>,
    shapes: Vec<Polygon>,
    since_recalc: usize,
}

struct VertexRow {
    theta: Float,
    offset: Vector2f,
}

fn parse_pixel(rows: &[Float], ix: usize, iy: usize, pixel_size: Float) -> Result<Vec<VertexRow>, SensorError> {
    let mut out = Vec::with_capacity(rows.len() / VERTEX_COLUMNS);
    for row in rows.chunks_exact(VERTEX_COLUMNS) {
        if row[0].round() as usize != ix || row[1].round() as usize != iy {
            return Err(SensorError::Engine(format!(
                "vertex rows for pixel ({}, {}) are interleaved with pixel ({}, {})",
                ix, iy, row[0], row[1])));
        }
        let theta = row[2].rem_euclid(2.0 * PI);
        let centre = Vector2f::new(ix as Float + 0.5, iy as Float + 0.5);
        let position = Vector2f::new(row[3], row[4]) / pixel_size - centre;
        out.push(VertexRow { theta, offset: position - square_boundary_point(theta) });
    }
    out.sort_by(|a, b| a.theta.total_cmp(&b.theta));
    Ok(out)
}

impl BrighterFatterEngine {
    fn side(&self) -> usize {
        2 * self.qdist + 1
    }

    pub fn shift(&self, dx: Int, dy: Int) -> Option<&[Vector2f]> {
        let q = self.qdist as Int;
        if dx.abs() > q || dy.abs() > q {
            return None;
        }
        let index = (dx + q) as usize + self.side() * (dy + q) as usize;
        Some(&self.shifts[index])
    }

    pub fn base_shape(&self) -> &Polygon {
        &self.base
    }

    /// Shape of image pixel `(ix, iy)` relative to its centre, as of the last
    /// recomputation.
    pub fn pixel_shape(&self, image: &Bitmap, ix: Int, iy: Int) -> Option<&Polygon> {
        if !image.contains(ix, iy) || self.shapes.len() != image.width() * image.height() {
            return None;
        }
        let index = (ix - image.x_min()) as usize + image.width() * (iy - image.y_min()) as usize;
        Some(&self.shapes[index])
    }

    /// Rebuilds every pixel boundary of `image` from its current charge.
    pub fn update_shapes(&mut self, image: &Bitmap) {
        let q = self.qdist as Int;
        let mut shapes = Vec::with_capacity(image.width() * image.height());
        for iy in image.y_min()..=image.y_max() {
            for ix in image.x_min()..=image.x_max() {
                let mut shape = self.base.clone();
                for dy in -q..=q {
                    for dx in -q..=q {
                        let charge = image.get(ix - dx, iy - dy);
                        if charge == 0.0 {
                            continue;
                        }
                        if let Some(shift) = self.shift(dx, dy) {
                            for (v, s) in shape.vertices_mut().iter_mut().zip(shift) {
                                *v += s * charge;
                            }
                        }
                    }
                }
                shapes.push(shape);
            }
        }
        self.shapes = shapes;
        self.since_recalc = 0;
        log::debug!("Recomputed {} pixel shapes.", self.shapes.len());
    }

    fn collecting_pixel(&self, image: &Bitmap, p: &Vector2f) -> (Int, Int) {
        let nominal = ((p.x + 0.5).floor() as Int, (p.y + 0.5).floor() as Int);
        let candidates = std::iter::once((0, 0))
            .chain((-1..=1).flat_map(|dy| (-1..=1).map(move |dx| (dx, dy))).filter(|d| *d != (0, 0)));
        for (dx, dy) in candidates {
            let (ix, iy) = (nominal.0 + dx, nominal.1 + dy);
            if let Some(shape) = self.pixel_shape(image, ix, iy) {
                let local = p - Vector2f::new(ix as Float, iy as Float);
                if shape.contains(&local) {
                    return (ix, iy);
                }
            }
        }
        nominal
    }
}

impl AccumulationEngine for BrighterFatterEngine {
    fn from_params(params: EngineParams) -> Result<Self, SensorError> {
        let expected = expected_vertex_count(params.nx, params.ny, params.num_vertices);
        if params.geometry.len() != expected {
            return Err(SensorError::Engine(format!(
                "{} vertex values for a {}x{} grid, expected {}",
                params.geometry.len(), params.nx, params.ny, expected)));
        }
        if params.num_elec == 0 || params.nrecalc == 0 {
            return Err(SensorError::Engine(String::from("NumElec and Nrecalc must be positive")));
        }
        if !(params.pixel_size > 0.0) {
            return Err(SensorError::Engine(format!("pixel size {} is not positive", params.pixel_size)));
        }
        let (cx, cy) = (params.nx / 2, params.ny / 2);
        if params.qdist > cx || params.qdist > cy
            || cx + params.qdist >= params.nx || cy + params.qdist >= params.ny {
            return Err(SensorError::Engine(format!(
                "QDist = {} reaches beyond the {}x{} Poisson grid", params.qdist, params.nx, params.ny)));
        }

        let rows_per_pixel = vertex_pixel_rows(params.num_vertices);
        let values_per_pixel = VERTEX_COLUMNS * rows_per_pixel;
        let side = 2 * params.qdist + 1;
        let mut shifts = vec![Vec::new(); side * side];
        let mut base = None;
        for (g, rows) in params.geometry.chunks_exact(values_per_pixel).enumerate() {
            let ix = rows[0].round() as usize;
            let iy = rows[1].round() as usize;
            if ix >= params.nx || iy >= params.ny {
                return Err(SensorError::Engine(format!("vertex group {} names pixel ({}, {})", g, rows[0], rows[1])));
            }
            let dx = ix as Int - cx as Int;
            let dy = iy as Int - cy as Int;
            let q = params.qdist as Int;
            if dx.abs() > q || dy.abs() > q {
                continue;
            }
            let vertices = parse_pixel(rows, ix, iy, params.pixel_size)?;
            if base.is_none() {
                base = Some(Polygon::new(vertices.iter().map(|v| square_boundary_point(v.theta)).collect()));
            }
            let index = (dx + q) as usize + side * (dy + q) as usize;
            shifts[index] = vertices.iter().map(|v| v.offset / params.num_elec as Float).collect();
        }
        if shifts.iter().any(|s| s.is_empty()) {
            return Err(SensorError::Engine(String::from("vertex data does not cover the QDist neighbourhood")));
        }
        let base = base.unwrap_or_else(|| Polygon::new(Vec::new()));

        log::debug!("BrighterFatterEngine: {} vertices per pixel, QDist = {}, Nrecalc = {}, DiffStep = {:.4} um.",
                    rows_per_pixel, params.qdist, params.nrecalc, params.diff_step);
        Ok(Self {
            qdist: params.qdist,
            nrecalc: params.nrecalc,
            diff_step: params.diff_step,
            pixel_size: params.pixel_size,
            base,
            shifts,
            shapes: Vec::new(),
            since_recalc: 0,
        })
    }

    fn accumulate(&mut self, photons: &PhotonArray, rng: &mut dyn RandomSource, image: &mut Bitmap) -> Float {
        self.update_shapes(image);
        let mut added = 0.0;
        for i in 0..photons.size() {
            if self.since_recalc >= self.nrecalc {
                self.update_shapes(image);
            }
            // conversion depth below the entrance surface, microns
            let depth = rng.uniform() * SENSOR_THICKNESS;
            let mut p = Vector2f::new(photons.x(i), photons.y(i));
            if let (Some(dxdz), Some(dydz)) = (photons.dxdz(i), photons.dydz(i)) {
                p += Vector2f::new(dxdz, dydz) * (depth / self.pixel_size);
            }
            if self.diff_step > 0.0 {
                let drift = SENSOR_THICKNESS - depth;
                let sigma = self.diff_step * (drift / SENSOR_THICKNESS).sqrt() / self.pixel_size;
                p += Vector2f::new(rng.gaussian(), rng.gaussian()) * sigma;
            }
            let (ix, iy) = self.collecting_pixel(image, &p);
            if image.add(ix, iy, photons.flux(i)) {
                added += photons.flux(i);
            }
            self.since_recalc += 1;
        }
        added
    }

    fn describe(&self) -> String {
        format!("BrighterFatterEngine\n  qdist: {}\n  nrecalc: {}\n  diff_step: {}\n  pixel_size: {}",
                self.qdist, self.nrecalc, self.diff_step, self.pixel_size)
    }
}

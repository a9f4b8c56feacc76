use silicon_sensor::math::constants::{Float, Int, Vector2f};
use std::fs;
use std::path::{Path, PathBuf};

pub const NUM_VERTICES: usize = 2;
pub const GRID: usize = 9;
pub const PIXEL_SIZE: Float = 10.0;

pub fn config_text(collecting_phases: i32) -> String {
    format!("\
# Poisson simulator settings
CollectingPhases = {}
PixelSize = 10.0
ChannelStopWidth = 2.0
Vbb = -40.0
Vparallel_lo = -8.0
Vparallel_hi = 4.0
CCDTemperature = 173.0
NumVertices = {}
PixelBoundaryNx = {}
PixelBoundaryNy = {}
", collecting_phases, NUM_VERTICES, GRID, GRID)
}

fn square_vertices() -> Vec<Vector2f> {
    let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
    let mut out = Vec::new();
    for k in 0..4 {
        let a = Vector2f::new(corners[k].0, corners[k].1);
        let b = Vector2f::new(corners[(k + 1) % 4].0, corners[(k + 1) % 4].1);
        for j in 0..=NUM_VERTICES {
            out.push(a + (b - a) * (j as Float / (NUM_VERTICES + 1) as Float));
        }
    }
    out
}

/// Writes a vertex file whose pixels are distorted by `distort`, given the
/// pixel offset from the reference pixel and the undistorted local vertex.
pub fn write_vertex_file<F>(path: &Path, distort: F)
where
    F: Fn((Int, Int), Vector2f) -> Vector2f,
{
    let mut text = String::from("X0 Y0 Theta X Y\n");
    for ix in 0..GRID {
        for iy in 0..GRID {
            let offset = (ix as Int - (GRID / 2) as Int, iy as Int - (GRID / 2) as Int);
            for v in square_vertices() {
                let d = distort(offset, v);
                text.push_str(&format!("{} {} {:.12} {:.12} {:.12}\n",
                                       ix, iy, v.y.atan2(v.x),
                                       (ix as Float + 0.5 + d.x) * PIXEL_SIZE,
                                       (iy as Float + 0.5 + d.y) * PIXEL_SIZE));
            }
        }
    }
    fs::write(path, text).unwrap();
}

pub fn write_inputs<F>(dir: &Path, collecting_phases: i32, distort: F) -> (PathBuf, PathBuf)
where
    F: Fn((Int, Int), Vector2f) -> Vector2f,
{
    let config = dir.join("sensor.cfg");
    fs::write(&config, config_text(collecting_phases)).unwrap();
    let vertices = dir.join("sensor.vertices");
    write_vertex_file(&vertices, distort);
    (config, vertices)
}

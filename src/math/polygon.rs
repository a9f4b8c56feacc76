// Copyright @yucwang 2026

use super::constants::{ Float, Vector2f };

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vector2f>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vector2f>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vector2f] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [Vector2f] {
        &mut self.vertices
    }

    pub fn translated(&self, offset: &Vector2f) -> Polygon {
        Polygon::new(self.vertices.iter().map(|v| v + offset).collect())
    }

    /// Even-odd rule. Points on the lower/left edges count as inside.
    pub fn contains(&self, p: &Vector2f) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = &self.vertices[i];
            let vj = &self.vertices[j];
            if (vi.y > p.y) != (vj.y > p.y) {
                let x_cross = vj.x + (p.y - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Shoelace area, positive for counter-clockwise vertices.
    pub fn signed_area(&self) -> Float {
        let n = self.vertices.len();
        let mut area = 0.0;
        for i in 0..n {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % n];
            area += a.x * b.y - b.x * a.y;
        }
        0.5 * area
    }
}

/// Point on the boundary of the unit pixel centred on the origin, seen from
/// the centre at angle `theta`.
pub fn square_boundary_point(theta: Float) -> Vector2f {
    let (s, c) = theta.sin_cos();
    let r = 0.5 / c.abs().max(s.abs());
    Vector2f::new(r * c, r * s)
}

// Copyright @yucwang 2026

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::math::constants::Float;

/// Columns per vertex row: `ix iy theta x y`.
pub const VERTEX_COLUMNS: usize = 5;

#[derive(thiserror::Error, Debug)]
pub enum GeometryError {
    #[error("vertex file {0} not found")]
    NotFound(PathBuf),
    #[error("failed to read vertex file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid number {token:?} on line {line} of the vertex file")]
    Parse { line: usize, token: String },
    #[error("vertex data holds {found} values, the configuration expects {expected}")]
    SizeMismatch { expected: usize, found: usize },
}
type Result<T> = std::result::Result<T, GeometryError>;

/// Vertex rows describing one pixel boundary.
pub fn vertex_pixel_rows(num_vertices: usize) -> usize {
    4 * num_vertices + 4
}

/// Number of values a vertex file must hold for an `nx x ny` grid with
/// `num_vertices` vertices per pixel edge. Saturates at `usize::MAX`, which
/// no file can match.
pub fn expected_vertex_count(nx: usize, ny: usize, num_vertices: usize) -> usize {
    num_vertices.checked_mul(4)
        .and_then(|v| v.checked_add(4))
        .and_then(|rows| rows.checked_mul(VERTEX_COLUMNS))
        .and_then(|v| v.checked_mul(nx))
        .and_then(|v| v.checked_mul(ny))
        .unwrap_or(usize::MAX)
}

/// Distorted pixel boundaries produced by the Poisson simulator, validated
/// against the grid described by the configuration.
#[derive(Debug, Clone)]
pub struct VertexGeometry {
    data: Vec<Float>,
    nx: usize,
    ny: usize,
    num_vertices: usize,
}

impl VertexGeometry {
    pub fn load<P: AsRef<Path>>(path: P, nx: usize, ny: usize, num_vertices: usize) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                GeometryError::NotFound(path.to_path_buf())
            } else {
                GeometryError::Read { path: path.to_path_buf(), source }
            }
        })?;
        let geometry = Self::parse_str(&contents, nx, ny, num_vertices)?;
        log::info!("Loaded {} vertex values from {}.", geometry.data.len(), path.display());
        Ok(geometry)
    }

    /// Parses vertex text: the first line is a header, `#` starts a comment.
    pub fn parse_str(contents: &str, nx: usize, ny: usize, num_vertices: usize) -> Result<Self> {
        let mut data = Vec::new();
        for (number, line) in contents.lines().enumerate().skip(1) {
            let line = line.split('#').next().unwrap_or("");
            for token in line.split_whitespace() {
                let value = token.parse::<Float>().map_err(|_| GeometryError::Parse {
                    line: number + 1,
                    token: token.to_string(),
                })?;
                data.push(value);
            }
        }
        Self::from_data(data, nx, ny, num_vertices)
    }

    pub fn from_data(data: Vec<Float>, nx: usize, ny: usize, num_vertices: usize) -> Result<Self> {
        let expected = expected_vertex_count(nx, ny, num_vertices);
        if data.len() != expected {
            return Err(GeometryError::SizeMismatch { expected, found: data.len() });
        }
        Ok(Self { data, nx, ny, num_vertices })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[Float] {
        &self.data
    }

    pub fn into_data(self) -> Vec<Float> {
        self.data
    }
}

//! Row-major elevation raster with a simple world georeference.
//!
//! Cell `(row, col)` covers the square whose lower corner is
//! `origin + (col·cell, row·cell)`; its centre sits half a cell further in.
//! Rows grow along +y, columns along +x.

use std::fmt;

use geo::{Coord, Rect};
use ndarray::Array2;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when constructing a `Heightfield`.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Cell size must be finite and strictly positive.
    InvalidCellSize(f64),
    /// Origin coordinates must be finite.
    InvalidOrigin,
    /// The flat value buffer does not match `rows × cols`.
    ShapeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize(size) => write!(f, "cell size must be finite and > 0 (got {size})"),
            Self::InvalidOrigin => write!(f, "raster origin must be finite"),
            Self::ShapeMismatch { expected, actual } => {
                write!(f, "expected {expected} raster values, got {actual}")
            }
        }
    }
}

impl std::error::Error for GridError {}

// ---------------------------------------------------------------------------
// Georeference
// ---------------------------------------------------------------------------

/// Mapping between world coordinates (metres) and raster cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Georef {
    pub origin: Coord<f64>,
    pub cell_size: f64,
}

impl Georef {
    /// World position of the centre of cell `(row, col)`.
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: self.origin.x + (col as f64 + 0.5) * self.cell_size,
            y: self.origin.y + (row as f64 + 0.5) * self.cell_size,
        }
    }

    /// Continuous grid coordinates `(col, row)` of a world position, with
    /// cell centres at integer values.
    #[inline]
    pub fn to_grid(&self, p: Coord<f64>) -> (f64, f64) {
        (
            (p.x - self.origin.x) / self.cell_size - 0.5,
            (p.y - self.origin.y) / self.cell_size - 0.5,
        )
    }
}

// ---------------------------------------------------------------------------
// Heightfield
// ---------------------------------------------------------------------------

/// A rectangular elevation raster.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightfield {
    data: Array2<f64>,
    georef: Georef,
}

impl Heightfield {
    /// Wrap an existing `(rows, cols)` array.
    pub fn new(data: Array2<f64>, cell_size: f64, origin: Coord<f64>) -> Result<Self, GridError> {
        if !cell_size.is_finite() || cell_size <= 0.0 { return Err(GridError::InvalidCellSize(cell_size)) }
        if !origin.x.is_finite() || !origin.y.is_finite() { return Err(GridError::InvalidOrigin) }
        Ok(Self { data, georef: Georef { origin, cell_size } })
    }

    /// Build from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>, cell_size: f64, origin: Coord<f64>) -> Result<Self, GridError> {
        let actual = values.len();
        let data = Array2::from_shape_vec((rows, cols), values)
            .map_err(|_| GridError::ShapeMismatch { expected: rows * cols, actual })?;
        Self::new(data, cell_size, origin)
    }

    /// A raster of `rows × cols` cells all set to `value`, anchored at the world origin.
    pub fn filled(rows: usize, cols: usize, value: f64, cell_size: f64) -> Result<Self, GridError> {
        Self::new(Array2::from_elem((rows, cols), value), cell_size, Coord { x: 0.0, y: 0.0 })
    }

    /// A raster sharing this one's shape and georeference but holding `data`.
    ///
    /// Panics if the shapes differ.
    pub fn with_data(&self, data: Array2<f64>) -> Self {
        assert!(data.dim() == self.data.dim(), "data shape must match the raster shape");
        Self { data, georef: self.georef }
    }

    #[inline] pub fn rows(&self) -> usize { self.data.nrows() }
    #[inline] pub fn cols(&self) -> usize { self.data.ncols() }
    #[inline] pub fn dim(&self) -> (usize, usize) { self.data.dim() }
    #[inline] pub fn is_empty(&self) -> bool { self.data.is_empty() }
    #[inline] pub fn cell_size(&self) -> f64 { self.georef.cell_size }
    #[inline] pub fn origin(&self) -> Coord<f64> { self.georef.origin }
    #[inline] pub fn georef(&self) -> Georef { self.georef }
    #[inline] pub fn data(&self) -> &Array2<f64> { &self.data }
    #[inline] pub fn data_mut(&mut self) -> &mut Array2<f64> { &mut self.data }
    #[inline] pub fn into_data(self) -> Array2<f64> { self.data }

    /// Value of cell `(row, col)`, or `None` when out of range.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    /// World position of the centre of cell `(row, col)`.
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        self.georef.cell_center(row, col)
    }

    /// World-space extent of the raster.
    pub fn bounds(&self) -> Rect<f64> {
        let origin = self.georef.origin;
        Rect::new(origin, Coord {
            x: origin.x + self.cols() as f64 * self.georef.cell_size,
            y: origin.y + self.rows() as f64 * self.georef.cell_size,
        })
    }

    /// Returns `true` if `p` lies inside the raster extent.
    pub fn contains(&self, p: Coord<f64>) -> bool {
        if self.is_empty() { return false }
        let bounds = self.bounds();
        p.x >= bounds.min().x && p.x <= bounds.max().x && p.y >= bounds.min().y && p.y <= bounds.max().y
    }

    /// Cell containing `p`, or `None` outside the extent.
    pub fn cell_of(&self, p: Coord<f64>) -> Option<(usize, usize)> {
        if !self.contains(p) { return None }
        let col = ((p.x - self.georef.origin.x) / self.georef.cell_size).floor() as usize;
        let row = ((p.y - self.georef.origin.y) / self.georef.cell_size).floor() as usize;
        Some((row.min(self.rows() - 1), col.min(self.cols() - 1)))
    }

    /// Bilinear sample at world position `p`.
    ///
    /// Returns `None` outside the raster extent. Inside the outer half cell
    /// the sample is clamped to the border cells. Non-finite cell values
    /// propagate into the result; callers decide what counts as valid.
    pub fn sample(&self, p: Coord<f64>) -> Option<f64> {
        if !self.contains(p) { return None }
        let (gx, gy) = self.georef.to_grid(p);
        let gx = gx.clamp(0.0, (self.cols() - 1) as f64);
        let gy = gy.clamp(0.0, (self.rows() - 1) as f64);

        let (c0, r0) = (gx.floor() as usize, gy.floor() as usize);
        let (c1, r1) = ((c0 + 1).min(self.cols() - 1), (r0 + 1).min(self.rows() - 1));
        let (fx, fy) = (gx - c0 as f64, gy - r0 as f64);

        let top = self.data[(r0, c0)] * (1.0 - fx) + self.data[(r0, c1)] * fx;
        let bottom = self.data[(r1, c0)] * (1.0 - fx) + self.data[(r1, c1)] * fx;
        Some(top * (1.0 - fy) + bottom * fy)
    }
}

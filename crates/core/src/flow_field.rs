//! Flow fields: the direction particles steer toward.
//!
//! [`FlowField`] is the only thing the engine asks of a field. [`VectorGrid`]
//! is the workhorse implementation: a lattice of unit directions over the
//! world, bilinearly interpolated between cell centres and wrapped
//! toroidally so the flow is continuous across the world seam.

use crate::error::EngineError;
use crate::field_source::FieldSource;
use crate::vector::Vector;
use crate::world::World;

/// A continuous 2D direction field.
pub trait FlowField: Send + Sync {
    /// Writes the field sample at `position` into `out`.
    ///
    /// Must be a pure function of `position`.
    fn query_bilinear(&self, position: &Vector, out: &mut Vector);
}

impl<T: FlowField + ?Sized> FlowField for &T {
    fn query_bilinear(&self, position: &Vector, out: &mut Vector) {
        (**self).query_bilinear(position, out);
    }
}

impl<T: FlowField + ?Sized> FlowField for Box<T> {
    fn query_bilinear(&self, position: &Vector, out: &mut Vector) {
        (**self).query_bilinear(position, out);
    }
}

/// The same direction everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformField {
    direction: Vector,
}

impl UniformField {
    pub fn new(direction: Vector) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> Vector {
        self.direction
    }
}

impl FlowField for UniformField {
    fn query_bilinear(&self, _position: &Vector, out: &mut Vector) {
        out.copy(&self.direction);
    }
}

/// A `cols × rows` lattice of vectors covering the world.
///
/// Vector `(ix, iy)` sits at the centre of its cell. Lattice indices wrap
/// toroidally, matching the world's wrap-around.
#[derive(Debug, Clone)]
pub struct VectorGrid {
    cols: usize,
    rows: usize,
    cell_width: f64,
    cell_height: f64,
    vectors: Vec<Vector>,
}

impl VectorGrid {
    /// Creates a grid of zero vectors.
    ///
    /// Returns `EngineError::InvalidDimensions` if either dimension is zero
    /// or `cols * rows` overflows.
    pub fn new(cols: usize, rows: usize, world: &World) -> Result<Self, EngineError> {
        let len = cell_count(cols, rows)?;
        Ok(Self::with_vectors(cols, rows, world, vec![Vector::ZERO; len]))
    }

    /// Builds a grid by sampling `source` at every cell centre and
    /// normalizing the result to unit length (zero samples stay zero).
    pub fn from_source(
        cols: usize,
        rows: usize,
        world: &World,
        source: &dyn FieldSource,
    ) -> Result<Self, EngineError> {
        let mut grid = Self::new(cols, rows, world)?;
        let (cw, ch) = (grid.cell_width, grid.cell_height);
        for (i, v) in grid.vectors.iter_mut().enumerate() {
            let cx = ((i % cols) as f64 + 0.5) * cw;
            let cy = ((i / cols) as f64 + 0.5) * ch;
            *v = source.sample(cx, cy);
            v.normalize();
        }
        Ok(grid)
    }

    /// Creates a grid from row-major vectors, stored as given.
    pub fn from_vectors(
        cols: usize,
        rows: usize,
        world: &World,
        vectors: Vec<Vector>,
    ) -> Result<Self, EngineError> {
        if cell_count(cols, rows)? != vectors.len() {
            return Err(EngineError::InvalidDimensions);
        }
        Ok(Self::with_vectors(cols, rows, world, vectors))
    }

    fn with_vectors(cols: usize, rows: usize, world: &World, vectors: Vec<Vector>) -> Self {
        Self {
            cols,
            rows,
            cell_width: world.width() / cols as f64,
            cell_height: world.height() / rows as f64,
            vectors,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Row-major lattice vectors.
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    fn index(&self, ix: isize, iy: isize) -> usize {
        let x = ix.rem_euclid(self.cols as isize) as usize;
        let y = iy.rem_euclid(self.rows as isize) as usize;
        y * self.cols + x
    }

    /// Lattice vector at `(ix, iy)` with toroidal wrapping.
    pub fn get(&self, ix: isize, iy: isize) -> Vector {
        self.vectors[self.index(ix, iy)]
    }

    /// Overwrites the lattice vector at `(ix, iy)` with toroidal wrapping.
    pub fn set(&mut self, ix: isize, iy: isize, v: Vector) {
        let idx = self.index(ix, iy);
        self.vectors[idx] = v;
    }
}

impl FlowField for VectorGrid {
    fn query_bilinear(&self, position: &Vector, out: &mut Vector) {
        // Lattice coordinates relative to cell centres.
        let gx = position.x / self.cell_width - 0.5;
        let gy = position.y / self.cell_height - 0.5;
        let x0 = gx.floor();
        let y0 = gy.floor();
        let tx = gx - x0;
        let ty = gy - y0;
        // Wrap in float space; far-out positions would saturate the cast.
        let ix = x0.rem_euclid(self.cols as f64) as isize;
        let iy = y0.rem_euclid(self.rows as f64) as isize;

        let top_left = self.get(ix, iy);
        let top_right = self.get(ix + 1, iy);
        let bottom_left = self.get(ix, iy + 1);
        let bottom_right = self.get(ix + 1, iy + 1);

        let top = lerp(&top_left, &top_right, tx);
        let bottom = lerp(&bottom_left, &bottom_right, tx);
        out.copy(&lerp(&top, &bottom, ty));
    }
}

fn cell_count(cols: usize, rows: usize) -> Result<usize, EngineError> {
    if cols == 0 || rows == 0 {
        return Err(EngineError::InvalidDimensions);
    }
    cols.checked_mul(rows).ok_or(EngineError::InvalidDimensions)
}

fn lerp(a: &Vector, b: &Vector, t: f64) -> Vector {
    Vector::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

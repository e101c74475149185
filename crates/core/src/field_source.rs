//! Field sources: deterministic 2D direction generators.
//!
//! A [`FieldSource`] returns a direction at any point of the plane. Sources
//! are sampled once, at grid cell centres, when a
//! [`VectorGrid`](crate::flow_field::VectorGrid) is built; the grid then
//! answers the engine's per-frame queries by interpolation.

use std::f64::consts::TAU;

use noise::{NoiseFn, OpenSimplex, Perlin};

use crate::vector::Vector;

/// A source of 2D vectors. Same input, same output.
pub trait FieldSource: Send + Sync {
    /// Sample the source at world position (x, y).
    fn sample(&self, x: f64, y: f64) -> Vector;
}

/// Distances below this are treated as zero.
const SINGULARITY_EPS: f64 = 1e-10;

/// Offset between the two noise lattices so x and y samples decorrelate.
const NOISE_OFFSET: f64 = 100.0;

// ---------------------------------------------------------------------------
// Noise-based sources
// ---------------------------------------------------------------------------

/// Classic flow-field noise: a Perlin value in [-1, 1] mapped to an angle.
///
/// `turns` controls how many full rotations the noise range spans; larger
/// values give curlier flow.
pub struct AngleNoise {
    noise: Perlin,
    scale: f64,
    turns: f64,
}

impl AngleNoise {
    pub fn new(scale: f64, turns: f64, seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
            turns,
        }
    }
}

impl FieldSource for AngleNoise {
    fn sample(&self, x: f64, y: f64) -> Vector {
        let n = self.noise.get([x * self.scale, y * self.scale]);
        Vector::from_angle(n * TAU * self.turns)
    }
}

/// OpenSimplex variant of [`AngleNoise`]. Fewer directional artifacts.
pub struct SimplexAngle {
    noise: OpenSimplex,
    scale: f64,
    turns: f64,
}

impl SimplexAngle {
    pub fn new(scale: f64, turns: f64, seed: u32) -> Self {
        Self {
            noise: OpenSimplex::new(seed),
            scale,
            turns,
        }
    }
}

impl FieldSource for SimplexAngle {
    fn sample(&self, x: f64, y: f64) -> Vector {
        let n = self.noise.get([x * self.scale, y * self.scale]);
        Vector::from_angle(n * TAU * self.turns)
    }
}

/// Curl of a scalar Perlin potential: approximately divergence-free flow.
pub struct CurlNoise {
    noise: Perlin,
    scale: f64,
    eps: f64,
}

impl CurlNoise {
    /// Creates a curl noise source with a finite-difference step of 0.001.
    pub fn new(scale: f64, seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
            eps: 0.001,
        }
    }
}

impl FieldSource for CurlNoise {
    fn sample(&self, x: f64, y: f64) -> Vector {
        let sx = x * self.scale;
        let sy = y * self.scale;
        let eps = self.eps * self.scale;
        if eps.abs() < SINGULARITY_EPS {
            return Vector::ZERO;
        }
        // curl F = (dF/dy, -dF/dx)
        let df_dy = (self.noise.get([sx, sy + eps]) - self.noise.get([sx, sy - eps])) / (2.0 * eps);
        let df_dx = (self.noise.get([sx + eps, sy]) - self.noise.get([sx - eps, sy])) / (2.0 * eps);
        Vector::new(df_dy, -df_dx)
    }
}

/// Two independent Perlin lattices for the x and y components. Produces
/// turbulent flow with sinks and sources, unlike [`CurlNoise`].
pub struct VectorNoise {
    noise: Perlin,
    scale: f64,
}

impl VectorNoise {
    pub fn new(scale: f64, seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
        }
    }
}

impl FieldSource for VectorNoise {
    fn sample(&self, x: f64, y: f64) -> Vector {
        let sx = x * self.scale;
        let sy = y * self.scale;
        Vector::new(
            self.noise.get([sx, sy]),
            self.noise.get([sx + NOISE_OFFSET, sy + NOISE_OFFSET]),
        )
    }
}

// ---------------------------------------------------------------------------
// Geometric sources
// ---------------------------------------------------------------------------

/// Counter-clockwise rotation around `center` with Gaussian falloff.
pub struct Vortex {
    pub center: Vector,
    pub strength: f64,
    pub radius: f64,
}

impl FieldSource for Vortex {
    fn sample(&self, x: f64, y: f64) -> Vector {
        let rx = x - self.center.x;
        let ry = y - self.center.y;
        let dist_sq = rx * rx + ry * ry;
        let dist = dist_sq.sqrt();
        if dist < SINGULARITY_EPS || self.radius.abs() < SINGULARITY_EPS {
            return Vector::ZERO;
        }
        let falloff = (-dist_sq / (2.0 * self.radius * self.radius)).exp();
        let magnitude = self.strength * falloff / dist;
        Vector::new(-ry * magnitude, rx * magnitude)
    }
}

/// The same vector everywhere.
pub struct Uniform {
    pub direction: Vector,
}

impl FieldSource for Uniform {
    fn sample(&self, _x: f64, _y: f64) -> Vector {
        self.direction
    }
}

/// Sums the vectors of several sources.
#[derive(Default)]
pub struct CompositeSource {
    sources: Vec<Box<dyn FieldSource>>,
}

impl CompositeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source (builder pattern).
    pub fn with(mut self, source: Box<dyn FieldSource>) -> Self {
        self.sources.push(source);
        self
    }
}

impl FieldSource for CompositeSource {
    fn sample(&self, x: f64, y: f64) -> Vector {
        self.sources.iter().fold(Vector::ZERO, |mut acc, source| {
            acc.add(&source.sample(x, y));
            acc
        })
    }
}

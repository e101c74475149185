//! Density raster: counts how often particles visit each pixel.
//!
//! Splatting every frame's positions into one raster turns a run into a
//! long-exposure image of the flow.

use flow_engine_core::{EngineError, FlowParticle, Vector, World};

/// A `width × height` grid of visit counts in row-major order.
#[derive(Debug, Clone)]
pub struct Raster {
    width: usize,
    height: usize,
    counts: Vec<u32>,
}

impl Raster {
    /// Creates an empty raster.
    ///
    /// Returns `EngineError::InvalidDimensions` if either dimension is zero
    /// or `width * height` overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .ok_or(EngineError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            counts: vec![0; len],
        })
    }

    /// Creates a raster `width` pixels wide with the world's aspect ratio.
    pub fn for_world(width: usize, world: &World) -> Result<Self, EngineError> {
        let height = (width as f64 / world.aspect_ratio()).round() as usize;
        Self::new(width, height.max(1))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major visit counts.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Visit count at pixel `(x, y)`, or `None` outside the raster.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.counts[y * self.width + x])
    }

    /// Largest visit count.
    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Records one visit at world position `p`.
    ///
    /// Returns `false` (and records nothing) for positions outside the world.
    pub fn splat(&mut self, world: &World, p: &Vector) -> bool {
        if !world.contains(p) {
            return false;
        }
        let px = ((p.x / world.width()) * self.width as f64) as usize;
        let py = ((p.y / world.height()) * self.height as f64) as usize;
        let idx = py.min(self.height - 1) * self.width + px.min(self.width - 1);
        self.counts[idx] = self.counts[idx].saturating_add(1);
        true
    }

    /// Records the position of every particle; returns how many landed.
    pub fn splat_particles<'a, P, I>(&mut self, world: &World, particles: I) -> usize
    where
        P: FlowParticle + 'a,
        I: IntoIterator<Item = &'a P>,
    {
        particles
            .into_iter()
            .filter(|p| self.splat(world, &p.kinematics().position))
            .count()
    }

    /// Counts mapped to [0, 1] on a logarithmic curve, so sparse trails stay
    /// visible next to dense sinks. An empty raster maps to all zeros.
    pub fn normalized(&self) -> Vec<f64> {
        let max = self.max();
        if max == 0 {
            return vec![0.0; self.counts.len()];
        }
        let denom = f64::from(max).ln_1p();
        self.counts
            .iter()
            .map(|&c| f64::from(c).ln_1p() / denom)
            .collect()
    }
}

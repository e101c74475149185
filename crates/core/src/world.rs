//! The toroidal world rectangle particles live in.
//!
//! Coordinates are normalized to the world width: the world spans
//! `[0, 1) × [0, 1 / aspect_ratio)`.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::prng::Xorshift64;
use crate::vector::Vector;

/// Default world aspect ratio (16:9).
pub const DEFAULT_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// World bounds in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct World {
    width: f64,
    height: f64,
}

impl World {
    /// Builds the world for a given width:height aspect ratio.
    ///
    /// Returns `EngineError::InvalidAspectRatio` if the ratio is not finite
    /// and strictly positive.
    pub fn from_aspect_ratio(aspect_ratio: f64) -> Result<Self, EngineError> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(EngineError::InvalidAspectRatio(aspect_ratio));
        }
        Ok(Self {
            width: 1.0,
            height: 1.0 / aspect_ratio,
        })
    }

    /// World width (always 1).
    pub fn width(&self) -> f64 {
        self.width
    }

    /// World height (`1 / aspect_ratio`).
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// True if `p` lies in `[0, width) × [0, height)`.
    pub fn contains(&self, p: &Vector) -> bool {
        (0.0..self.width).contains(&p.x) && (0.0..self.height).contains(&p.y)
    }

    /// Uniformly distributed point inside the world.
    pub fn random_point(&self, rng: &mut Xorshift64) -> Vector {
        Vector::new(
            rng.next_range(0.0, self.width),
            rng.next_range(0.0, self.height),
        )
    }

    /// Wraps `p` back into the world, one world extent per axis at most.
    ///
    /// A point displaced by more than one extent in a single frame stays
    /// outside until a later call brings it back.
    pub fn wrap(&self, p: &mut Vector) {
        wrap_axis(&mut p.x, self.width);
        wrap_axis(&mut p.y, self.height);
    }
}

impl Default for World {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0 / DEFAULT_ASPECT_RATIO,
        }
    }
}

fn wrap_axis(value: &mut f64, extent: f64) {
    if *value >= extent {
        *value -= extent;
    } else if *value < 0.0 {
        *value += extent;
    }
}

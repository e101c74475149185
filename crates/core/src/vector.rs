//! Two-dimensional vector with in-place, chainable arithmetic.
//!
//! The per-frame update is written as fluent chains such as
//! `desired.subtract(&velocity).limit(max)`, so every mutating operation
//! returns `&mut Self`. Length math goes through [`glam::DVec2`].

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A 2D vector in world units (one unit = the world width).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    /// The zero vector.
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    /// Creates a vector from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians (counter-clockwise from +x).
    pub fn from_angle(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    /// Converts to a glam vector.
    pub fn as_dvec2(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    fn assign(&mut self, v: DVec2) -> &mut Self {
        self.x = v.x;
        self.y = v.y;
        self
    }

    /// Adds `other` component-wise.
    pub fn add(&mut self, other: &Vector) -> &mut Self {
        self.x += other.x;
        self.y += other.y;
        self
    }

    /// Subtracts `other` component-wise.
    pub fn subtract(&mut self, other: &Vector) -> &mut Self {
        self.x -= other.x;
        self.y -= other.y;
        self
    }

    /// Scales both components by `scalar`.
    pub fn multiply(&mut self, scalar: f64) -> &mut Self {
        self.x *= scalar;
        self.y *= scalar;
        self
    }

    /// Rescales to `max` if the magnitude exceeds it. Direction is preserved.
    pub fn limit(&mut self, max: f64) -> &mut Self {
        let limited = self.as_dvec2().clamp_length_max(max);
        self.assign(limited)
    }

    /// Scales to unit length. The zero vector stays zero.
    pub fn normalize(&mut self) -> &mut Self {
        let unit = self.as_dvec2().normalize_or_zero();
        self.assign(unit)
    }

    /// Overwrites both components with those of `other`.
    pub fn copy(&mut self, other: &Vector) -> &mut Self {
        self.x = other.x;
        self.y = other.y;
        self
    }

    /// Resets to the zero vector.
    pub fn clear(&mut self) -> &mut Self {
        self.x = 0.0;
        self.y = 0.0;
        self
    }

    /// Euclidean length.
    pub fn magnitude(&self) -> f64 {
        self.as_dvec2().length()
    }

    /// True if both components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<DVec2> for Vector {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vector> for DVec2 {
    fn from(v: Vector) -> Self {
        v.as_dvec2()
    }
}

//! Error types for the flow-engine core.
//!
//! Only construction can fail. Once an engine exists, `update` runs to
//! completion for any well-formed input.

use thiserror::Error;

/// Errors produced while building worlds, fields, and engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A grid or raster was requested with a zero (or overflowing) size.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// The world aspect ratio must be finite and strictly positive.
    #[error("invalid aspect ratio {0}: must be finite and greater than zero")]
    InvalidAspectRatio(f64),

    /// A speed preset was negative, zero, or not finite.
    #[error("invalid speed for '{name}': {value} (must be finite and greater than zero)")]
    InvalidSpeed { name: String, value: f64 },

    /// The steering ease factor must lie in (0, 1].
    #[error("invalid steer ease factor {0}: must lie in (0, 1]")]
    InvalidSteerEase(f64),

    /// The probability of the fast speed class must lie in [0, 1].
    #[error("invalid fast fraction {0}: must lie in [0, 1]")]
    InvalidFastFraction(f64),

    /// The time-to-live range was empty or started at zero frames.
    #[error("invalid lifespan [{min}, {max}] frames: need 1 <= min <= max")]
    InvalidLifespan { min: u32, max: u32 },

    /// A field name was not recognized by the registry.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Writing output failed.
    #[error("i/o error: {0}")]
    Io(String),
}

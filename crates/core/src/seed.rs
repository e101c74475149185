//! Reproducible record of a simulation run.
//!
//! A [`Seed`] captures everything needed to replay a run: field name and
//! resolution, engine/field parameters, PRNG seed, frame count, and the
//! fixed frame duration.

use serde::{Deserialize, Serialize};

use crate::engine::EngineParams;
use crate::error::EngineError;

/// Default frame duration: one frame at 60 fps, in milliseconds.
pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

/// Reproducible description of a run.
///
/// Two identical `Seed` values fed to the same binary produce bit-identical
/// particle state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seed {
    pub field: String,
    /// Flow field grid columns; rows follow from the aspect ratio.
    pub resolution: usize,
    pub params: serde_json::Value,
    pub seed: u64,
    pub frames: usize,
    pub dt_ms: f64,
}

impl Seed {
    /// Creates a seed with empty params, zero frames, and 60 fps frames.
    pub fn new(field: &str, resolution: usize, seed: u64) -> Self {
        Self {
            field: field.to_string(),
            resolution,
            params: serde_json::Value::Object(serde_json::Map::new()),
            seed,
            frames: 0,
            dt_ms: DEFAULT_FRAME_MS,
        }
    }

    /// Engine parameters embedded in `params`.
    pub fn engine_params(&self) -> EngineParams {
        EngineParams::from_json(&self.params)
    }

    /// Validates the resolution and the embedded engine parameters.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.resolution == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        self.engine_params().validate()?;
        Ok(())
    }
}

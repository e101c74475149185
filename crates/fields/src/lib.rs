#![deny(unsafe_code)]
//! Field registry: maps field names to flow field implementations, plus a
//! CPU density raster and PNG snapshot of particle positions.
//!
//! This crate sits between `flow-engine-core` (engine, traits, sources) and
//! the CLI, so that name-based dispatch and output rendering live in one
//! place.

pub mod pixel;
pub mod raster;

#[cfg(feature = "png")]
pub mod snapshot;

use flow_engine_core::field_source::{
    AngleNoise, CompositeSource, CurlNoise, SimplexAngle, VectorNoise, Vortex,
};
use flow_engine_core::params::{param_f64, param_seed32};
use flow_engine_core::{EngineError, FlowField, UniformField, Vector, VectorGrid, World};
use serde_json::{json, Value};

pub use raster::Raster;

/// All available field names.
const FIELD_NAMES: &[&str] = &[
    "uniform", "perlin", "simplex", "curl", "noise", "vortex", "eddy",
];

/// Default noise frequency, in lattice periods per world width.
const DEFAULT_SCALE: f64 = 3.0;
/// Default number of full turns spanned by the angle noise range.
const DEFAULT_TURNS: f64 = 1.0;
/// Default vortex radius, in world widths.
const DEFAULT_VORTEX_RADIUS: f64 = 0.25;
/// Default vortex strength mixed into the `eddy` field.
const DEFAULT_EDDY_STRENGTH: f64 = 0.05;

/// Enumeration of all available flow fields.
///
/// Every noise-based kind is a [`VectorGrid`] sampled from its source.
/// Use [`FieldKind::from_name`] for string-based construction (CLI).
pub enum FieldKind {
    /// The same direction everywhere (`angle` param, radians).
    Uniform(UniformField),
    /// Perlin value mapped to an angle.
    Perlin(VectorGrid),
    /// OpenSimplex value mapped to an angle.
    Simplex(VectorGrid),
    /// Curl of a Perlin potential (divergence free).
    Curl(VectorGrid),
    /// Independent Perlin lattices for x and y.
    Noise(VectorGrid),
    /// Rotation around the world centre.
    Vortex(VectorGrid),
    /// Perlin angle noise plus a vortex around the world centre.
    Eddy(VectorGrid),
}

impl FieldKind {
    /// Constructs a field by name.
    ///
    /// Grid fields have `resolution` columns and as many rows as keep cells
    /// roughly square. Noise sources read `scale`, `turns`, and `field_seed`
    /// from `params`; `field_seed` defaults to `seed` folded into 32 bits.
    ///
    /// Returns `EngineError::UnknownField` if the name is not recognized and
    /// `EngineError::InvalidDimensions` for a zero resolution.
    pub fn from_name(
        name: &str,
        world: &World,
        resolution: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, EngineError> {
        let scale = param_f64(params, "scale", DEFAULT_SCALE);
        let turns = param_f64(params, "turns", DEFAULT_TURNS);
        let noise_seed = param_seed32(params, "field_seed", (seed ^ (seed >> 32)) as u32);
        let cols = resolution;
        let rows = ((resolution as f64 / world.aspect_ratio()).round() as usize).max(1);
        let centre = Vector::new(world.width() / 2.0, world.height() / 2.0);
        let radius = param_f64(params, "radius", DEFAULT_VORTEX_RADIUS);

        match name {
            "uniform" => {
                let angle = param_f64(params, "angle", 0.0);
                Ok(FieldKind::Uniform(UniformField::new(Vector::from_angle(angle))))
            }
            "perlin" => Ok(FieldKind::Perlin(VectorGrid::from_source(
                cols,
                rows,
                world,
                &AngleNoise::new(scale, turns, noise_seed),
            )?)),
            "simplex" => Ok(FieldKind::Simplex(VectorGrid::from_source(
                cols,
                rows,
                world,
                &SimplexAngle::new(scale, turns, noise_seed),
            )?)),
            "curl" => Ok(FieldKind::Curl(VectorGrid::from_source(
                cols,
                rows,
                world,
                &CurlNoise::new(scale, noise_seed),
            )?)),
            "noise" => Ok(FieldKind::Noise(VectorGrid::from_source(
                cols,
                rows,
                world,
                &VectorNoise::new(scale, noise_seed),
            )?)),
            "vortex" => {
                let vortex = Vortex {
                    center: centre,
                    strength: 1.0,
                    radius,
                };
                Ok(FieldKind::Vortex(VectorGrid::from_source(
                    cols, rows, world, &vortex,
                )?))
            }
            "eddy" => {
                let eddy = CompositeSource::new()
                    .with(Box::new(AngleNoise::new(scale, turns, noise_seed)))
                    .with(Box::new(Vortex {
                        center: centre,
                        strength: param_f64(params, "strength", DEFAULT_EDDY_STRENGTH),
                        radius,
                    }));
                Ok(FieldKind::Eddy(VectorGrid::from_source(
                    cols, rows, world, &eddy,
                )?))
            }
            _ => Err(EngineError::UnknownField(name.to_string())),
        }
    }

    /// Returns a slice of all recognized field names.
    pub fn list_fields() -> &'static [&'static str] {
        FIELD_NAMES
    }

    /// The registry name of this field.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Uniform(_) => "uniform",
            FieldKind::Perlin(_) => "perlin",
            FieldKind::Simplex(_) => "simplex",
            FieldKind::Curl(_) => "curl",
            FieldKind::Noise(_) => "noise",
            FieldKind::Vortex(_) => "vortex",
            FieldKind::Eddy(_) => "eddy",
        }
    }

    /// The backing grid, if this is a grid field.
    pub fn grid(&self) -> Option<&VectorGrid> {
        match self {
            FieldKind::Uniform(_) => None,
            FieldKind::Perlin(g)
            | FieldKind::Simplex(g)
            | FieldKind::Curl(g)
            | FieldKind::Noise(g)
            | FieldKind::Vortex(g)
            | FieldKind::Eddy(g) => Some(g),
        }
    }

    /// Name and grid dimensions as a JSON object.
    pub fn describe(&self) -> Value {
        match self.grid() {
            Some(g) => json!({"field": self.name(), "cols": g.cols(), "rows": g.rows()}),
            None => json!({"field": self.name()}),
        }
    }
}

impl FlowField for FieldKind {
    fn query_bilinear(&self, position: &Vector, out: &mut Vector) {
        match self {
            FieldKind::Uniform(f) => f.query_bilinear(position, out),
            FieldKind::Perlin(g)
            | FieldKind::Simplex(g)
            | FieldKind::Curl(g)
            | FieldKind::Noise(g)
            | FieldKind::Vortex(g)
            | FieldKind::Eddy(g) => g.query_bilinear(position, out),
        }
    }
}

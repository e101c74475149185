#![deny(unsafe_code)]
//! Core types for the flow-engine particle simulation.
//!
//! Provides the `FlowEngine` (steers a fixed particle population through a
//! flow field), the `FlowField` and `FlowParticle` collaborator traits with
//! their stock implementations (`VectorGrid`, `UniformField`, `Particle`),
//! noise-based `FieldSource`s, the `Vector` and `World` primitives, the
//! `Xorshift64` PRNG, and the reproducible `Seed` record.

pub mod engine;
pub mod error;
pub mod field_source;
pub mod flow_field;
pub mod params;
pub mod particle;
pub mod prng;
pub mod seed;
pub mod vector;
pub mod world;

pub use engine::{step_particle, EngineParams, FlowEngine};
pub use error::EngineError;
pub use field_source::FieldSource;
pub use flow_field::{FlowField, UniformField, VectorGrid};
pub use particle::{
    FlowParticle, Kinematics, Lifespan, Particle, Rebirth, SpeedClass, SpeedPresets,
};
pub use prng::Xorshift64;
pub use seed::{Seed, DEFAULT_FRAME_MS};
pub use vector::Vector;
pub use world::World;

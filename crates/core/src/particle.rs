//! Particles and their lifecycle.
//!
//! The engine only talks to particles through [`FlowParticle`]. [`Particle`]
//! is the stock implementation: a point with a speed class and a frame
//! countdown that respawns it somewhere random in the world when it expires.

use serde::{Deserialize, Serialize};

use crate::engine::{FAST_SPEED, SLOW_SPEED};
use crate::error::EngineError;
use crate::prng::Xorshift64;
use crate::vector::Vector;
use crate::world::World;

/// Default shortest lifespan in frames.
pub const DEFAULT_TTL_MIN_FRAMES: u32 = 120;
/// Default longest lifespan in frames.
pub const DEFAULT_TTL_MAX_FRAMES: u32 = 480;

/// Outcome of a lifecycle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebirth {
    /// The particle keeps living where it is.
    Alive,
    /// The particle expired and was respawned at a new position this frame.
    Reborn,
}

impl Rebirth {
    /// True for [`Rebirth::Reborn`].
    pub fn is_reborn(self) -> bool {
        matches!(self, Rebirth::Reborn)
    }
}

/// Position, velocity, and the per-frame acceleration accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: Vector,
    pub velocity: Vector,
    pub acceleration: Vector,
}

/// What the engine needs from a particle.
///
/// Implementations own their lifecycle: `check_time_to_live` decides whether
/// the particle expired and, if so, reseeds its position before reporting
/// [`Rebirth::Reborn`].
pub trait FlowParticle: Send {
    /// Read-only kinematic state.
    fn kinematics(&self) -> &Kinematics;

    /// Mutable kinematic state.
    fn kinematics_mut(&mut self) -> &mut Kinematics;

    /// Speed cap in world widths per second. Constant for the particle's lifetime.
    fn max_velocity(&self) -> f64;

    /// Advances the lifecycle by one frame.
    fn check_time_to_live(&mut self) -> Rebirth;

    /// Overwrites the velocity with `seed`.
    fn reset_velocity(&mut self, seed: &Vector) {
        self.kinematics_mut().velocity.copy(seed);
    }
}

/// The two speed presets a particle can be assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedClass {
    Slow,
    Fast,
}

/// Speed caps for the two classes, in world widths per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedPresets {
    pub slow: f64,
    pub fast: f64,
}

impl SpeedPresets {
    /// Speed cap of `class`.
    pub fn max_velocity(&self, class: SpeedClass) -> f64 {
        match class {
            SpeedClass::Slow => self.slow,
            SpeedClass::Fast => self.fast,
        }
    }
}

impl Default for SpeedPresets {
    fn default() -> Self {
        Self {
            slow: SLOW_SPEED,
            fast: FAST_SPEED,
        }
    }
}

/// Inclusive range of lifespans, in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifespan {
    min: u32,
    max: u32,
}

impl Lifespan {
    /// Creates a lifespan range.
    ///
    /// Returns `EngineError::InvalidLifespan` unless `1 <= min <= max`.
    pub fn new(min: u32, max: u32) -> Result<Self, EngineError> {
        if min == 0 || min > max {
            return Err(EngineError::InvalidLifespan { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lifespan for a freshly reborn particle.
    fn draw(&self, rng: &mut Xorshift64) -> u32 {
        rng.next_u32_inclusive(self.min, self.max)
    }

    /// Remaining frames for a particle at construction. Drawn from
    /// `[1, max]` so the initial population does not expire in lockstep.
    fn draw_initial(&self, rng: &mut Xorshift64) -> u32 {
        rng.next_u32_inclusive(1, self.max)
    }
}

impl Default for Lifespan {
    fn default() -> Self {
        Self {
            min: DEFAULT_TTL_MIN_FRAMES,
            max: DEFAULT_TTL_MAX_FRAMES,
        }
    }
}

/// A point particle that respawns uniformly inside the world on expiry.
#[derive(Debug, Clone)]
pub struct Particle {
    kinematics: Kinematics,
    max_velocity: f64,
    speed_class: SpeedClass,
    ttl: u32,
    lifespan: Lifespan,
    world: World,
    rng: Xorshift64,
}

impl Particle {
    /// Creates a particle at a random position with zero velocity and the
    /// speed cap `speeds` assigns to `speed_class`.
    ///
    /// `rng` becomes the particle's private generator for its spawn and
    /// every later rebirth.
    pub fn spawn(
        speed_class: SpeedClass,
        speeds: &SpeedPresets,
        world: World,
        lifespan: Lifespan,
        mut rng: Xorshift64,
    ) -> Self {
        let position = world.random_point(&mut rng);
        let ttl = lifespan.draw_initial(&mut rng);
        Self {
            kinematics: Kinematics {
                position,
                ..Kinematics::default()
            },
            max_velocity: speeds.max_velocity(speed_class),
            speed_class,
            ttl,
            lifespan,
            world,
            rng,
        }
    }

    pub fn position(&self) -> &Vector {
        &self.kinematics.position
    }

    pub fn velocity(&self) -> &Vector {
        &self.kinematics.velocity
    }

    pub fn speed_class(&self) -> SpeedClass {
        self.speed_class
    }

    /// Frames left before the next rebirth.
    pub fn ttl(&self) -> u32 {
        self.ttl
    }
}

impl FlowParticle for Particle {
    fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    fn kinematics_mut(&mut self) -> &mut Kinematics {
        &mut self.kinematics
    }

    fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    fn check_time_to_live(&mut self) -> Rebirth {
        self.ttl = self.ttl.saturating_sub(1);
        if self.ttl > 0 {
            return Rebirth::Alive;
        }
        self.kinematics.position = self.world.random_point(&mut self.rng);
        self.ttl = self.lifespan.draw(&mut self.rng);
        Rebirth::Reborn
    }
}

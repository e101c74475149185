//! The flow engine: advances a fixed particle population through a flow field.
//!
//! Each frame every particle is checked for expiry, steered toward the field
//! direction at its position with a bounded turn rate, integrated, and
//! wrapped back into the toroidal world. Particles never interact, so the
//! per-particle step is a free function with its own local scratch vectors
//! and can run in parallel (feature `parallel`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::EngineError;
use crate::flow_field::FlowField;
use crate::params::{param_f64, param_u32, param_usize};
use crate::particle::{
    FlowParticle, Lifespan, Particle, Rebirth, SpeedClass, SpeedPresets,
    DEFAULT_TTL_MAX_FRAMES, DEFAULT_TTL_MIN_FRAMES,
};
use crate::prng::Xorshift64;
use crate::vector::Vector;
use crate::world::{World, DEFAULT_ASPECT_RATIO};

/// Default population size.
pub const DEFAULT_NUM_PARTICLES: usize = 10_000;
/// Speed cap of the slow class, in world widths per second.
pub const SLOW_SPEED: f64 = 0.05;
/// Speed cap of the fast class, in world widths per second.
pub const FAST_SPEED: f64 = 0.10;
/// Probability that a particle is assigned the fast class.
pub const FAST_FRACTION: f64 = 0.5;
/// Largest steering correction per frame, as a fraction of the speed cap.
pub const STEER_EASE_FACTOR: f64 = 0.05;

/// Construction parameters for [`FlowEngine::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Number of particles, fixed for the engine's lifetime.
    pub num_particles: usize,
    /// World width divided by world height.
    pub aspect_ratio: f64,
    /// Speed cap of the slow class.
    pub slow_speed: f64,
    /// Speed cap of the fast class.
    pub fast_speed: f64,
    /// Probability of the fast class.
    pub fast_fraction: f64,
    /// Steering rate limit as a fraction of the speed cap.
    pub steer_ease: f64,
    /// Shortest lifespan in frames.
    pub ttl_min: u32,
    /// Longest lifespan in frames.
    pub ttl_max: u32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            num_particles: DEFAULT_NUM_PARTICLES,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            slow_speed: SLOW_SPEED,
            fast_speed: FAST_SPEED,
            fast_fraction: FAST_FRACTION,
            steer_ease: STEER_EASE_FACTOR,
            ttl_min: DEFAULT_TTL_MIN_FRAMES,
            ttl_max: DEFAULT_TTL_MAX_FRAMES,
        }
    }
}

impl EngineParams {
    /// Extracts parameters from a JSON object, falling back to defaults for
    /// missing or mistyped keys.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            num_particles: param_usize(params, "num_particles", d.num_particles),
            aspect_ratio: param_f64(params, "aspect_ratio", d.aspect_ratio),
            slow_speed: param_f64(params, "slow_speed", d.slow_speed),
            fast_speed: param_f64(params, "fast_speed", d.fast_speed),
            fast_fraction: param_f64(params, "fast_fraction", d.fast_fraction),
            steer_ease: param_f64(params, "steer_ease", d.steer_ease),
            ttl_min: param_u32(params, "ttl_min", d.ttl_min),
            ttl_max: param_u32(params, "ttl_max", d.ttl_max),
        }
    }

    /// Checks every value and returns the world and lifespan they describe.
    pub fn validate(&self) -> Result<(World, Lifespan), EngineError> {
        let world = World::from_aspect_ratio(self.aspect_ratio)?;
        check_speed("slow_speed", self.slow_speed)?;
        check_speed("fast_speed", self.fast_speed)?;
        if !(0.0..=1.0).contains(&self.fast_fraction) {
            return Err(EngineError::InvalidFastFraction(self.fast_fraction));
        }
        check_steer_ease(self.steer_ease)?;
        let lifespan = Lifespan::new(self.ttl_min, self.ttl_max)?;
        Ok((world, lifespan))
    }

    /// Schema describing every parameter, its type, range, and default.
    pub fn schema() -> Value {
        json!({
            "num_particles": {
                "type": "integer",
                "default": DEFAULT_NUM_PARTICLES,
                "min": 0,
                "description": "Number of particles, fixed for the engine's lifetime"
            },
            "aspect_ratio": {
                "type": "number",
                "default": DEFAULT_ASPECT_RATIO,
                "min": 0.0,
                "description": "World width / height; the world is 1 wide and 1/aspect_ratio high"
            },
            "slow_speed": {
                "type": "number",
                "default": SLOW_SPEED,
                "min": 0.0,
                "description": "Speed cap of the slow class (world widths per second)"
            },
            "fast_speed": {
                "type": "number",
                "default": FAST_SPEED,
                "min": 0.0,
                "description": "Speed cap of the fast class (world widths per second)"
            },
            "fast_fraction": {
                "type": "number",
                "default": FAST_FRACTION,
                "min": 0.0,
                "max": 1.0,
                "description": "Probability that a particle is fast"
            },
            "steer_ease": {
                "type": "number",
                "default": STEER_EASE_FACTOR,
                "min": 0.0,
                "max": 1.0,
                "description": "Per-frame steering limit as a fraction of the speed cap"
            },
            "ttl_min": {
                "type": "integer",
                "default": DEFAULT_TTL_MIN_FRAMES,
                "min": 1,
                "description": "Shortest particle lifespan in frames"
            },
            "ttl_max": {
                "type": "integer",
                "default": DEFAULT_TTL_MAX_FRAMES,
                "min": 1,
                "description": "Longest particle lifespan in frames"
            }
        })
    }
}

fn check_speed(name: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidSpeed {
            name: name.to_string(),
            value,
        })
    }
}

fn check_steer_ease(value: f64) -> Result<(), EngineError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidSteerEase(value))
    }
}

/// A fixed population of particles driven by a flow field.
pub struct FlowEngine<F, P = Particle> {
    field: F,
    world: World,
    steer_ease: f64,
    particles: Vec<P>,
}

impl<F: FlowField> FlowEngine<F, Particle> {
    /// Creates an engine with `params.num_particles` stock particles.
    ///
    /// Each particle gets the fast class with probability
    /// `params.fast_fraction`, a random position, and an initial velocity
    /// equal to the raw field sample at that position. `seed` determines
    /// every random choice.
    pub fn new(field: F, params: &EngineParams, seed: u64) -> Result<Self, EngineError> {
        let (world, lifespan) = params.validate()?;
        let mut rng = Xorshift64::new(seed);
        let speeds = SpeedPresets {
            slow: params.slow_speed,
            fast: params.fast_speed,
        };

        let particles: Vec<Particle> = (0..params.num_particles)
            .map(|_| {
                let class = if rng.chance(params.fast_fraction) {
                    SpeedClass::Fast
                } else {
                    SpeedClass::Slow
                };
                let mut particle = Particle::spawn(class, &speeds, world, lifespan, rng.fork());
                let k = particle.kinematics_mut();
                field.query_bilinear(&k.position, &mut k.velocity);
                particle
            })
            .collect();

        let fast = particles
            .iter()
            .filter(|p| p.speed_class() == SpeedClass::Fast)
            .count();
        log::debug!(
            "spawned {} particles ({fast} fast) in a {:.4}x{:.4} world, seed {seed}",
            particles.len(),
            world.width(),
            world.height()
        );

        Ok(Self {
            field,
            world,
            steer_ease: params.steer_ease,
            particles,
        })
    }

    /// Creates an engine with [`EngineParams::default`].
    pub fn with_defaults(field: F, seed: u64) -> Result<Self, EngineError> {
        Self::new(field, &EngineParams::default(), seed)
    }
}

impl<F: FlowField, P: FlowParticle> FlowEngine<F, P> {
    /// Wraps an existing population. Particles are used as given; their
    /// velocities are not seeded from the field.
    pub fn from_particles(
        field: F,
        world: World,
        steer_ease: f64,
        particles: Vec<P>,
    ) -> Result<Self, EngineError> {
        check_steer_ease(steer_ease)?;
        Ok(Self {
            field,
            world,
            steer_ease,
            particles,
        })
    }

    /// Iterates the population in order. Every call starts a fresh pass.
    pub fn particles(&self) -> std::slice::Iter<'_, P> {
        self.particles.iter()
    }

    /// Advances every particle by `dt_ms` milliseconds.
    ///
    /// `dt_ms` is expected to be non-negative and small enough that no
    /// particle crosses the world more than once per frame.
    pub fn update(&mut self, dt_ms: f64) {
        let field = &self.field;
        let world = &self.world;
        let steer_ease = self.steer_ease;
        let reborn = self
            .particles
            .iter_mut()
            .map(|p| step_particle(p, field, world, steer_ease, dt_ms))
            .filter(|r| r.is_reborn())
            .count();
        log::trace!(
            "update dt={dt_ms}ms: {reborn}/{} particles reborn",
            self.particles.len()
        );
    }

    /// Parallel [`update`](Self::update). Produces identical particle state.
    #[cfg(feature = "parallel")]
    pub fn par_update(&mut self, dt_ms: f64) {
        use rayon::prelude::*;

        let field = &self.field;
        let world = &self.world;
        let steer_ease = self.steer_ease;
        let reborn = self
            .particles
            .par_iter_mut()
            .map(|p| step_particle(p, field, world, steer_ease, dt_ms))
            .filter(|r| r.is_reborn())
            .count();
        log::trace!(
            "par_update dt={dt_ms}ms: {reborn}/{} particles reborn",
            self.particles.len()
        );
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn steer_ease(&self) -> f64 {
        self.steer_ease
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Effective configuration as a JSON object.
    pub fn params(&self) -> Value {
        json!({
            "num_particles": self.particles.len(),
            "aspect_ratio": self.world.aspect_ratio(),
            "steer_ease": self.steer_ease,
        })
    }
}

impl<'a, F, P> IntoIterator for &'a FlowEngine<F, P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}

/// Advances one particle by one frame.
///
/// 1. lifecycle check
/// 2. desired velocity = field sample at the position × speed cap
/// 3. on rebirth, velocity is primed with the desired velocity
/// 4. steering correction toward it, limited to `max_velocity * steer_ease`
/// 5. velocity += acceleration, limited to `max_velocity`
/// 6. position += velocity × dt
/// 7. acceleration cleared
/// 8. single-step wrap
pub fn step_particle<F, P>(
    particle: &mut P,
    field: &F,
    world: &World,
    steer_ease: f64,
    dt_ms: f64,
) -> Rebirth
where
    F: FlowField + ?Sized,
    P: FlowParticle + ?Sized,
{
    let rebirth = particle.check_time_to_live();
    let max_velocity = particle.max_velocity();

    let mut desired = Vector::ZERO;
    field.query_bilinear(&particle.kinematics().position, &mut desired);
    desired.multiply(max_velocity);

    if rebirth.is_reborn() {
        particle.reset_velocity(&desired);
    }

    let k = particle.kinematics_mut();
    desired
        .subtract(&k.velocity)
        .limit(max_velocity * steer_ease);
    k.acceleration.add(&desired);

    k.velocity.add(&k.acceleration).limit(max_velocity);

    let mut displacement = Vector::ZERO;
    displacement.copy(&k.velocity).multiply(dt_ms / 1000.0);
    k.position.add(&displacement);

    k.acceleration.clear();
    world.wrap(&mut k.position);

    rebirth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_source::AngleNoise;
    use crate::flow_field::{UniformField, VectorGrid};
    use crate::particle::Kinematics;

    const EPS: f64 = 1e-12;

    /// Scripted particle: expires every `expire_every` frames (never if
    /// `None`), respawning at `respawn_at`, and records the priming seed.
    struct Probe {
        kinematics: Kinematics,
        max_velocity: f64,
        expire_every: Option<u32>,
        frame: u32,
        respawn_at: Vector,
        primed_with: Option<Vector>,
    }

    impl Probe {
        fn new(position: Vector, velocity: Vector, max_velocity: f64) -> Self {
            Self {
                kinematics: Kinematics {
                    position,
                    velocity,
                    acceleration: Vector::ZERO,
                },
                max_velocity,
                expire_every: None,
                frame: 0,
                respawn_at: Vector::ZERO,
                primed_with: None,
            }
        }

        fn expiring(mut self, every: u32, respawn_at: Vector) -> Self {
            self.expire_every = Some(every);
            self.respawn_at = respawn_at;
            self
        }
    }

    impl FlowParticle for Probe {
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
            self.frame += 1;
            match self.expire_every {
                Some(n) if self.frame % n == 0 => {
                    self.kinematics.position = self.respawn_at;
                    Rebirth::Reborn
                }
                _ => Rebirth::Alive,
            }
        }

        fn reset_velocity(&mut self, seed: &Vector) {
            self.primed_with = Some(*seed);
            self.kinematics.velocity.copy(seed);
        }
    }

    fn east() -> UniformField {
        UniformField::new(Vector::new(1.0, 0.0))
    }

    fn small(num_particles: usize) -> EngineParams {
        EngineParams {
            num_particles,
            ..EngineParams::default()
        }
    }

    fn noise_grid(world: &World, seed: u32) -> VectorGrid {
        VectorGrid::from_source(32, 18, world, &AngleNoise::new(3.0, 1.0, seed)).unwrap()
    }

    // ---- Construction ----

    #[test]
    fn default_params_match_presets() {
        let p = EngineParams::default();
        assert_eq!(p.num_particles, 10_000);
        assert!((p.aspect_ratio - 16.0 / 9.0).abs() < EPS);
        assert_eq!(p.slow_speed, 0.05);
        assert_eq!(p.fast_speed, 0.10);
        assert_eq!(p.fast_fraction, 0.5);
        assert_eq!(p.steer_ease, 0.05);
    }

    #[test]
    fn with_defaults_allocates_default_population() {
        let engine = FlowEngine::with_defaults(east(), 1).unwrap();
        assert_eq!(engine.len(), DEFAULT_NUM_PARTICLES);
        assert!((engine.world().height() - 0.5625).abs() < EPS);
    }

    #[test]
    fn new_allocates_exactly_the_requested_count() {
        for n in [0, 1, 7, 500] {
            let engine = FlowEngine::new(east(), &small(n), 3).unwrap();
            assert_eq!(engine.len(), n);
            assert_eq!(engine.particles().count(), n);
        }
    }

    #[test]
    fn speed_classes_are_the_two_presets_split_roughly_evenly() {
        let engine = FlowEngine::new(east(), &small(10_000), 42).unwrap();
        let mut fast = 0;
        for p in engine.particles() {
            match p.speed_class() {
                SpeedClass::Fast => {
                    fast += 1;
                    assert_eq!(p.max_velocity(), FAST_SPEED);
                }
                SpeedClass::Slow => assert_eq!(p.max_velocity(), SLOW_SPEED),
            }
        }
        assert!(
            (4_500..=5_500).contains(&fast),
            "expected ~5000 fast particles, got {fast}"
        );
    }

    #[test]
    fn fast_fraction_extremes_select_one_class() {
        let all_fast = EngineParams {
            fast_fraction: 1.0,
            ..small(100)
        };
        let engine = FlowEngine::new(east(), &all_fast, 5).unwrap();
        assert!(engine.particles().all(|p| p.speed_class() == SpeedClass::Fast));

        let all_slow = EngineParams {
            fast_fraction: 0.0,
            ..small(100)
        };
        let engine = FlowEngine::new(east(), &all_slow, 5).unwrap();
        assert!(engine.particles().all(|p| p.speed_class() == SpeedClass::Slow));
    }

    #[test]
    fn initial_velocity_is_the_raw_field_sample() {
        let params = small(200);
        let world = World::from_aspect_ratio(params.aspect_ratio).unwrap();
        let grid = noise_grid(&world, 9);
        let engine = FlowEngine::new(&grid, &params, 77).unwrap();
        for p in engine.particles() {
            let mut expected = Vector::ZERO;
            grid.query_bilinear(p.position(), &mut expected);
            assert_eq!(*p.velocity(), expected);
            assert!(world.contains(p.position()));
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let cases = [
            EngineParams {
                aspect_ratio: 0.0,
                ..small(1)
            },
            EngineParams {
                slow_speed: -0.05,
                ..small(1)
            },
            EngineParams {
                fast_speed: f64::NAN,
                ..small(1)
            },
            EngineParams {
                fast_fraction: 1.5,
                ..small(1)
            },
            EngineParams {
                steer_ease: 0.0,
                ..small(1)
            },
            EngineParams {
                ttl_min: 0,
                ..small(1)
            },
            EngineParams {
                ttl_min: 500,
                ttl_max: 100,
                ..small(1)
            },
        ];
        for params in cases {
            assert!(
                FlowEngine::new(east(), &params, 1).is_err(),
                "expected rejection of {params:?}"
            );
        }
    }

    #[test]
    fn from_particles_rejects_bad_steer_ease() {
        let result = FlowEngine::from_particles(east(), World::default(), 1.5, Vec::<Probe>::new());
        assert!(matches!(result, Err(EngineError::InvalidSteerEase(_))));
    }

    // ---- JSON config ----

    #[test]
    fn params_from_json_overrides_and_defaults() {
        let params = EngineParams::from_json(&json!({
            "num_particles": 64,
            "aspect_ratio": 2.0,
            "ttl_max": 90,
            "steer_ease": "sharp"
        }));
        assert_eq!(params.num_particles, 64);
        assert_eq!(params.aspect_ratio, 2.0);
        assert_eq!(params.ttl_max, 90);
        assert_eq!(params.steer_ease, STEER_EASE_FACTOR);
        assert_eq!(params.slow_speed, SLOW_SPEED);
    }

    #[test]
    fn schema_lists_every_param() {
        let schema = EngineParams::schema();
        let params = serde_json::to_value(EngineParams::default()).unwrap();
        for key in params.as_object().unwrap().keys() {
            assert!(schema.get(key).is_some(), "schema missing {key}");
        }
    }

    #[test]
    fn engine_params_json_reflects_world() {
        let engine = FlowEngine::new(east(), &small(3), 1).unwrap();
        let params = engine.params();
        assert_eq!(params["num_particles"], 3);
        assert_eq!(params["steer_ease"], STEER_EASE_FACTOR);
    }

    // ---- Enumeration ----

    #[test]
    fn particles_is_restartable_and_ordered() {
        let engine = FlowEngine::new(east(), &small(50), 8).unwrap();
        let first: Vec<Vector> = engine.particles().map(|p| *p.position()).collect();
        let second: Vec<Vector> = (&engine).into_iter().map(|p| *p.position()).collect();
        assert_eq!(first, second);
    }

    // ---- Update scenarios ----

    #[test]
    fn uniform_field_keeps_capped_velocity_and_advances_position() {
        let max_v = FAST_SPEED;
        let start = Vector::new(0.3, 0.2);
        let probe = Probe::new(start, Vector::new(max_v, 0.0), max_v);
        let mut engine =
            FlowEngine::from_particles(east(), World::default(), STEER_EASE_FACTOR, vec![probe])
                .unwrap();
        engine.update(16.0);

        let k = engine.particles().next().unwrap().kinematics();
        assert!((k.velocity.x - max_v).abs() < EPS, "vx = {}", k.velocity.x);
        assert!(k.velocity.y.abs() < EPS);
        assert!((k.position.x - (start.x + max_v * 0.016)).abs() < EPS);
        assert!((k.position.y - start.y).abs() < EPS);
    }

    #[test]
    fn stock_particle_in_uniform_field_converges_to_cap() {
        let mut engine = FlowEngine::new(east(), &small(1), 11).unwrap();
        let first = engine.particles().next().unwrap();
        let before = *first.position();
        let expires_now = first.ttl() == 1;
        assert_eq!(*first.velocity(), Vector::new(1.0, 0.0));

        engine.update(16.0);
        let p = engine.particles().next().unwrap();
        let max_v = p.max_velocity();
        assert!((p.velocity().x - max_v).abs() < EPS, "vx = {}", p.velocity().x);
        assert!(p.velocity().y.abs() < EPS);
        if !expires_now {
            let mut expected = before;
            expected.add(&Vector::new(max_v * 0.016, 0.0));
            engine.world().wrap(&mut expected);
            assert!((p.position().x - expected.x).abs() < EPS);
            assert_eq!(p.position().y, before.y);
        }
    }

    #[test]
    fn particle_crossing_the_right_edge_wraps() {
        let max_v = 0.1;
        let probe = Probe::new(Vector::new(0.9999, 0.1), Vector::new(max_v, 0.0), max_v);
        let mut engine =
            FlowEngine::from_particles(east(), World::default(), STEER_EASE_FACTOR, vec![probe])
                .unwrap();
        engine.update(16.0);
        let x = engine.particles().next().unwrap().kinematics().position.x;
        assert!((x - 0.0015).abs() < 1e-9, "x = {x}");
    }

    #[test]
    fn rebirth_primes_velocity_with_scaled_sample() {
        let max_v = 0.1;
        let north = UniformField::new(Vector::new(0.0, 1.0));
        let probe = Probe::new(Vector::new(0.5, 0.3), Vector::new(-max_v, 0.0), max_v)
            .expiring(1, Vector::new(0.25, 0.25));
        let mut engine =
            FlowEngine::from_particles(north, World::default(), STEER_EASE_FACTOR, vec![probe])
                .unwrap();
        engine.update(10.0);

        let probe = engine.particles().next().unwrap();
        assert_eq!(probe.primed_with, Some(Vector::new(0.0, max_v)));
        // Already aligned after priming, so steering adds nothing.
        assert_eq!(probe.kinematics.velocity, Vector::new(0.0, max_v));
        assert!((probe.kinematics.position.y - (0.25 + max_v * 0.01)).abs() < EPS);
        assert_eq!(probe.kinematics.position.x, 0.25);
    }

    #[test]
    fn alive_particles_are_never_primed() {
        let probe = Probe::new(Vector::new(0.5, 0.3), Vector::ZERO, 0.05);
        let mut engine =
            FlowEngine::from_particles(east(), World::default(), STEER_EASE_FACTOR, vec![probe])
                .unwrap();
        for _ in 0..20 {
            engine.update(16.0);
        }
        assert!(engine.particles().next().unwrap().primed_with.is_none());
    }

    #[test]
    fn steering_turn_is_rate_limited() {
        let max_v = 0.1;
        let probe = Probe::new(Vector::new(0.5, 0.3), Vector::new(0.0, max_v), max_v);
        let mut engine =
            FlowEngine::from_particles(east(), World::default(), STEER_EASE_FACTOR, vec![probe])
                .unwrap();
        let mut previous = Vector::new(0.0, max_v);
        for frame in 0..100 {
            engine.update(16.0);
            let v = engine.particles().next().unwrap().kinematics.velocity;
            let mut delta = v;
            delta.subtract(&previous);
            assert!(
                delta.magnitude() <= max_v * STEER_EASE_FACTOR + EPS,
                "frame {frame}: |dv| = {}",
                delta.magnitude()
            );
            previous = v;
        }
        assert!(previous.x > 0.0, "velocity should have turned east: {previous:?}");
    }

    #[test]
    fn zero_dt_moves_nothing_but_still_steers() {
        let max_v = 0.1;
        let probe = Probe::new(Vector::new(0.5, 0.3), Vector::new(0.0, max_v), max_v);
        let mut engine =
            FlowEngine::from_particles(east(), World::default(), STEER_EASE_FACTOR, vec![probe])
                .unwrap();
        engine.update(0.0);
        let k = engine.particles().next().unwrap().kinematics;
        assert_eq!(k.position, Vector::new(0.5, 0.3));
        assert!(k.velocity.x > 0.0);
    }

    #[test]
    fn empty_engine_update_is_a_no_op() {
        let mut engine = FlowEngine::new(east(), &small(0), 1).unwrap();
        assert!(engine.is_empty());
        engine.update(16.0);
        assert_eq!(engine.particles().count(), 0);
    }

    // ---- Invariants over many frames ----

    #[test]
    fn population_stays_fixed_and_invariants_hold() {
        let params = EngineParams {
            ttl_min: 5,
            ttl_max: 20,
            ..small(400)
        };
        let world = World::from_aspect_ratio(params.aspect_ratio).unwrap();
        let mut engine = FlowEngine::new(noise_grid(&world, 3), &params, 2024).unwrap();
        let classes: Vec<(SpeedClass, f64)> = engine
            .particles()
            .map(|p| (p.speed_class(), p.max_velocity()))
            .collect();

        for _ in 0..120 {
            engine.update(16.0);
            for p in engine.particles() {
                assert!(world.contains(p.position()), "{:?} escaped", p.position());
                assert!(p.velocity().magnitude() <= p.max_velocity() * (1.0 + 1e-12));
                assert_eq!(p.kinematics().acceleration, Vector::ZERO);
            }
        }

        let after: Vec<(SpeedClass, f64)> = engine
            .particles()
            .map(|p| (p.speed_class(), p.max_velocity()))
            .collect();
        assert_eq!(classes, after);
        assert_eq!(engine.len(), 400);
    }

    #[test]
    fn huge_dt_on_a_grid_field_does_not_panic() {
        let params = small(4);
        let world = World::from_aspect_ratio(params.aspect_ratio).unwrap();
        let mut engine = FlowEngine::new(noise_grid(&world, 8), &params, 31).unwrap();
        engine.update(1e25);
        engine.update(16.0);
        for p in engine.particles() {
            assert!(p.position().is_finite(), "{:?}", p.position());
            assert!(p.velocity().magnitude() <= p.max_velocity() * (1.0 + 1e-12));
        }
    }

    #[test]
    fn same_seed_same_trajectories() {
        let params = small(100);
        let world = World::from_aspect_ratio(params.aspect_ratio).unwrap();
        let mut a = FlowEngine::new(noise_grid(&world, 1), &params, 99).unwrap();
        let mut b = FlowEngine::new(noise_grid(&world, 1), &params, 99).unwrap();
        for _ in 0..60 {
            a.update(16.0);
            b.update(16.0);
        }
        assert!(a.particles().zip(b.particles()).all(|(pa, pb)| {
            pa.position().x.to_bits() == pb.position().x.to_bits()
                && pa.position().y.to_bits() == pb.position().y.to_bits()
        }));
    }

    #[test]
    fn different_seeds_differ() {
        let a = FlowEngine::new(east(), &small(10), 1).unwrap();
        let b = FlowEngine::new(east(), &small(10), 2).unwrap();
        let pa: Vec<Vector> = a.particles().map(|p| *p.position()).collect();
        let pb: Vec<Vector> = b.particles().map(|p| *p.position()).collect();
        assert_ne!(pa, pb);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_update_matches_sequential() {
        let params = EngineParams {
            ttl_min: 3,
            ttl_max: 30,
            ..small(1000)
        };
        let world = World::from_aspect_ratio(params.aspect_ratio).unwrap();
        let mut seq = FlowEngine::new(noise_grid(&world, 4), &params, 5).unwrap();
        let mut par = FlowEngine::new(noise_grid(&world, 4), &params, 5).unwrap();
        for _ in 0..50 {
            seq.update(16.0);
            par.par_update(16.0);
        }
        for (a, b) in seq.particles().zip(par.particles()) {
            assert_eq!(a.kinematics(), b.kinematics());
            assert_eq!(a.ttl(), b.ttl());
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn bounds_speed_and_acceleration_invariants(
                seed: u64,
                field_seed: u32,
                aspect in 0.5_f64..3.0,
                dts in prop::collection::vec(0.0_f64..100.0, 1..30),
            ) {
                let params = EngineParams {
                    aspect_ratio: aspect,
                    ttl_min: 1,
                    ttl_max: 10,
                    ..small(50)
                };
                let world = World::from_aspect_ratio(aspect).unwrap();
                let mut engine = FlowEngine::new(noise_grid(&world, field_seed), &params, seed).unwrap();
                for dt in dts {
                    engine.update(dt);
                    for p in engine.particles() {
                        prop_assert!(world.contains(p.position()), "{:?} outside {world:?}", p.position());
                        prop_assert!(p.velocity().magnitude() <= p.max_velocity() * (1.0 + 1e-12));
                        prop_assert_eq!(p.kinematics().acceleration, Vector::ZERO);
                    }
                }
                prop_assert_eq!(engine.len(), 50);
            }
        }
    }
}

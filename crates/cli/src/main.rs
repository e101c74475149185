#![deny(unsafe_code)]
//! CLI driver for the flow-engine particle simulation.
//!
//! Subcommands:
//! - `render`: run the engine N frames, accumulate particle density, write PNG
//! - `dump`: run the engine N frames, print particle state as JSON
//! - `list`: print available fields (and the parameter schema with `--json`)

mod error;

use clap::{Args, Parser, Subcommand};
use error::CliError;
use flow_engine_core::{
    EngineParams, FlowEngine, FlowParticle, Particle, Seed, DEFAULT_FRAME_MS,
};
use flow_engine_fields::{FieldKind, Raster};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "flow-engine", about = "Flow field particle simulation CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every command that runs the simulation.
#[derive(Args)]
struct RunArgs {
    /// Field name (see `list`).
    #[arg(long, default_value = "perlin")]
    field: String,

    /// Number of particles.
    #[arg(short, long, default_value_t = 10_000)]
    particles: usize,

    /// World aspect ratio (width / height).
    #[arg(long, default_value_t = 16.0 / 9.0)]
    aspect: f64,

    /// Flow field grid columns.
    #[arg(short, long, default_value_t = 64)]
    resolution: usize,

    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 600)]
    frames: usize,

    /// Frame duration in milliseconds.
    #[arg(long, default_value_t = DEFAULT_FRAME_MS)]
    dt: f64,

    /// PRNG seed for deterministic output.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Extra engine and field parameters as a JSON object.
    #[arg(long, default_value = "{}")]
    params: String,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate and write a long-exposure density PNG.
    Render {
        #[command(flatten)]
        run: RunArgs,

        /// Output image width in pixels; height follows the aspect ratio.
        #[arg(short = 'W', long, default_value_t = 1280)]
        width: usize,

        /// Output file path.
        #[arg(short, long, default_value = "flow.png")]
        output: PathBuf,
    },
    /// Simulate and print the final particle state as JSON.
    Dump {
        #[command(flatten)]
        run: RunArgs,
    },
    /// List available fields.
    List,
}

/// One particle in `dump` output.
#[derive(Serialize)]
struct ParticleRecord {
    position: flow_engine_core::Vector,
    velocity: flow_engine_core::Vector,
    max_velocity: f64,
    speed_class: flow_engine_core::SpeedClass,
    ttl: u32,
}

impl From<&Particle> for ParticleRecord {
    fn from(p: &Particle) -> Self {
        Self {
            position: *p.position(),
            velocity: *p.velocity(),
            max_velocity: p.max_velocity(),
            speed_class: p.speed_class(),
            ttl: p.ttl(),
        }
    }
}

/// Builds the reproducible run record. CLI flags override `num_particles`
/// and `aspect_ratio` in the JSON params.
fn seed_from_args(run: &RunArgs) -> Result<Seed, CliError> {
    let mut params: Value = serde_json::from_str(&run.params)
        .map_err(|e| CliError::Params(e.to_string()))?;
    let obj = params
        .as_object_mut()
        .ok_or_else(|| CliError::Params("expected a JSON object".into()))?;
    obj.insert("num_particles".into(), run.particles.into());
    obj.insert("aspect_ratio".into(), run.aspect.into());

    let mut seed = Seed::new(&run.field, run.resolution, run.seed);
    seed.params = params;
    seed.frames = run.frames;
    seed.dt_ms = run.dt;
    seed.validate()?;
    Ok(seed)
}

fn build_engine(seed: &Seed) -> Result<FlowEngine<FieldKind>, CliError> {
    let engine_params: EngineParams = seed.engine_params();
    let (world, _) = engine_params.validate()?;
    let field = FieldKind::from_name(&seed.field, &world, seed.resolution, seed.seed, &seed.params)?;
    log::info!("built field {}", field.describe());
    Ok(FlowEngine::new(field, &engine_params, seed.seed)?)
}

fn advance(engine: &mut FlowEngine<FieldKind>, dt_ms: f64) {
    #[cfg(feature = "parallel")]
    engine.par_update(dt_ms);
    #[cfg(not(feature = "parallel"))]
    engine.update(dt_ms);
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let fields = FieldKind::list_fields();
            if cli.json {
                let info = serde_json::json!({
                    "fields": fields,
                    "params": EngineParams::schema(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Fields:");
                for name in fields {
                    println!("  {name}");
                }
            }
        }
        Command::Render { run, width, output } => {
            let seed = seed_from_args(&run)?;
            let mut engine = build_engine(&seed)?;
            let mut raster = Raster::for_world(width, engine.world())?;

            for _ in 0..seed.frames {
                advance(&mut engine, seed.dt_ms);
                raster.splat_particles(engine.world(), engine.particles());
            }
            log::debug!("peak density {} over {} frames", raster.max(), seed.frames);

            flow_engine_fields::snapshot::write_png(&raster, &output)
                .map_err(|e| CliError::snapshot(&output, e))?;

            if cli.json {
                let info = serde_json::json!({
                    "seed": seed,
                    "width": raster.width(),
                    "height": raster.height(),
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {} ({} particles, {} frames, seed {}) -> {}",
                    seed.field,
                    engine.len(),
                    seed.frames,
                    seed.seed,
                    output.display()
                );
            }
        }
        Command::Dump { run } => {
            let seed = seed_from_args(&run)?;
            let mut engine = build_engine(&seed)?;
            for _ in 0..seed.frames {
                advance(&mut engine, seed.dt_ms);
            }
            let particles: Vec<ParticleRecord> =
                engine.particles().map(ParticleRecord::from).collect();
            let info = serde_json::json!({
                "seed": seed,
                "field": engine.field().describe(),
                "particles": particles,
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose > 0 {
        builder.filter_level(match verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

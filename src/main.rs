use std::path::PathBuf;
use std::time::Instant;
use clap::Parser;
use log::info;
use bh_engine::particles::Simulation;
use bh_engine::trajectory::TrajectoryWriter;
use bh_engine::utils::{DEFAULT_ITERATIONS, DEFAULT_OUTPUT_DIR, DEFAULT_PARTICLE_COUNT, DEFAULT_SEED};
use bh_engine::{DequeBackend, ExecutionMode, InitialLayout, RunConfig, SimulationError};

/// Barnes-Hut N-body simulation with sequential, static-partition and
/// work-stealing execution strategies.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of particles (default 3000). Unparseable values count as 0.
    #[arg(allow_hyphen_values = true)]
    particles: Option<String>,

    /// Number of iterations (default 200). Unparseable values count as 0.
    #[arg(allow_hyphen_values = true)]
    iterations: Option<String>,

    /// Execution mode: s (sequential), p (static partition) or w (work stealing).
    #[arg(default_value = "s")]
    mode: String,

    /// Worker thread count, required for p and w.
    #[arg(allow_hyphen_values = true, required_if_eq_any([("mode", "p"), ("mode", "w")]))]
    threads: Option<String>,

    /// Initial particle layout: uniform or circle.
    #[arg(long, default_value = "uniform")]
    layout: String,

    /// Seed for the uniform layout.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Directory receiving particles_<mode>.dat.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Deque backend for work stealing: lock-free or locked.
    #[arg(long, default_value = "lock-free")]
    deque: String,
}

fn lenient_count(arg: Option<&str>, default: usize) -> usize {
    arg.map_or(default, |s| s.trim().parse().unwrap_or(0))
}

impl Args {
    fn into_config(self) -> Result<RunConfig, SimulationError> {
        let mode: ExecutionMode = self.mode.parse()?;
        let threads = if mode.is_parallel() {
            lenient_count(self.threads.as_deref(), 0)
        } else {
            1
        };
        Ok(RunConfig {
            particles: lenient_count(self.particles.as_deref(), DEFAULT_PARTICLE_COUNT),
            iterations: lenient_count(self.iterations.as_deref(), DEFAULT_ITERATIONS),
            mode,
            threads,
            layout: self.layout.parse::<InitialLayout>()?,
            seed: self.seed,
            output_dir: self.output_dir,
            deque: self.deque.parse::<DequeBackend>()?,
            ..RunConfig::default()
        })
    }
}

#[cfg(test)]
mod main_tests;

fn main() -> Result<(), SimulationError> {
    env_logger::init();

    let config = Args::parse().into_config()?;
    let mut simulation = Simulation::from_config(&config)?;
    let path = config.output_path();
    let mut writer = TrajectoryWriter::create(&path, config.particles, config.iterations)?;
    info!("writing trajectory to {}", path.display());

    let start = Instant::now();
    simulation.run(config.iterations, &mut writer, |iteration| {
        println!("Iteration: {}", iteration);
    })?;
    let elapsed = start.elapsed().as_secs_f64();
    writer.finish()?;

    println!("Total time: {:.15}", elapsed);
    Ok(())
}

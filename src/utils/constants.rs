use crate::constants_config::SimulationConstants;

pub const DEFAULT_SIMULATION_CONSTANTS: SimulationConstants = SimulationConstants {
    theta: 0.5,
    time_step: 0.01,
    softening: 1e-9,
};

/// Deepest level an insertion may reach before two particles are treated as coincident.
pub const MAX_TREE_DEPTH: usize = 128;

pub const DEFAULT_PARTICLE_COUNT: usize = 3000;
pub const DEFAULT_ITERATIONS: usize = 200;
pub const DEFAULT_SEED: u64 = 99;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Padding added on every side of the particle extent when sizing a root node.
pub const BOUNDS_PADDING: f64 = 1.0;

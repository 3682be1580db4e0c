mod particle;
mod particle_layouts;
mod particle_interactions_barnes_hut;
mod particle_simulation;

pub use particle::*;
pub use particle_layouts::*;
pub use particle_interactions_barnes_hut::*;
pub use particle_simulation::*;

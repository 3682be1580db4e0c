use std::f64::consts::PI;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::constants_config::InitialLayout;
use crate::particles::Particle;

/// Samples `n` particles with position and velocity drawn uniformly from [0, 1).
///
/// The same seed always yields the same particles.
///
/// # Examples
///
/// ```
/// use bh_engine::particles::uniform_particles;
///
/// let a = uniform_particles(16, 99);
/// let b = uniform_particles(16, 99);
/// assert_eq!(a, b);
/// assert!(a.iter().all(|p| (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.vy)));
/// ```
pub fn uniform_particles(n: usize, seed: u64) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let x = rng.random::<f64>();
            let y = rng.random::<f64>();
            let vx = rng.random::<f64>();
            let vy = rng.random::<f64>();
            Particle::new(x, y, vx, vy)
        })
        .collect()
}

/// Places `n` particles at rest, evenly spaced on the unit circle.
pub fn circle_particles(n: usize) -> Vec<Particle> {
    let radius = 1.0;
    (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            Particle::new(radius * angle.cos(), radius * angle.sin(), 0.0, 0.0)
        })
        .collect()
}

pub fn create_particles(layout: InitialLayout, n: usize, seed: u64) -> Vec<Particle> {
    match layout {
        InitialLayout::Uniform => uniform_particles(n, seed),
        InitialLayout::Circle => circle_particles(n),
    }
}

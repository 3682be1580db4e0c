use crate::particles::{Body, NodeId};

/// A unit point mass in the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Leaf of the current step's tree that holds this particle. Refreshed after
    /// every insertion pass; it is a lookup key, not an owning link.
    pub leaf: Option<NodeId>,
}

impl Particle {
    /// Creates a particle that is not yet placed in any tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use bh_engine::particles::Particle;
    ///
    /// let p = Particle::new(0.25, 0.75, 1.0, 0.0);
    /// assert_eq!(p.x, 0.25);
    /// assert!(p.leaf.is_none());
    /// ```
    pub fn new(x: f64, y: f64, vx: f64, vy: f64) -> Self {
        Self { x, y, vx, vy, leaf: None }
    }

    /// Advances the position by one explicit Euler step.
    ///
    /// # Examples
    ///
    /// ```
    /// use bh_engine::particles::Particle;
    ///
    /// let mut p = Particle::new(0.0, 0.0, 1.0, -2.0);
    /// p.integrate(0.01);
    /// assert!((p.x - 0.01).abs() < 1e-12);
    /// assert!((p.y + 0.02).abs() < 1e-12);
    /// ```
    pub fn integrate(&mut self, dt: f64) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
    }

    /// Adds the velocity kick produced by a point of `mass` at (`sx`, `sy`)
    /// over one time step. `distance` must already include softening.
    pub fn pull_towards(&mut self, sx: f64, sy: f64, mass: f64, distance: f64, dt: f64) {
        let dx = sx - self.x;
        let dy = sy - self.y;
        let inv_dist = 1.0 / distance;
        let inv_dist3 = inv_dist * inv_dist * inv_dist;

        let mass_constant = mass * dt;
        self.vx += mass_constant * dx * inv_dist3;
        self.vy += mass_constant * dy * inv_dist3;
    }

    /// Snapshot of this particle's position tagged with its array index.
    pub fn body(&self, index: usize) -> Body {
        Body { index, x: self.x, y: self.y }
    }
}

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::errors::SimulationError;
use crate::particles::{Bounds, Particle};

/// Appends particle positions to a text trajectory, one `x y` line per particle
/// per step, after a `particles iterations 0` header line.
///
/// # Examples
///
/// ```
/// use bh_engine::particles::Particle;
/// use bh_engine::trajectory::TrajectoryWriter;
///
/// let mut writer = TrajectoryWriter::new(Vec::new(), 1, 1).unwrap();
/// let bounds = writer.write_step(&[Particle::new(0.5, 0.25, 0.0, 0.0)]).unwrap();
/// assert_eq!((bounds.left, bounds.right), (-1.0, 1.5));
///
/// let text = String::from_utf8(writer.finish().unwrap()).unwrap();
/// assert_eq!(text, "1 1 0\n0.500000 0.250000 \n");
/// ```
pub struct TrajectoryWriter<W: Write> {
    out: W,
}

impl TrajectoryWriter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`, creating missing parent
    /// directories, and writes the header.
    pub fn create(path: &Path, particles: usize, iterations: usize) -> Result<Self, SimulationError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(path)
            .map_err(|e| SimulationError::Output(format!("{}: {}", path.display(), e)))?;
        Self::new(BufWriter::new(file), particles, iterations)
    }
}

impl<W: Write> TrajectoryWriter<W> {
    pub fn new(mut out: W, particles: usize, iterations: usize) -> Result<Self, SimulationError> {
        writeln!(out, "{} {} {}", particles, iterations, 0)?;
        Ok(Self { out })
    }

    /// Records the current positions and returns the padded bounds that should
    /// size the next tree.
    pub fn write_step(&mut self, particles: &[Particle]) -> Result<Bounds, SimulationError> {
        for p in particles {
            writeln!(self.out, "{:.6} {:.6} ", p.x, p.y)?;
        }
        Ok(Bounds::covering(particles))
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> Result<W, SimulationError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

use std::fmt;
use std::error::Error;

/// Represents errors that can occur while building or stepping a simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Indicates a thread count of zero for a parallel strategy.
    InvalidThreadCount(usize),
    /// Indicates an execution mode string that is not one of `s`, `p` or `w`.
    InvalidMode(String),
    /// Indicates an unrecognised value for a named option such as the layout or deque backend.
    InvalidOption { option: &'static str, value: String },
    /// Indicates more particles than a work-stealing deque can address.
    TooManyParticles(usize),
    /// Indicates a particle lying outside the root bounding box.
    OutOfBounds { index: usize, x: f64, y: f64 },
    /// Indicates that no child quadrant of an internal node contains the point.
    NoContainingQuadrant { x: f64, y: f64 },
    /// Indicates that insertion descended past the maximum tree depth (coincident particles).
    TreeTooDeep { index: usize, depth: usize },
    /// Indicates a force evaluation against a tree that has not been aggregated.
    TreeNotAggregated,
    /// Indicates that the worker thread pool could not be created.
    ThreadPool(String),
    /// Indicates a failure writing trajectory output.
    Output(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimulationError::InvalidThreadCount(n) => write!(f, "Invalid thread count: {}", n),
            SimulationError::InvalidMode(mode) => write!(f, "Invalid execution mode: {:?} (expected s, p or w)", mode),
            SimulationError::InvalidOption { option, value } => {
                write!(f, "Invalid value {:?} for option {}", value, option)
            }
            SimulationError::TooManyParticles(n) => write!(f, "Too many particles for index deques: {}", n),
            SimulationError::OutOfBounds { index, x, y } => {
                write!(f, "Particle {} at ({}, {}) lies outside the root bounding box", index, x, y)
            }
            SimulationError::NoContainingQuadrant { x, y } => {
                write!(f, "No child quadrant contains ({}, {})", x, y)
            }
            SimulationError::TreeTooDeep { index, depth } => {
                write!(f, "Inserting particle {} exceeded tree depth {} (coincident particles?)", index, depth)
            }
            SimulationError::TreeNotAggregated => write!(f, "Force evaluation requires an aggregated tree"),
            SimulationError::ThreadPool(msg) => write!(f, "Thread pool error: {}", msg),
            SimulationError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl Error for SimulationError {}

impl From<std::io::Error> for SimulationError {
    fn from(e: std::io::Error) -> Self {
        SimulationError::Output(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for SimulationError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SimulationError::ThreadPool(e.to_string())
    }
}

// src/constants_config_tests.rs

use std::path::PathBuf;
use crate::assert_float_eq;
use crate::constants_config::{DequeBackend, ExecutionMode, InitialLayout, RunConfig, SimulationConstants};
use crate::errors::SimulationError;
use crate::utils::DEFAULT_SIMULATION_CONSTANTS;

#[test]
fn test_constants_fall_back_to_defaults() {
    let constants = SimulationConstants::new(Some(0.7), None, None);
    assert_float_eq(constants.theta, 0.7, 1e-12, None);
    assert_float_eq(constants.time_step, DEFAULT_SIMULATION_CONSTANTS.time_step, 1e-12, None);
    assert_float_eq(constants.softening, DEFAULT_SIMULATION_CONSTANTS.softening, 1e-18, None);
    assert_eq!(SimulationConstants::new(None, None, None), SimulationConstants::default());
}

#[test]
fn test_softened_distance() {
    let constants = SimulationConstants::new(None, None, Some(0.0));
    assert_float_eq(constants.softened_distance(3.0, 4.0), 5.0, 1e-12, None);

    let soft = SimulationConstants::default();
    assert!(soft.softened_distance(0.0, 0.0) > 0.0);
}

#[test]
fn test_admissibility_is_strict() {
    let constants = SimulationConstants::new(Some(0.5), None, None);
    assert!(constants.admits(1.0, 3.0));
    assert!(!constants.admits(1.0, 2.0));
    assert!(!constants.admits(1.0, 1.0));
}

#[test]
fn test_execution_mode_parsing() {
    assert_eq!("s".parse::<ExecutionMode>(), Ok(ExecutionMode::Sequential));
    assert_eq!("p".parse::<ExecutionMode>(), Ok(ExecutionMode::StaticPartition));
    assert_eq!("w".parse::<ExecutionMode>(), Ok(ExecutionMode::WorkStealing));
    assert_eq!("x".parse::<ExecutionMode>(), Err(SimulationError::InvalidMode("x".to_string())));
    assert_eq!(ExecutionMode::WorkStealing.to_string(), "w");
    assert!(!ExecutionMode::Sequential.is_parallel());
    assert!(ExecutionMode::StaticPartition.is_parallel());
}

#[test]
fn test_layout_and_deque_parsing() {
    assert_eq!("circle".parse::<InitialLayout>(), Ok(InitialLayout::Circle));
    assert_eq!("uniform".parse::<InitialLayout>(), Ok(InitialLayout::Uniform));
    assert!("spiral".parse::<InitialLayout>().is_err());

    assert_eq!("locked".parse::<DequeBackend>(), Ok(DequeBackend::Locked));
    assert_eq!("lock-free".parse::<DequeBackend>(), Ok(DequeBackend::LockFree));
    assert_eq!(DequeBackend::default(), DequeBackend::LockFree);
}

#[test]
fn test_bad_layout_and_deque_name_their_option() {
    let err = "spiral".parse::<InitialLayout>().unwrap_err();
    assert_eq!(err, SimulationError::InvalidOption { option: "layout", value: "spiral".to_string() });
    assert_eq!(err.to_string(), "Invalid value \"spiral\" for option layout");

    let err = "spin".parse::<DequeBackend>().unwrap_err();
    assert_eq!(err, SimulationError::InvalidOption { option: "deque", value: "spin".to_string() });
    assert!(!err.to_string().contains("s, p or w"));
}

#[test]
fn test_run_config_defaults() {
    let config = RunConfig::default();
    assert_eq!(config.particles, 3000);
    assert_eq!(config.iterations, 200);
    assert_eq!(config.mode, ExecutionMode::Sequential);
    assert_eq!(config.seed, 99);
    assert_eq!(config.output_path(), PathBuf::from("output").join("particles_s.dat"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_run_config_validation() {
    let config = RunConfig { mode: ExecutionMode::StaticPartition, threads: 0, ..RunConfig::default() };
    assert_eq!(config.validate(), Err(SimulationError::InvalidThreadCount(0)));

    let config = RunConfig { mode: ExecutionMode::WorkStealing, threads: 4, ..RunConfig::default() };
    assert!(config.validate().is_ok());
    assert!(config.output_path().ends_with("particles_w.dat"));
}

// src/main_tests.rs

use clap::Parser;
use bh_engine::{DequeBackend, ExecutionMode, InitialLayout, SimulationError};
use crate::{lenient_count, Args};

fn config_from(argv: &[&str]) -> Result<bh_engine::RunConfig, SimulationError> {
    let args = Args::try_parse_from(std::iter::once("bh_engine").chain(argv.iter().copied()))
        .unwrap_or_else(|e| panic!("{:?} rejected: {}", argv, e));
    args.into_config()
}

#[test]
fn test_lenient_count() {
    assert_eq!(lenient_count(None, 3000), 3000);
    assert_eq!(lenient_count(Some("12"), 3000), 12);
    assert_eq!(lenient_count(Some(" 12 "), 3000), 12);
    assert_eq!(lenient_count(Some("abc"), 3000), 0);
    assert_eq!(lenient_count(Some("-5"), 3000), 0);
    assert_eq!(lenient_count(Some(""), 3000), 0);
}

#[test]
fn test_no_arguments_use_defaults() {
    let config = config_from(&[]).unwrap();
    assert_eq!(config.particles, 3000);
    assert_eq!(config.iterations, 200);
    assert_eq!(config.mode, ExecutionMode::Sequential);
    assert_eq!(config.threads, 1);
    assert_eq!(config.layout, InitialLayout::Uniform);
    assert_eq!(config.deque, DequeBackend::LockFree);
}

#[test]
fn test_malformed_numbers_become_zero() {
    let config = config_from(&["abc", "2", "s"]).unwrap();
    assert_eq!((config.particles, config.iterations), (0, 2));

    let config = config_from(&["10", "x1", "s"]).unwrap();
    assert_eq!((config.particles, config.iterations), (10, 0));
}

#[test]
fn test_negative_numbers_become_zero() {
    let config = config_from(&["-5", "2", "s"]).unwrap();
    assert_eq!((config.particles, config.iterations), (0, 2));

    let config = config_from(&["10", "-2", "s"]).unwrap();
    assert_eq!((config.particles, config.iterations), (10, 0));

    let config = config_from(&["10", "2", "p", "-3"]).unwrap();
    assert_eq!(config.mode, ExecutionMode::StaticPartition);
    assert_eq!(config.threads, 0);
    assert_eq!(config.validate(), Err(SimulationError::InvalidThreadCount(0)));
}

#[test]
fn test_parallel_modes_require_threads() {
    assert!(Args::try_parse_from(["bh_engine", "10", "2", "p"]).is_err());
    assert!(Args::try_parse_from(["bh_engine", "10", "2", "w"]).is_err());

    let config = config_from(&["10", "2", "w", "4"]).unwrap();
    assert_eq!((config.mode, config.threads), (ExecutionMode::WorkStealing, 4));
    assert!(config.validate().is_ok());
}

#[test]
fn test_sequential_ignores_threads() {
    let config = config_from(&["10", "2", "s", "8"]).unwrap();
    assert_eq!(config.threads, 1);
}

#[test]
fn test_options_and_bad_values() {
    let config = config_from(&["5", "1", "s", "--layout", "circle", "--deque", "locked", "--seed", "7"]).unwrap();
    assert_eq!(config.layout, InitialLayout::Circle);
    assert_eq!(config.deque, DequeBackend::Locked);
    assert_eq!(config.seed, 7);

    assert_eq!(config_from(&["5", "1", "q"]), Err(SimulationError::InvalidMode("q".to_string())));
    assert!(matches!(
        config_from(&["--layout", "spiral"]),
        Err(SimulationError::InvalidOption { option: "layout", .. })
    ));
}

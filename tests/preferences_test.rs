// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

mod common;

use common::{cpu_searcher, device_searcher, four_cycle};
use qubo_search::problem::{OptimizeMethod, WeightMatrix};
use qubo_search::solver::{Algorithm, BruteForceSearcher, Preference, PreferenceName, SolverError};
use qubo_search::worker::device::DeviceError;
use qubo_search::worker::{CpuBackend, DeviceBackend, HostDevice};

#[test]
fn test_default_preferences() {
    let searcher = cpu_searcher::<f32>(2);
    let prefs: Vec<(String, String)> = searcher
        .preferences()
        .iter()
        .map(|p| (p.name().to_string(), p.value()))
        .collect();
    assert_eq!(
        prefs,
        vec![
            ("algorithm".to_string(), "brute-force-search".to_string()),
            ("tile_size".to_string(), "1024".to_string()),
            ("precision".to_string(), "float".to_string()),
            ("device".to_string(), "cpu".to_string()),
        ]
    );
}

#[test]
fn test_device_preferences() {
    let searcher = device_searcher::<f64>(1);
    assert_eq!(
        searcher.preference(PreferenceName::Device),
        Preference::Device("host".to_string())
    );
    assert_eq!(
        searcher.preference(PreferenceName::Precision),
        Preference::Precision("double".to_string())
    );
}

#[test]
fn test_algorithm_always_brute_force() {
    let mut searcher = cpu_searcher::<f64>(1);
    for name in ["default", "naive", "coloring", "brute-force-search"] {
        searcher.set_preference_str("algorithm", name).unwrap();
        assert_eq!(searcher.algorithm(), Algorithm::BruteForceSearch, "{}", name);
    }
    assert_eq!(searcher.select_algorithm(Algorithm::Default), Algorithm::BruteForceSearch);
}

#[test]
fn test_tile_size_must_be_positive() {
    let mut searcher = cpu_searcher::<f64>(1);
    assert!(matches!(
        searcher.set_preference(Preference::TileSize(0)),
        Err(SolverError::Preference(_))
    ));
    assert!(matches!(
        searcher.set_preference_str("tile_size", "-1"),
        Err(SolverError::Preference(_))
    ));
    searcher.set_preference_str("tile_size", "48").unwrap();
    assert_eq!(searcher.tile_size(), 48);
}

#[test]
fn test_read_only_preferences() {
    let mut searcher = cpu_searcher::<f64>(1);
    for (key, value) in [("precision", "float"), ("device", "gpu")] {
        assert!(matches!(
            searcher.set_preference_str(key, value),
            Err(SolverError::Preference(_))
        ));
    }
    assert_eq!(
        searcher.preference(PreferenceName::Precision),
        Preference::Precision("double".to_string())
    );
}

#[test]
fn test_set_preferences_applies_all() {
    let mut searcher = cpu_searcher::<f64>(1);
    searcher
        .set_preferences(vec![
            Preference::Algorithm(Algorithm::BruteForceSearch),
            Preference::TileSize(8),
        ])
        .unwrap();
    assert_eq!(searcher.tile_size(), 8);
}

#[test]
fn test_shape_errors() {
    let mut searcher = cpu_searcher::<f64>(1);
    let err = searcher
        .set_problem(&WeightMatrix::zeros(2, 3), OptimizeMethod::Minimize)
        .unwrap_err();
    assert!(matches!(err, SolverError::Shape { rows: 2, cols: 3 }));

    let asym = WeightMatrix::from_rows(vec![
        vec![0.0, 0.0, 1.0],
        vec![0.0, 0.0, 0.0],
        vec![1.5, 0.0, 0.0],
    ])
    .unwrap();
    let err = searcher.set_problem(&asym, OptimizeMethod::Maximize).unwrap_err();
    assert!(matches!(err, SolverError::NotSymmetric { row: 0, col: 2 }));

    assert!(matches!(
        WeightMatrix::from_rows(vec![vec![0.0f64, 1.0], vec![1.0]]),
        Err(SolverError::Shape { .. })
    ));
}

#[test]
fn test_size_limit() {
    let mut searcher = cpu_searcher::<f32>(1);
    let err = searcher
        .set_problem(&WeightMatrix::eye(64), OptimizeMethod::Minimize)
        .unwrap_err();
    assert!(matches!(err, SolverError::SizeLimit { n: 64 }));
    assert_eq!(err.to_string(), "N must be smaller than 64, N=64");
    assert!(searcher.problem_size().is_err());
}

#[test]
fn test_zero_threads_rejected() {
    assert!(matches!(
        CpuBackend::with_threads(0),
        Err(SolverError::Preference(_))
    ));
}

#[test]
fn test_device_out_of_memory_surfaces() {
    let backend = DeviceBackend::new(HostDevice::<f64>::with_capacity(32));
    let mut searcher = BruteForceSearcher::new(backend);
    searcher.set_problem(&four_cycle(), OptimizeMethod::Minimize).unwrap();
    let err = searcher.prepare().unwrap_err();
    assert!(matches!(
        err,
        SolverError::Device(DeviceError::OutOfMemory { .. })
    ));
    assert!(!searcher.state().is_prepared());
}

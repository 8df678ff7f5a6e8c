// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

mod common;

use common::{
    cpu_searcher, device_searcher, four_cycle, random_symmetric, serial_reference,
    solution_strings,
};
use qubo_search::problem::{OptimizeMethod, WeightMatrix};
use qubo_search::solver::{BruteForceSearcher, Phase, Preference, SolverError, StateError};
use qubo_search::worker::device::DeviceError;
use qubo_search::worker::{DeviceBackend, HostDevice};

fn is_state(result: Result<impl Sized, SolverError>, expected: StateError) -> bool {
    matches!(result, Err(SolverError::State(e)) if e == expected)
}

#[test]
fn test_reads_without_problem_fail() {
    let mut searcher = cpu_searcher::<f64>(2);
    assert!(is_state(searcher.solutions().map(|s| s.len()), StateError::NoProblem));
    assert!(is_state(searcher.energies().map(|e| e.len()), StateError::NoProblem));
    assert!(is_state(searcher.minimum_energy(), StateError::NoProblem));
    assert!(is_state(searcher.problem_size(), StateError::NoProblem));
    assert!(is_state(searcher.prepare(), StateError::NoProblem));
    // NoProblem wins over NotPrepared.
    assert!(is_state(searcher.search_range(), StateError::NoProblem));
    assert!(is_state(searcher.make_solution(), StateError::NoProblem));
    assert_eq!(searcher.state().phase(), Phase::Unset);
}

#[test]
fn test_low_level_steps_require_prepare() {
    let mut searcher = cpu_searcher::<f64>(2);
    searcher.set_problem(&four_cycle(), OptimizeMethod::Minimize).unwrap();
    assert_eq!(searcher.problem_size().unwrap(), 4);
    assert!(is_state(searcher.search_range(), StateError::NotPrepared));
    assert!(is_state(searcher.make_solution(), StateError::NotPrepared));
    assert!(is_state(searcher.calculate_energy(), StateError::NotPrepared));
    assert_eq!(searcher.state().phase(), Phase::ProblemSet);
}

#[test]
fn test_lazy_read_drives_search() {
    let w = random_symmetric(10, 42);
    let (energy, ties) = serial_reference(&w, OptimizeMethod::Minimize);

    let mut searcher = cpu_searcher::<f64>(3);
    searcher.set_problem(&w, OptimizeMethod::Minimize).unwrap();
    searcher.set_preference(Preference::TileSize(64)).unwrap();
    assert_eq!(searcher.energies().unwrap()[0], energy);
    assert!(searcher.is_search_complete());
    assert_eq!(searcher.solutions().unwrap().len(), ties.len().min(64));
}

#[test]
fn test_read_after_partial_scan_finishes_scan() {
    let w = random_symmetric(9, 7);
    let (energy, _) = serial_reference(&w, OptimizeMethod::Maximize);

    let mut searcher = device_searcher::<f64>(2);
    searcher.set_problem(&w, OptimizeMethod::Maximize).unwrap();
    searcher.set_preference(Preference::TileSize(16)).unwrap();
    searcher.prepare().unwrap();
    let (complete, cursor) = searcher.search_range().unwrap();
    assert!(!complete);
    assert_eq!(cursor.value(), 32);
    assert_eq!(searcher.minimum_energy().unwrap(), energy);
}

#[test]
fn test_round_clears_materialized_results() {
    let mut searcher = cpu_searcher::<f64>(1);
    searcher.set_problem(&four_cycle(), OptimizeMethod::Minimize).unwrap();
    searcher.set_preference(Preference::TileSize(8)).unwrap();
    searcher.prepare().unwrap();
    searcher.search_range().unwrap();
    searcher.calculate_energy().unwrap();
    assert!(searcher.state().is_solution_available());
    assert!(searcher.state().is_energy_available());
    searcher.search_range().unwrap();
    assert!(!searcher.state().is_solution_available());
    assert!(!searcher.state().is_energy_available());
}

#[test]
fn test_solver_is_reusable() {
    let mut searcher = cpu_searcher::<f64>(2);
    searcher.set_problem(&four_cycle(), OptimizeMethod::Minimize).unwrap();
    assert_eq!(searcher.minimum_energy().unwrap(), 0.0);

    let w = WeightMatrix::from_rows(vec![vec![-1.0, 0.0], vec![0.0, 2.0]]).unwrap();
    searcher.set_problem(&w, OptimizeMethod::Minimize).unwrap();
    assert_eq!(searcher.state().phase(), Phase::ProblemSet);
    assert_eq!(searcher.minimum_energy().unwrap(), -1.0);
    assert_eq!(solution_strings(&mut searcher), vec!["10"]);
}

#[test]
fn test_rejected_problem_keeps_previous_one() {
    let mut searcher = cpu_searcher::<f64>(2);
    searcher.set_problem(&four_cycle(), OptimizeMethod::Minimize).unwrap();
    searcher.search().unwrap();

    let bad = WeightMatrix::from_rows(vec![vec![0.0, 1.0], vec![0.5, 0.0]]).unwrap();
    let err = searcher.set_problem(&bad, OptimizeMethod::Minimize).unwrap_err();
    assert!(err.is_shape_error());
    assert_eq!(searcher.problem_size().unwrap(), 4);
    assert!(searcher.state().is_solution_available());
    assert_eq!(solution_strings(&mut searcher).len(), 7);
}

#[test]
fn test_tile_size_change_keeps_prepared() {
    let mut searcher = cpu_searcher::<f64>(2);
    searcher.set_problem(&four_cycle(), OptimizeMethod::Minimize).unwrap();
    searcher.set_preference(Preference::TileSize(2)).unwrap();
    searcher.prepare().unwrap();
    searcher.search_range().unwrap();

    searcher.set_preference(Preference::TileSize(1024)).unwrap();
    assert_eq!(searcher.state().phase(), Phase::Prepared);
    assert_eq!(searcher.effective_tile_size(), Some(2));
    // The in-flight scan keeps its stride: 4 of 16 done, 2 per tile, 2 tiles per round.
    let mut rounds = 0;
    while !searcher.search_range().unwrap().0 {
        rounds += 1;
    }
    assert_eq!(rounds, 2);
    assert_eq!(searcher.solutions().unwrap().len(), 2);

    searcher.prepare().unwrap();
    assert_eq!(searcher.effective_tile_size(), Some(16));
}

#[test]
fn test_release_then_read() {
    let mut searcher = device_searcher::<f32>(2);
    let w = common::to_f32(&four_cycle());
    searcher.set_problem(&w, OptimizeMethod::Minimize).unwrap();
    searcher.search().unwrap();
    searcher.release();
    assert_eq!(searcher.state().phase(), Phase::ProblemSet);
    let live = searcher.backend().device().lock().unwrap().live_buffers();
    assert_eq!(live, 0);
    assert_eq!(solution_strings(&mut searcher).len(), 7);
}

#[test]
fn test_failed_prepare_leaves_solver_unprepared() {
    // Room for tiles of 2 (30 elements) but not for tiles of 16 (114).
    let backend = DeviceBackend::new(HostDevice::<f64>::with_capacity(60));
    let mut searcher = BruteForceSearcher::new(backend);
    searcher.set_problem(&four_cycle(), OptimizeMethod::Minimize).unwrap();
    searcher.set_preference(Preference::TileSize(2)).unwrap();
    searcher.search().unwrap();
    assert!(searcher.state().is_solution_available());

    searcher.set_preference(Preference::TileSize(16)).unwrap();
    let err = searcher.prepare().unwrap_err();
    assert!(matches!(
        err,
        SolverError::Device(DeviceError::OutOfMemory { .. })
    ));
    assert_eq!(searcher.state().phase(), Phase::ProblemSet);
    assert!(!searcher.state().is_solution_available());
    assert!(!searcher.state().is_energy_available());
    assert_eq!(searcher.effective_tile_size(), None);
    let live = searcher.backend().device().lock().unwrap().live_buffers();
    assert_eq!(live, 0);

    // Reads retry prepare and report the device failure, not a lifecycle error.
    assert!(matches!(
        searcher.solutions().map(|s| s.len()),
        Err(SolverError::Device(DeviceError::OutOfMemory { .. }))
    ));

    searcher.set_preference(Preference::TileSize(2)).unwrap();
    assert_eq!(searcher.minimum_energy().unwrap(), 0.0);
    assert_eq!(searcher.solutions().unwrap().len(), 2);
}

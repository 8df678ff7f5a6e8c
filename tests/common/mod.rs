// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use qubo_search::problem::{OptimizeMethod, WeightMatrix};
use qubo_search::solver::BruteForceSearcher;
use qubo_search::worker::{CpuBackend, DeviceBackend, HostDevice};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The 4-cycle used as the worked example.
pub fn four_cycle() -> WeightMatrix<f64> {
    WeightMatrix::from_rows(vec![
        vec![0.0, 1.0, 1.0, 0.0],
        vec![1.0, 0.0, 0.0, 1.0],
        vec![1.0, 0.0, 0.0, 1.0],
        vec![0.0, 1.0, 1.0, 0.0],
    ])
    .unwrap()
}

/// Random symmetric matrix with small integer entries, so every energy is
/// exact in both precisions and ties are common.
pub fn random_symmetric(n: usize, seed: u64) -> WeightMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in i..n {
            let value = rng.gen_range(-3i32..=3) as f64;
            rows[i][j] = value;
            rows[j][i] = value;
        }
    }
    WeightMatrix::from_rows(rows).unwrap()
}

pub fn to_f32(w: &WeightMatrix<f64>) -> WeightMatrix<f32> {
    let data = w.as_slice().iter().map(|&v| v as f32).collect();
    WeightMatrix::new(w.rows(), w.cols(), data).unwrap()
}

/// Explicit bits of `x`, variable 0 first.
pub fn bits_of(x: u64, n: usize) -> Vec<u8> {
    (0..n).map(|i| ((x >> (n - 1 - i)) & 1) as u8).collect()
}

pub fn bit_string(x: u64, n: usize) -> String {
    bits_of(x, n).iter().map(|b| b.to_string()).collect()
}

/// Serial brute force over all `2^N` assignments, written directly from the
/// definition. Returns the optimum and every optimal index, ascending.
pub fn serial_reference(w: &WeightMatrix<f64>, method: OptimizeMethod) -> (f64, Vec<u64>) {
    let n = w.rows();
    let mut best: Option<f64> = None;
    let mut ties = Vec::new();
    for x in 0..(1u64 << n) {
        let bits = bits_of(x, n);
        let mut energy = 0.0;
        for i in 0..n {
            for j in 0..n {
                if bits[i] == 1 && bits[j] == 1 {
                    energy += w.get(i, j);
                }
            }
        }
        let better = match (best, method) {
            (None, _) => true,
            (Some(b), OptimizeMethod::Minimize) => energy < b,
            (Some(b), OptimizeMethod::Maximize) => energy > b,
        };
        if better {
            best = Some(energy);
            ties.clear();
        }
        if best == Some(energy) {
            ties.push(x);
        }
    }
    (best.unwrap_or(f64::INFINITY), ties)
}

pub fn cpu_searcher<R: qubo_search::Real>(threads: usize) -> BruteForceSearcher<R, CpuBackend> {
    BruteForceSearcher::new(CpuBackend::with_threads(threads).unwrap())
}

pub fn device_searcher<R: qubo_search::Real>(
    workers: usize,
) -> BruteForceSearcher<R, DeviceBackend<R, HostDevice<R>>> {
    let backend = DeviceBackend::new(HostDevice::new())
        .with_workers(workers)
        .unwrap();
    BruteForceSearcher::new(backend)
}

/// Solutions of a finished search as bit strings.
pub fn solution_strings<R, B>(searcher: &mut BruteForceSearcher<R, B>) -> Vec<String>
where
    R: qubo_search::Real,
    B: qubo_search::worker::Backend<R>,
{
    searcher
        .solutions()
        .unwrap()
        .iter()
        .map(|x| x.to_string())
        .collect()
}

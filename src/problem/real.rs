// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Floating-point precision of a problem.

use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Mul, Neg};

/// Element type of weight matrices and energies (`f32` or `f64`).
pub trait Real:
    Copy
    + Send
    + Sync
    + PartialEq
    + PartialOrd
    + Debug
    + Display
    + Add<Output = Self>
    + AddAssign
    + Mul<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    const ZERO: Self;
    const ONE: Self;
    const INFINITY: Self;

    /// Value reported by the `precision` preference.
    const PRECISION: &'static str;
}

impl Real for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const INFINITY: Self = f32::INFINITY;
    const PRECISION: &'static str = "float";
}

impl Real for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const INFINITY: Self = f64::INFINITY;
    const PRECISION: &'static str = "double";
}

// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Batch-parallel device backend.
//!
//! The device itself is an external collaborator reached through
//! [`DeviceProvider`]: buffer allocation, copies and kernel launches are
//! enqueued and take effect at [`DeviceProvider::synchronize`]. A search range
//! is processed in batches:
//!
//! 1. `GenerateBits` materializes every index of the batch as a row of `0`/`1`.
//! 2. `Energies` evaluates `x^T W x` for each row.
//! 3. `ReduceMin` finds the batch minimum.
//! 4. If the minimum reaches the worker's running minimum, `Select` recovers
//!    the indices at that value, in ascending order, with their count.
//!
//! [`HostDevice`] is an in-process provider that runs these kernels on host
//! memory with rayon. It stands in for real hardware in tests and on machines
//! without an accelerator.

pub mod batch;
pub mod host;

pub use batch::{DeviceBackend, DeviceWorker};
pub use host::HostDevice;

use crate::packed::PackedIndex;
use crate::problem::Real;
use thiserror::Error;

/// Failures reported by a device provider.
///
/// After any of these the device context is unreliable; callers must not retry
/// on the same context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("device out of memory: {requested} elements requested, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    #[error("unknown device buffer #{0}")]
    InvalidBuffer(usize),

    #[error("device buffer #{buffer} holds {len} elements, {needed} needed")]
    BufferTooSmall {
        buffer: usize,
        len: usize,
        needed: usize,
    },

    #[error("device buffer #{0} has a different element type")]
    TypeMismatch(usize),

    #[error("kernel launch failed: {0}")]
    KernelLaunch(String),

    #[error("device queue has pending work; synchronize before reading")]
    Pending,

    #[error("device context was lost by an earlier failure")]
    Poisoned,
}

/// Opaque handle naming a device allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) usize);

impl BufferId {
    pub fn raw(self) -> usize {
        self.0
    }
}

/// Device buffer of reals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealBuffer {
    pub id: BufferId,
    pub len: usize,
}

/// Device buffer of packed indices (also used for counts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBuffer {
    pub id: BufferId,
    pub len: usize,
}

/// Work items understood by a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel<R: Real> {
    /// Row `r` of `out` (width `n`) becomes the explicit vector of `begin + r`,
    /// for every index in `[begin, end)`.
    GenerateBits {
        out: RealBuffer,
        n: usize,
        begin: PackedIndex,
        end: PackedIndex,
    },

    /// `out[r] = x_r^T W x_r` for the first `rows` rows of `bits`.
    Energies {
        weights: RealBuffer,
        bits: RealBuffer,
        n: usize,
        rows: usize,
        out: RealBuffer,
    },

    /// `out[0] = min(values[..len])`, `+inf` when empty.
    ReduceMin {
        values: RealBuffer,
        len: usize,
        out: RealBuffer,
    },

    /// Stable compaction: for every `k < len` with `values[k] == threshold`,
    /// append `base + k` to `out`; `count[0]` receives the number appended.
    Select {
        values: RealBuffer,
        len: usize,
        threshold: R,
        base: PackedIndex,
        out: IndexBuffer,
        count: IndexBuffer,
    },
}

/// Device resource provider.
///
/// Copies and kernels are queued in order. Reads are only valid once the
/// queue has been drained by `synchronize`. A provider is not meant to be
/// shared by more than one solver at a time.
pub trait DeviceProvider<R: Real>: Send {
    /// Identifier reported by the `device` preference.
    fn name(&self) -> &str;

    fn alloc_reals(&mut self, len: usize) -> Result<RealBuffer, DeviceError>;

    fn alloc_indices(&mut self, len: usize) -> Result<IndexBuffer, DeviceError>;

    fn free(&mut self, id: BufferId) -> Result<(), DeviceError>;

    /// Queue a host-to-device copy into the front of `dst`.
    fn enqueue_copy(&mut self, dst: RealBuffer, src: &[R]) -> Result<(), DeviceError>;

    fn enqueue_kernel(&mut self, kernel: Kernel<R>) -> Result<(), DeviceError>;

    /// Block until every queued command has completed.
    fn synchronize(&mut self) -> Result<(), DeviceError>;

    /// Device-to-host copy of the first `len` reals of `src`.
    fn read_reals(&self, src: RealBuffer, len: usize) -> Result<Vec<R>, DeviceError>;

    /// Device-to-host copy of the first `len` indices of `src`.
    fn read_indices(&self, src: IndexBuffer, len: usize) -> Result<Vec<u64>, DeviceError>;
}

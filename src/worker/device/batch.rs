// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Device workers and the backend that owns them.

use super::{BufferId, DeviceError, DeviceProvider, IndexBuffer, Kernel, RealBuffer};
use crate::packed::PackedIndex;
use crate::problem::{Real, WeightMatrix};
use crate::solver::{Result, SolverError};
use crate::worker::{Backend, Job, WorkerBackend, WorkerState};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<P>(device: &Mutex<P>) -> std::result::Result<MutexGuard<'_, P>, DeviceError> {
    device.lock().map_err(|_| DeviceError::Poisoned)
}

/// Device buffers owned by one worker, sized for a batch of `batch` indices.
#[derive(Debug, Clone, Copy)]
struct Buffers {
    weights: RealBuffer,
    bits: RealBuffer,
    energies: RealBuffer,
    minimum: RealBuffer,
    selected: IndexBuffer,
    count: IndexBuffer,
}

impl Buffers {
    /// Allocate every buffer or none.
    fn allocate<R: Real, P: DeviceProvider<R>>(
        dev: &mut P,
        n: usize,
        batch: usize,
    ) -> std::result::Result<Self, DeviceError> {
        let mut live = Vec::with_capacity(6);
        let result = Self::try_allocate::<R, P>(dev, n, batch, &mut live);
        if result.is_err() {
            free_all::<R, P, _>(dev, live);
        }
        result
    }

    fn try_allocate<R: Real, P: DeviceProvider<R>>(
        dev: &mut P,
        n: usize,
        batch: usize,
        live: &mut Vec<BufferId>,
    ) -> std::result::Result<Self, DeviceError> {
        let weights = dev.alloc_reals(buffer_len(n, n)?)?;
        live.push(weights.id);
        let bits = dev.alloc_reals(buffer_len(n, batch)?)?;
        live.push(bits.id);
        let energies = dev.alloc_reals(batch)?;
        live.push(energies.id);
        let minimum = dev.alloc_reals(1)?;
        live.push(minimum.id);
        let selected = dev.alloc_indices(batch)?;
        live.push(selected.id);
        let count = dev.alloc_indices(1)?;
        live.push(count.id);
        Ok(Self {
            weights,
            bits,
            energies,
            minimum,
            selected,
            count,
        })
    }

    fn ids(&self) -> [BufferId; 6] {
        [
            self.weights.id,
            self.bits.id,
            self.energies.id,
            self.minimum.id,
            self.selected.id,
            self.count.id,
        ]
    }
}

/// Element count of an `a` by `b` buffer. A product past `usize` can never fit.
fn buffer_len(a: usize, b: usize) -> std::result::Result<usize, DeviceError> {
    a.checked_mul(b).ok_or(DeviceError::OutOfMemory {
        requested: usize::MAX,
        available: 0,
    })
}

fn free_all<R, P, I>(dev: &mut P, ids: I)
where
    R: Real,
    P: DeviceProvider<R>,
    I: IntoIterator<Item = BufferId>,
{
    for id in ids {
        if let Err(err) = dev.free(id) {
            tracing::warn!(buffer = id.raw(), error = %err, "failed to free device buffer");
        }
    }
}

/// Worker that evaluates its range in device batches.
pub struct DeviceWorker<R: Real, P: DeviceProvider<R>> {
    device: Arc<Mutex<P>>,
    n: usize,
    batch: usize,
    buffers: Buffers,
    state: WorkerState<R>,
}

impl<R: Real, P: DeviceProvider<R>> DeviceWorker<R, P> {
    /// Allocate batch buffers on `device` and upload `weights`.
    ///
    /// Nothing stays allocated when this fails.
    pub fn new(device: Arc<Mutex<P>>, weights: &WeightMatrix<R>, batch: usize) -> Result<Self> {
        let n = weights.rows();
        let batch = batch.max(1);
        let buffers = {
            let mut dev = lock(&device)?;
            let buffers = Buffers::allocate::<R, P>(&mut *dev, n, batch)?;
            let upload = dev
                .enqueue_copy(buffers.weights, weights.as_slice())
                .and_then(|()| dev.synchronize());
            if let Err(err) = upload {
                free_all::<R, P, _>(&mut *dev, buffers.ids());
                return Err(err.into());
            }
            buffers
        };
        Ok(Self {
            device,
            n,
            batch,
            buffers,
            state: WorkerState::new(),
        })
    }

    fn search_batch(&mut self, dev: &mut P, begin: PackedIndex, end: PackedIndex) -> Result<()> {
        let rows = (end.value() - begin.value()) as usize;
        let b = self.buffers;
        dev.enqueue_kernel(Kernel::GenerateBits {
            out: b.bits,
            n: self.n,
            begin,
            end,
        })?;
        dev.enqueue_kernel(Kernel::Energies {
            weights: b.weights,
            bits: b.bits,
            n: self.n,
            rows,
            out: b.energies,
        })?;
        dev.enqueue_kernel(Kernel::ReduceMin {
            values: b.energies,
            len: rows,
            out: b.minimum,
        })?;
        dev.synchronize()?;
        let minimum = dev.read_reals(b.minimum, 1)?[0];

        if self.state.offer(minimum) {
            dev.enqueue_kernel(Kernel::Select {
                values: b.energies,
                len: rows,
                threshold: minimum,
                base: begin,
                out: b.selected,
                count: b.count,
            })?;
            dev.synchronize()?;
            let count = dev.read_indices(b.count, 1)?[0] as usize;
            let selected = dev.read_indices(b.selected, count)?;
            self.state
                .extend_ties(selected.into_iter().map(PackedIndex::new));
        }
        Ok(())
    }
}

impl<R: Real, P: DeviceProvider<R>> WorkerBackend<R> for DeviceWorker<R, P> {
    fn init_search(&mut self) -> Result<()> {
        self.state.reset();
        Ok(())
    }

    fn search_range(&mut self, begin: PackedIndex, end: PackedIndex) -> Result<()> {
        let device = Arc::clone(&self.device);
        let mut dev = lock(&device)?;
        let mut batch_begin = begin.value();
        while batch_begin < end.value() {
            let batch_end = end.value().min(batch_begin + self.batch as u64);
            self.search_batch(
                &mut dev,
                PackedIndex::new(batch_begin),
                PackedIndex::new(batch_end),
            )?;
            batch_begin = batch_end;
        }
        Ok(())
    }

    fn current_minimum(&self) -> R {
        self.state.minimum()
    }

    fn tie_list(&self) -> &[PackedIndex] {
        self.state.ties()
    }
}

impl<R: Real, P: DeviceProvider<R>> Drop for DeviceWorker<R, P> {
    fn drop(&mut self) {
        let Ok(mut dev) = lock(&self.device) else {
            return;
        };
        free_all::<R, P, _>(&mut *dev, self.buffers.ids());
    }
}

/// Backend running workers on one device.
///
/// Workers share the device queue, so the jobs of a round are submitted one
/// after another; each job waits for its batches before returning.
pub struct DeviceBackend<R: Real, P: DeviceProvider<R>> {
    device: Arc<Mutex<P>>,
    name: String,
    workers: usize,
    _real: PhantomData<fn() -> R>,
}

impl<R: Real, P: DeviceProvider<R>> DeviceBackend<R, P> {
    /// Bind to `provider` with a single worker.
    pub fn new(provider: P) -> Self {
        let name = provider.name().to_string();
        Self {
            device: Arc::new(Mutex::new(provider)),
            name,
            workers: 1,
            _real: PhantomData,
        }
    }

    /// Dispatch `workers` tiles per round. Zero is a preference error.
    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(SolverError::Preference(
                "device worker count must be a positive integer".to_string(),
            ));
        }
        self.workers = workers;
        Ok(self)
    }

    /// Shared handle to the provider, e.g. to inspect it after a run.
    pub fn device(&self) -> &Arc<Mutex<P>> {
        &self.device
    }
}

impl<R: Real, P: DeviceProvider<R>> Backend<R> for DeviceBackend<R, P> {
    type Worker = DeviceWorker<R, P>;

    fn device_name(&self) -> &str {
        &self.name
    }

    fn worker_count(&self) -> usize {
        self.workers
    }

    fn create_worker(
        &self,
        weights: &Arc<WeightMatrix<R>>,
        tile_size: usize,
    ) -> Result<Self::Worker> {
        DeviceWorker::new(Arc::clone(&self.device), weights, tile_size)
    }

    fn run_round(&self, jobs: Vec<Job<'_, Self::Worker>>) -> Result<()> {
        jobs.into_iter()
            .try_for_each(|job| job.worker.search_range(job.begin, job.end))
    }
}

// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! In-process device provider.

use super::{BufferId, DeviceError, DeviceProvider, IndexBuffer, Kernel, RealBuffer};
use crate::packed::PackedIndex;
use crate::problem::matrix::quadratic_form;
use crate::problem::Real;
use rayon::prelude::*;
use std::collections::{HashMap, VecDeque};

#[derive(Debug)]
enum Storage<R> {
    Reals(Vec<R>),
    Indices(Vec<u64>),
}

impl<R> Storage<R> {
    fn len(&self) -> usize {
        match self {
            Storage::Reals(v) => v.len(),
            Storage::Indices(v) => v.len(),
        }
    }
}

#[derive(Debug)]
enum Command<R: Real> {
    Copy { dst: RealBuffer, data: Vec<R> },
    Launch(Kernel<R>),
}

/// Device emulated in host memory.
///
/// Commands run in submission order when [`synchronize`](DeviceProvider::synchronize)
/// is called; data-parallel kernels are spread over rayon's pool. An optional
/// capacity (in elements) makes allocation failures reproducible.
#[derive(Debug)]
pub struct HostDevice<R: Real> {
    buffers: HashMap<BufferId, Storage<R>>,
    queue: VecDeque<Command<R>>,
    next_id: usize,
    allocated: usize,
    capacity: Option<usize>,
    poisoned: bool,
}

impl<R: Real> HostDevice<R> {
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
            queue: VecDeque::new(),
            next_id: 0,
            allocated: 0,
            capacity: None,
            poisoned: false,
        }
    }

    /// Limit total live allocations to `elements`.
    pub fn with_capacity(elements: usize) -> Self {
        Self {
            capacity: Some(elements),
            ..Self::new()
        }
    }

    /// Number of live allocations.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn check_alive(&self) -> Result<(), DeviceError> {
        if self.poisoned {
            Err(DeviceError::Poisoned)
        } else {
            Ok(())
        }
    }

    fn reserve(&mut self, len: usize) -> Result<BufferId, DeviceError> {
        self.check_alive()?;
        if let Some(capacity) = self.capacity {
            let available = capacity.saturating_sub(self.allocated);
            if len > available {
                return Err(DeviceError::OutOfMemory {
                    requested: len,
                    available,
                });
            }
        }
        self.allocated += len;
        let id = BufferId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn reals(&self, buffer: RealBuffer, needed: usize) -> Result<&[R], DeviceError> {
        match self.buffers.get(&buffer.id) {
            Some(Storage::Reals(v)) if v.len() >= needed => Ok(&v[..needed]),
            Some(Storage::Reals(v)) => Err(DeviceError::BufferTooSmall {
                buffer: buffer.id.0,
                len: v.len(),
                needed,
            }),
            Some(Storage::Indices(_)) => Err(DeviceError::TypeMismatch(buffer.id.0)),
            None => Err(DeviceError::InvalidBuffer(buffer.id.0)),
        }
    }

    fn indices(&self, buffer: IndexBuffer, needed: usize) -> Result<&[u64], DeviceError> {
        match self.buffers.get(&buffer.id) {
            Some(Storage::Indices(v)) if v.len() >= needed => Ok(&v[..needed]),
            Some(Storage::Indices(v)) => Err(DeviceError::BufferTooSmall {
                buffer: buffer.id.0,
                len: v.len(),
                needed,
            }),
            Some(Storage::Reals(_)) => Err(DeviceError::TypeMismatch(buffer.id.0)),
            None => Err(DeviceError::InvalidBuffer(buffer.id.0)),
        }
    }

    /// Detach an output buffer so inputs can be borrowed while it is written.
    fn take_reals(&mut self, buffer: RealBuffer, needed: usize) -> Result<Vec<R>, DeviceError> {
        self.reals(buffer, needed)?;
        match self.buffers.remove(&buffer.id) {
            Some(Storage::Reals(v)) => Ok(v),
            _ => Err(DeviceError::InvalidBuffer(buffer.id.0)),
        }
    }

    fn take_indices(
        &mut self,
        buffer: IndexBuffer,
        needed: usize,
    ) -> Result<Vec<u64>, DeviceError> {
        self.indices(buffer, needed)?;
        match self.buffers.remove(&buffer.id) {
            Some(Storage::Indices(v)) => Ok(v),
            _ => Err(DeviceError::InvalidBuffer(buffer.id.0)),
        }
    }

    fn execute(&mut self, command: Command<R>) -> Result<(), DeviceError> {
        match command {
            Command::Copy { dst, data } => {
                let mut target = self.take_reals(dst, data.len())?;
                target[..data.len()].copy_from_slice(&data);
                self.buffers.insert(dst.id, Storage::Reals(target));
            }
            Command::Launch(kernel) => self.launch(kernel)?,
        }
        Ok(())
    }

    fn evaluate_rows(
        &self,
        weights: RealBuffer,
        bits: RealBuffer,
        n: usize,
        energies: &mut [R],
    ) -> Result<(), DeviceError> {
        let w = self.reals(weights, n * n)?;
        let b = self.reals(bits, energies.len() * n)?;
        if n == 0 {
            energies.iter_mut().for_each(|e| *e = R::ZERO);
        } else {
            energies
                .par_iter_mut()
                .zip(b.par_chunks(n))
                .for_each(|(e, row)| *e = quadratic_form(w, n, row));
        }
        Ok(())
    }

    fn launch(&mut self, kernel: Kernel<R>) -> Result<(), DeviceError> {
        match kernel {
            Kernel::GenerateBits { out, n, begin, end } => {
                if end < begin {
                    return Err(DeviceError::KernelLaunch(format!(
                        "reversed bit range [{}, {})",
                        begin, end
                    )));
                }
                let rows = (end.value() - begin.value()) as usize;
                let mut bits = self.take_reals(out, rows * n)?;
                if n > 0 {
                    bits[..rows * n]
                        .par_chunks_mut(n)
                        .enumerate()
                        .for_each(|(r, row)| {
                            let x = PackedIndex::new(begin.value() + r as u64);
                            for (position, value) in row.iter_mut().enumerate() {
                                *value = if x.bit(position, n) { R::ONE } else { R::ZERO };
                            }
                        });
                }
                self.buffers.insert(out.id, Storage::Reals(bits));
            }
            Kernel::Energies {
                weights,
                bits,
                n,
                rows,
                out,
            } => {
                let mut energies = self.take_reals(out, rows)?;
                let result = self.evaluate_rows(weights, bits, n, &mut energies[..rows]);
                self.buffers.insert(out.id, Storage::Reals(energies));
                result?;
            }
            Kernel::ReduceMin { values, len, out } => {
                let minimum = self
                    .reals(values, len)?
                    .par_iter()
                    .copied()
                    .reduce(|| R::INFINITY, |a, b| if b < a { b } else { a });
                let mut target = self.take_reals(out, 1)?;
                target[0] = minimum;
                self.buffers.insert(out.id, Storage::Reals(target));
            }
            Kernel::Select {
                values,
                len,
                threshold,
                base,
                out,
                count,
            } => {
                let selected: Vec<u64> = self
                    .reals(values, len)?
                    .iter()
                    .enumerate()
                    .filter(|&(_, &v)| v == threshold)
                    .map(|(k, _)| base.value() + k as u64)
                    .collect();
                let mut target = self.take_indices(out, selected.len())?;
                target[..selected.len()].copy_from_slice(&selected);
                self.buffers.insert(out.id, Storage::Indices(target));
                let mut counter = self.take_indices(count, 1)?;
                counter[0] = selected.len() as u64;
                self.buffers.insert(count.id, Storage::Indices(counter));
            }
        }
        Ok(())
    }
}

impl<R: Real> Default for HostDevice<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Real> DeviceProvider<R> for HostDevice<R> {
    fn name(&self) -> &str {
        "host"
    }

    fn alloc_reals(&mut self, len: usize) -> Result<RealBuffer, DeviceError> {
        let id = self.reserve(len)?;
        self.buffers.insert(id, Storage::Reals(vec![R::ZERO; len]));
        Ok(RealBuffer { id, len })
    }

    fn alloc_indices(&mut self, len: usize) -> Result<IndexBuffer, DeviceError> {
        let id = self.reserve(len)?;
        self.buffers.insert(id, Storage::Indices(vec![0; len]));
        Ok(IndexBuffer { id, len })
    }

    fn free(&mut self, id: BufferId) -> Result<(), DeviceError> {
        let storage = self
            .buffers
            .remove(&id)
            .ok_or(DeviceError::InvalidBuffer(id.0))?;
        self.allocated -= storage.len();
        Ok(())
    }

    fn enqueue_copy(&mut self, dst: RealBuffer, src: &[R]) -> Result<(), DeviceError> {
        self.check_alive()?;
        self.queue.push_back(Command::Copy {
            dst,
            data: src.to_vec(),
        });
        Ok(())
    }

    fn enqueue_kernel(&mut self, kernel: Kernel<R>) -> Result<(), DeviceError> {
        self.check_alive()?;
        self.queue.push_back(Command::Launch(kernel));
        Ok(())
    }

    fn synchronize(&mut self) -> Result<(), DeviceError> {
        self.check_alive()?;
        while let Some(command) = self.queue.pop_front() {
            if let Err(err) = self.execute(command) {
                self.queue.clear();
                self.poisoned = true;
                tracing::error!(error = %err, "host device command failed");
                return Err(err);
            }
        }
        Ok(())
    }

    fn read_reals(&self, src: RealBuffer, len: usize) -> Result<Vec<R>, DeviceError> {
        self.check_alive()?;
        if !self.queue.is_empty() {
            return Err(DeviceError::Pending);
        }
        Ok(self.reals(src, len)?.to_vec())
    }

    fn read_indices(&self, src: IndexBuffer, len: usize) -> Result<Vec<u64>, DeviceError> {
        self.check_alive()?;
        if !self.queue.is_empty() {
            return Err(DeviceError::Pending);
        }
        Ok(self.indices(src, len)?.to_vec())
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Runs independent units of work, either one after another on the
//! calling thread or on a pool of scoped worker threads.
//!
//! A dispatch hands each unit to the work function exactly once and
//! returns only once every unit has finished.  Units are moved into
//! the work function, so when a unit is a mutable borrow of part of
//! the output, no two units can ever touch the same memory.

use std::alloc::{self, Layout};
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;
use std::sync::{Arc, Mutex};

use log::trace;

use crate::error::RenderError;

/// Where a unit of work sits in its dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TaskContext {
    /// Which worker is running the unit, in `0..thread_count`.
    pub thread_index: usize,
    /// Number of workers in this dispatch.
    pub thread_count: usize,
    /// Position of the unit in the dispatched list.
    pub task_index: usize,
    /// Number of units in the dispatch.
    pub task_count: usize,
}

/// Something that can run a list of independent units to completion.
pub trait Dispatcher: Sync {
    /// Number of workers a dispatch may use.
    fn thread_count(&self) -> usize;

    /// Calls `work` exactly once for every unit, returning after the
    /// last one finishes.  There is no early exit and no
    /// cancellation: a failing unit does not stop the others, and
    /// the failure of the lowest-numbered failing unit is returned.
    fn dispatch<T, F>(&self, units: Vec<T>, work: F) -> Result<(), RenderError>
    where
        T: Send,
        F: Fn(TaskContext, T) -> Result<(), RenderError> + Sync;

    /// Zeroed scratch space for one unit.
    fn alloc_scratch(&self, len: usize, alignment: usize) -> Result<ScratchBuffer, RenderError> {
        ScratchBuffer::zeroed(len, alignment)
    }
}

/// Runs every unit in order on the calling thread.  This is the
/// reference executor; every other executor must produce the same
/// output.
#[derive(Copy, Clone, Debug, Default)]
pub struct Sequential;

impl Dispatcher for Sequential {
    fn thread_count(&self) -> usize {
        1
    }

    fn dispatch<T, F>(&self, units: Vec<T>, work: F) -> Result<(), RenderError>
    where
        T: Send,
        F: Fn(TaskContext, T) -> Result<(), RenderError> + Sync,
    {
        let task_count = units.len();
        trace!("sequential dispatch of {} units", task_count);
        let mut first_error = None;
        for (task_index, unit) in units.into_iter().enumerate() {
            let result = work(
                TaskContext {
                    thread_index: 0,
                    thread_count: 1,
                    task_index,
                    task_count,
                },
                unit,
            );
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// A fixed number of worker threads pulling units from a shared
/// queue until it runs dry.
#[derive(Copy, Clone, Debug)]
pub struct Parallel {
    threads: usize,
}

impl Parallel {
    /// A pool of `threads` workers.
    pub fn new(threads: usize) -> Result<Parallel, RenderError> {
        if threads == 0 {
            return Err(RenderError::invalid("threads", "must be at least 1"));
        }
        Ok(Parallel { threads })
    }

    /// One worker per logical CPU.
    pub fn all_cores() -> Parallel {
        Parallel {
            threads: num_cpus::get().max(1),
        }
    }
}

type Queue<T> = Arc<Mutex<std::iter::Enumerate<std::vec::IntoIter<T>>>>;

impl Dispatcher for Parallel {
    fn thread_count(&self) -> usize {
        self.threads
    }

    fn dispatch<T, F>(&self, units: Vec<T>, work: F) -> Result<(), RenderError>
    where
        T: Send,
        F: Fn(TaskContext, T) -> Result<(), RenderError> + Sync,
    {
        let task_count = units.len();
        let thread_count = self.threads.min(task_count);
        if thread_count == 0 {
            return Ok(());
        }
        trace!(
            "parallel dispatch of {} units on {} threads",
            task_count,
            thread_count
        );

        let queue: Queue<T> = Arc::new(Mutex::new(units.into_iter().enumerate()));
        let failures: Mutex<Vec<(usize, RenderError)>> = Mutex::new(vec![]);
        let work = &work;
        let failures_ref = &failures;
        crossbeam::scope(|spawner| {
            for thread_index in 0..thread_count {
                let queue = queue.clone();
                spawner.spawn(move |_| loop {
                    // A poisoned queue means another worker died; the
                    // scope reports that once everyone has stopped.
                    let next = match queue.lock() {
                        Ok(mut units) => units.next(),
                        Err(_) => None,
                    };
                    let (task_index, unit) = match next {
                        Some(next) => next,
                        None => break,
                    };
                    let context = TaskContext {
                        thread_index,
                        thread_count,
                        task_index,
                        task_count,
                    };
                    if let Err(e) = work(context, unit) {
                        if let Ok(mut failures) = failures_ref.lock() {
                            failures.push((task_index, e));
                        }
                    }
                });
            }
        })
        .map_err(|_| RenderError::WorkerPanicked)?;

        let failures = failures
            .into_inner()
            .map_err(|_| RenderError::WorkerPanicked)?;
        match failures.into_iter().min_by_key(|(task_index, _)| *task_index) {
            Some((_, e)) => Err(e),
            None => Ok(()),
        }
    }
}

/// The executors the command line can choose between.
#[derive(Copy, Clone, Debug)]
pub enum Executor {
    /// See [`Sequential`].
    Sequential(Sequential),
    /// See [`Parallel`].
    Parallel(Parallel),
}

impl Executor {
    /// Sequential for one thread, a worker pool for more.
    pub fn with_threads(threads: usize) -> Result<Executor, RenderError> {
        match threads {
            0 => Err(RenderError::invalid("threads", "must be at least 1")),
            1 => Ok(Executor::Sequential(Sequential)),
            n => Ok(Executor::Parallel(Parallel::new(n)?)),
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Executor::Sequential(Sequential)
    }
}

impl Dispatcher for Executor {
    fn thread_count(&self) -> usize {
        match self {
            Executor::Sequential(s) => s.thread_count(),
            Executor::Parallel(p) => p.thread_count(),
        }
    }

    fn dispatch<T, F>(&self, units: Vec<T>, work: F) -> Result<(), RenderError>
    where
        T: Send,
        F: Fn(TaskContext, T) -> Result<(), RenderError> + Sync,
    {
        match self {
            Executor::Sequential(s) => s.dispatch(units, work),
            Executor::Parallel(p) => p.dispatch(units, work),
        }
    }
}

/// A zeroed, heap-allocated run of `f64` whose start is aligned to a
/// caller-chosen power of two, for per-unit working storage.
pub struct ScratchBuffer {
    ptr: NonNull<f64>,
    len: usize,
    layout: Option<Layout>,
}

// The buffer owns its allocation outright.
unsafe impl Send for ScratchBuffer {}
unsafe impl Sync for ScratchBuffer {}

impl ScratchBuffer {
    /// Allocates `len` zeroed values aligned to `alignment` bytes
    /// (raised to the natural alignment of `f64` if smaller).
    pub fn zeroed(len: usize, alignment: usize) -> Result<ScratchBuffer, RenderError> {
        if !alignment.is_power_of_two() {
            return Err(RenderError::invalid(
                "alignment",
                format!("{} is not a power of two", alignment),
            ));
        }
        let align = alignment.max(mem::align_of::<f64>());
        let bytes = len
            .checked_mul(mem::size_of::<f64>())
            .ok_or(RenderError::AllocationFailure {
                bytes: usize::max_value(),
                alignment: align,
            })?;
        if bytes == 0 {
            return Ok(ScratchBuffer {
                ptr: NonNull::dangling(),
                len: 0,
                layout: None,
            });
        }
        let layout = Layout::from_size_align(bytes, align)
            .map_err(|_| RenderError::AllocationFailure {
                bytes,
                alignment: align,
            })?;
        // Safety: the layout has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) } as *mut f64;
        let ptr = NonNull::new(raw).ok_or(RenderError::AllocationFailure {
            bytes,
            alignment: align,
        })?;
        Ok(ScratchBuffer {
            ptr,
            len,
            layout: Some(layout),
        })
    }

    /// Alignment of the first element, in bytes.
    pub fn alignment(&self) -> usize {
        self.layout
            .map_or(mem::align_of::<f64>(), |layout| layout.align())
    }
}

impl Deref for ScratchBuffer {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        // Safety: ptr is valid for len zero-initialized f64s.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for ScratchBuffer {
    fn deref_mut(&mut self) -> &mut [f64] {
        // Safety: as above, and we hold the only reference.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        if let Some(layout) = self.layout {
            // Safety: allocated in `zeroed` with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr() as *mut u8, layout) }
        }
    }
}

impl std::fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("len", &self.len)
            .field("alignment", &self.alignment())
            .finish()
    }
}

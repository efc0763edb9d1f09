//! Block-parallel loop dispatcher
//!
//! Distributes `[0, loopmax)` over workers: the first `workers - 1` blocks
//! are spawned through the active backend, the last block runs on the calling
//! thread, and every spawned worker is joined in spawn order before
//! returning. The join is the memory barrier: everything a worker wrote to the
//! shared context is visible to the caller afterwards.
//!
//! A worker that panics does not cut the dispatch short. All spawned workers
//! are still joined, then the failure is propagated. If a worker cannot be
//! spawned, the workers already running are joined, the remaining blocks
//! (including the inline one) are skipped, and the spawn error is propagated.

use super::partition::{partition, Partition};
use crate::error::{Error, Result};
use crate::runtime::backend::{
    active_backend, panic_message, Spawner, ThreadBackend, WorkerPanic,
};
use std::io;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};

/// One worker's share of the loop
#[derive(Debug)]
pub struct WorkItem<'a, C: ?Sized> {
    /// First iteration (inclusive)
    pub min: usize,
    /// Last iteration (exclusive)
    pub max: usize,
    /// Worker index, dense in `0..workers`
    pub thr_num: usize,
    /// Caller's shared context
    pub data: &'a C,
}

impl<'a, C: ?Sized> WorkItem<'a, C> {
    fn new(block: Range<usize>, thr_num: usize, data: &'a C) -> Self {
        WorkItem {
            min: block.start,
            max: block.end,
            thr_num,
            data,
        }
    }

    /// Iterations covered by this item
    pub fn range(&self) -> Range<usize> {
        self.min..self.max
    }

    /// Number of iterations
    pub fn len(&self) -> usize {
        self.max - self.min
    }

    /// Always false for items produced by a dispatch
    pub fn is_empty(&self) -> bool {
        self.min == self.max
    }
}

/// Conventional worker count: one per logical CPU
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}

enum Failure {
    Spawn { worker: usize, source: io::Error },
    Panic(WorkerPanic),
}

impl Failure {
    fn into_error(self) -> Error {
        match self {
            Failure::Spawn { worker, source } => Error::SpawnFailed {
                worker,
                message: source.to_string(),
            },
            Failure::Panic(failure) => Error::WorkerPanicked {
                worker: failure.worker,
                message: panic_message(&failure.payload),
            },
        }
    }

    fn resume(self) -> ! {
        match self {
            Failure::Spawn { worker, source } => {
                panic!("spawnloop: failed to spawn worker {}: {}", worker, source)
            }
            Failure::Panic(failure) => panic::resume_unwind(failure.payload),
        }
    }
}

/// Run `proc` over `[0, loopmax)` split across up to `nthr` workers.
///
/// Returns once every block has been processed.
///
/// # Panics
///
/// Panics if `loopmax` or `nthr` is zero. If a worker panics, the panic is
/// resumed on the caller after all workers have been joined. A failed spawn
/// also panics, after joining the workers already started.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let total = AtomicUsize::new(0);
/// spawnloop::spawn_loop(100, 4, |item| {
///     let sum: usize = item.range().sum();
///     item.data.fetch_add(sum, Ordering::Relaxed);
/// }, &total);
/// assert_eq!(total.into_inner(), (0..100).sum::<usize>());
/// ```
pub fn spawn_loop<C, F>(loopmax: usize, nthr: usize, proc: F, data: &C)
where
    C: Sync + ?Sized,
    F: Fn(WorkItem<'_, C>) + Sync,
{
    spawn_loop_with(&active_backend(), loopmax, nthr, proc, data)
}

/// [`spawn_loop`] over an explicit backend
pub fn spawn_loop_with<B, C, F>(backend: &B, loopmax: usize, nthr: usize, proc: F, data: &C)
where
    B: ThreadBackend + ?Sized,
    C: Sync + ?Sized,
    F: Fn(WorkItem<'_, C>) + Sync,
{
    if let Err(failure) = dispatch(backend, loopmax, nthr, &proc, data) {
        failure.resume();
    }
}

/// Like [`spawn_loop`], but reports worker and spawn failures as errors.
///
/// Zero `loopmax` or `nthr` still panics.
pub fn try_spawn_loop<C, F>(loopmax: usize, nthr: usize, proc: F, data: &C) -> Result<()>
where
    C: Sync + ?Sized,
    F: Fn(WorkItem<'_, C>) + Sync,
{
    try_spawn_loop_with(&active_backend(), loopmax, nthr, proc, data)
}

/// [`try_spawn_loop`] over an explicit backend
pub fn try_spawn_loop_with<B, C, F>(
    backend: &B,
    loopmax: usize,
    nthr: usize,
    proc: F,
    data: &C,
) -> Result<()>
where
    B: ThreadBackend + ?Sized,
    C: Sync + ?Sized,
    F: Fn(WorkItem<'_, C>) + Sync,
{
    dispatch(backend, loopmax, nthr, &proc, data).map_err(Failure::into_error)
}

fn dispatch<'env, B, C, F>(
    backend: &B,
    loopmax: usize,
    nthr: usize,
    proc: &'env F,
    data: &'env C,
) -> std::result::Result<(), Failure>
where
    B: ThreadBackend + ?Sized,
    C: Sync + ?Sized,
    F: Fn(WorkItem<'_, C>) + Sync,
{
    let partition = partition(loopmax, nthr);
    let span = tracing::debug_span!(
        "spawn_loop",
        loopmax,
        requested = nthr,
        workers = partition.workers(),
        block_size = partition.block_size(),
        backend = %backend.kind()
    );
    let _enter = span.enter();

    if partition.workers() <= 1 || !backend.is_parallel() {
        tracing::trace!("running whole range inline");
        return run_inline(WorkItem::new(0..loopmax, 0, data), proc);
    }

    let mut outcome = Ok(());
    let mut body = |spawner: &mut dyn Spawner<'env>| {
        outcome = drive(spawner, &partition, proc, data);
    };
    let deferred = backend.region(&mut body);

    match (outcome, deferred) {
        (Err(failure), _) => Err(failure),
        (Ok(()), Some(failure)) => {
            tracing::warn!(worker = failure.worker, "worker panicked");
            Err(Failure::Panic(failure))
        }
        (Ok(()), None) => Ok(()),
    }
}

fn run_inline<C, F>(item: WorkItem<'_, C>, proc: &F) -> std::result::Result<(), Failure>
where
    C: ?Sized,
    F: Fn(WorkItem<'_, C>),
{
    let worker = item.thr_num;
    panic::catch_unwind(AssertUnwindSafe(|| proc(item)))
        .map_err(|payload| Failure::Panic(WorkerPanic { worker, payload }))
}

fn drive<'env, C, F>(
    spawner: &mut dyn Spawner<'env>,
    partition: &Partition,
    proc: &'env F,
    data: &'env C,
) -> std::result::Result<(), Failure>
where
    C: Sync + ?Sized,
    F: Fn(WorkItem<'_, C>) + Sync,
{
    let last = partition.workers() - 1;
    let mut handles = Vec::with_capacity(last);
    let mut failure = None;

    for thr_num in 0..last {
        let item = WorkItem::new(partition.block(thr_num), thr_num, data);
        match spawner.spawn(Box::new(move || proc(item))) {
            Ok(handle) => {
                tracing::trace!(worker = thr_num, "worker spawned");
                handles.push((thr_num, handle));
            }
            Err(source) => {
                tracing::warn!(worker = thr_num, "failed to spawn worker: {}", source);
                failure = Some(Failure::Spawn {
                    worker: thr_num,
                    source,
                });
                break;
            }
        }
    }

    if failure.is_none() {
        let item = WorkItem::new(partition.block(last), last, data);
        if let Err(err) = run_inline(item, proc) {
            tracing::warn!(worker = last, "inline worker panicked");
            failure = Some(err);
        }
    }

    for (thr_num, handle) in handles {
        if let Err(payload) = spawner.join(handle) {
            tracing::warn!(worker = thr_num, "worker panicked");
            if failure.is_none() {
                failure = Some(Failure::Panic(WorkerPanic {
                    worker: thr_num,
                    payload,
                }));
            }
        } else {
            tracing::trace!(worker = thr_num, "worker joined");
        }
    }

    match failure {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}

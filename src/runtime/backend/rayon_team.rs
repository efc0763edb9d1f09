//! Runtime-directive backend on top of rayon
//!
//! Workers are handed to the rayon runtime as tasks of one `in_place_scope`.
//! There is no per-worker join: leaving the scope waits for every task.

use super::{BackendKind, PanicPayload, Spawner, ThreadBackend, WorkerEntry, WorkerHandle, WorkerPanic};
use parking_lot::Mutex;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Team of rayon workers; the scope exit is the join barrier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RayonTeam;

struct TeamSpawner<'a, 'scope> {
    scope: &'a rayon::Scope<'scope>,
    failures: Arc<Mutex<Vec<WorkerPanic>>>,
    spawned: usize,
}

impl<'a, 'scope, 'env: 'scope> Spawner<'env> for TeamSpawner<'a, 'scope> {
    fn spawn(&mut self, entry: WorkerEntry<'env>) -> io::Result<WorkerHandle> {
        let slot = self.spawned;
        self.spawned += 1;

        let failures = Arc::clone(&self.failures);
        self.scope.spawn(move |_| {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(entry)) {
                failures.lock().push(WorkerPanic {
                    worker: slot,
                    payload,
                });
            }
        });
        Ok(WorkerHandle::new(slot))
    }

    fn join(&mut self, _handle: WorkerHandle) -> Result<(), PanicPayload> {
        Ok(())
    }
}

impl ThreadBackend for RayonTeam {
    fn kind(&self) -> BackendKind {
        BackendKind::Rayon
    }

    fn region<'env>(&self, body: &mut dyn FnMut(&mut dyn Spawner<'env>)) -> Option<WorkerPanic> {
        let failures = Arc::new(Mutex::new(Vec::new()));

        rayon::in_place_scope(|scope| {
            let mut spawner = TeamSpawner {
                scope,
                failures: Arc::clone(&failures),
                spawned: 0,
            };
            body(&mut spawner);
        });

        let mut failures = std::mem::take(&mut *failures.lock());
        failures.sort_by_key(|failure| failure.worker);
        failures.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_region_exit_waits_for_tasks() {
        let counter = AtomicUsize::new(0);

        let failure = RayonTeam.region(&mut |spawner| {
            for _ in 0..8 {
                let counter = &counter;
                let handle = spawner
                    .spawn(Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }))
                    .unwrap();
                // no-op for this backend
                spawner.join(handle).unwrap();
            }
        });

        assert!(failure.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_panics_reported_at_region_exit() {
        let failure = RayonTeam.region(&mut |spawner| {
            spawner.spawn(Box::new(|| {})).unwrap();
            spawner.spawn(Box::new(|| panic!("task 1 failed"))).unwrap();
        });

        let failure = failure.expect("panic should be reported");
        assert_eq!(failure.worker, 1);
        assert_eq!(super::super::panic_message(&failure.payload), "task 1 failed");
    }
}

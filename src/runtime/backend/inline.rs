//! Degenerate backend for builds without threading support

use super::{BackendKind, PanicPayload, Spawner, ThreadBackend, WorkerEntry, WorkerHandle, WorkerPanic};
use std::io;
use std::panic::{self, AssertUnwindSafe};

/// Runs every worker synchronously inside `spawn`; `join` hands back the
/// recorded outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineThreads;

#[derive(Default)]
struct InlineSpawner {
    outcomes: Vec<Option<Result<(), PanicPayload>>>,
}

impl<'env> Spawner<'env> for InlineSpawner {
    fn spawn(&mut self, entry: WorkerEntry<'env>) -> io::Result<WorkerHandle> {
        let slot = self.outcomes.len();
        self.outcomes
            .push(Some(panic::catch_unwind(AssertUnwindSafe(entry))));
        Ok(WorkerHandle::new(slot))
    }

    fn join(&mut self, handle: WorkerHandle) -> Result<(), PanicPayload> {
        self.outcomes
            .get_mut(handle.slot())
            .and_then(Option::take)
            .unwrap_or(Ok(()))
    }
}

impl ThreadBackend for InlineThreads {
    fn kind(&self) -> BackendKind {
        BackendKind::Inline
    }

    fn is_parallel(&self) -> bool {
        false
    }

    fn region<'env>(&self, body: &mut dyn FnMut(&mut dyn Spawner<'env>)) -> Option<WorkerPanic> {
        let mut spawner = InlineSpawner::default();
        body(&mut spawner);

        spawner
            .outcomes
            .into_iter()
            .enumerate()
            .find_map(|(slot, outcome)| match outcome {
                Some(Err(payload)) => Some(WorkerPanic {
                    worker: slot,
                    payload,
                }),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Mutex;

    #[test]
    fn test_spawn_runs_synchronously() {
        let order = Mutex::new(Vec::new());

        InlineThreads.region(&mut |spawner| {
            let order = &order;
            let handle = spawner
                .spawn(Box::new(move || order.lock().unwrap().push("worker")))
                .unwrap();
            order.lock().unwrap().push("after spawn");
            spawner.join(handle).unwrap();
        });

        assert_eq!(order.into_inner().unwrap(), vec!["worker", "after spawn"]);
    }

    #[test]
    fn test_unjoined_panic_reported() {
        let ran = Cell::new(false);
        let failure = InlineThreads.region(&mut |spawner| {
            spawner.spawn(Box::new(|| panic!("inline failure"))).unwrap();
            ran.set(true);
        });

        assert!(ran.get());
        assert_eq!(failure.map(|f| f.worker), Some(0));
    }

    #[test]
    fn test_not_parallel() {
        assert!(!InlineThreads.is_parallel());
        assert_eq!(InlineThreads.kind(), BackendKind::Inline);
    }
}

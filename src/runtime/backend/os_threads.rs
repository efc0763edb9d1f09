//! Kernel-thread backend built on `std::thread::scope`

use super::{BackendKind, PanicPayload, Spawner, ThreadBackend, WorkerEntry, WorkerHandle, WorkerPanic};
use crate::runtime::config::ThreadAttributes;
use crate::runtime::environment;
use std::io;
use std::thread::{self, Scope, ScopedJoinHandle};

/// One kernel thread per spawned worker, created with the attributes recorded
/// by [`threads_init`](crate::threads_init).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsThreads {
    attributes: Option<ThreadAttributes>,
}

impl OsThreads {
    /// Use the process-wide attributes (platform defaults if none were recorded)
    pub fn from_environment() -> Self {
        OsThreads {
            attributes: environment::thread_attributes(),
        }
    }

    /// Use explicit attributes, bypassing the process-wide state
    pub fn with_attributes(attributes: ThreadAttributes) -> Self {
        OsThreads {
            attributes: Some(attributes),
        }
    }

    /// Attributes applied to every spawned thread, if any
    pub fn attributes(&self) -> Option<&ThreadAttributes> {
        self.attributes.as_ref()
    }

    // std threads are always joinable and system-scoped; only size and name apply
    fn builder(&self, slot: usize) -> thread::Builder {
        let mut builder = thread::Builder::new();
        if let Some(attrs) = &self.attributes {
            if let Some(size) = attrs.stack_size {
                builder = builder.stack_size(size);
            }
            if let Some(prefix) = &attrs.name_prefix {
                builder = builder.name(format!("{}-{}", prefix, slot));
            }
        }
        builder
    }
}

impl Default for OsThreads {
    fn default() -> Self {
        Self::from_environment()
    }
}

struct OsSpawner<'a, 'scope, 'env: 'scope> {
    backend: &'a OsThreads,
    scope: &'scope Scope<'scope, 'env>,
    handles: Vec<Option<ScopedJoinHandle<'scope, ()>>>,
}

impl<'a, 'scope, 'env: 'scope> OsSpawner<'a, 'scope, 'env> {
    fn join_remaining(&mut self) -> Option<WorkerPanic> {
        let mut first = None;
        for (slot, handle) in self.handles.iter_mut().enumerate() {
            if let Some(handle) = handle.take() {
                tracing::trace!(worker = slot, "joining unclaimed worker");
                if let Err(payload) = handle.join() {
                    if first.is_none() {
                        first = Some(WorkerPanic {
                            worker: slot,
                            payload,
                        });
                    }
                }
            }
        }
        first
    }
}

impl<'a, 'scope, 'env: 'scope> Spawner<'env> for OsSpawner<'a, 'scope, 'env> {
    fn spawn(&mut self, entry: WorkerEntry<'env>) -> io::Result<WorkerHandle> {
        let slot = self.handles.len();
        let handle = self.backend.builder(slot).spawn_scoped(self.scope, entry)?;
        self.handles.push(Some(handle));
        Ok(WorkerHandle::new(slot))
    }

    fn join(&mut self, handle: WorkerHandle) -> Result<(), PanicPayload> {
        match self.handles.get_mut(handle.slot()).and_then(Option::take) {
            Some(thread) => thread.join(),
            None => Ok(()),
        }
    }
}

impl ThreadBackend for OsThreads {
    fn kind(&self) -> BackendKind {
        BackendKind::Os
    }

    fn region<'env>(&self, body: &mut dyn FnMut(&mut dyn Spawner<'env>)) -> Option<WorkerPanic> {
        thread::scope(|scope| {
            let mut spawner = OsSpawner {
                backend: self,
                scope,
                handles: Vec::new(),
            };
            body(&mut spawner);
            spawner.join_remaining()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_spawn_and_join() {
        let counter = AtomicUsize::new(0);
        let backend = OsThreads::with_attributes(ThreadAttributes::default());

        let failure = backend.region(&mut |spawner| {
            let mut handles = Vec::new();
            for _ in 0..4 {
                let counter = &counter;
                handles.push(
                    spawner
                        .spawn(Box::new(move || {
                            counter.fetch_add(1, Ordering::SeqCst);
                        }))
                        .unwrap(),
                );
            }
            for handle in handles {
                spawner.join(handle).unwrap();
            }
        });

        assert!(failure.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_unjoined_workers_joined_at_region_exit() {
        let counter = AtomicUsize::new(0);
        let backend = OsThreads::with_attributes(ThreadAttributes::default());

        let failure = backend.region(&mut |spawner| {
            let counter = &counter;
            spawner
                .spawn(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        });

        assert!(failure.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_thread_names_use_prefix() {
        let names = Mutex::new(Vec::new());
        let attrs = ThreadAttributes {
            name_prefix: Some("fft-worker".to_string()),
            ..ThreadAttributes::default()
        };
        let backend = OsThreads::with_attributes(attrs);

        backend.region(&mut |spawner| {
            let names = &names;
            let handle = spawner
                .spawn(Box::new(move || {
                    let name = thread::current().name().map(str::to_string);
                    names.lock().unwrap().push(name);
                }))
                .unwrap();
            spawner.join(handle).unwrap();
        });

        assert_eq!(
            names.into_inner().unwrap(),
            vec![Some("fft-worker-0".to_string())]
        );
    }

    #[test]
    fn test_detach_and_scope_do_not_affect_creation() {
        use crate::runtime::config::{ContentionScope, DetachState};

        let counter = AtomicUsize::new(0);
        let attrs = ThreadAttributes {
            detach_state: DetachState::Detached,
            scope: ContentionScope::Process,
            ..ThreadAttributes::default()
        };
        let backend = OsThreads::with_attributes(attrs);

        let failure = backend.region(&mut |spawner| {
            let counter = &counter;
            let handle = spawner
                .spawn(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
            // still joinable
            spawner.join(handle).unwrap();
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        });

        assert!(failure.is_none());
    }

    #[test]
    fn test_join_reports_panic() {
        let backend = OsThreads::with_attributes(ThreadAttributes::default());
        let mut joined = None;

        let failure = backend.region(&mut |spawner| {
            let handle = spawner
                .spawn(Box::new(|| panic!("kernel exploded")))
                .unwrap();
            joined = Some(spawner.join(handle));
        });

        assert!(failure.is_none());
        let payload = joined.unwrap().unwrap_err();
        assert_eq!(super::super::panic_message(&payload), "kernel exploded");
    }
}

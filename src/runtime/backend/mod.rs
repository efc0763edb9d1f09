//! Thread lifecycle backends
//!
//! Every backend exposes the same two operations through a [`Spawner`]:
//! start a worker, and wait for it. Spawning happens inside a structured
//! region opened by [`ThreadBackend::region`]; no worker outlives the region.
//!
//! Exactly one backend is active per build:
//!
//! - `rayon-threads` feature: [`RayonTeam`], region exit is the join
//! - `os-threads` feature (default): [`OsThreads`], one kernel thread per worker
//! - neither: [`InlineThreads`], everything runs on the calling thread

mod inline;
mod os_threads;
#[cfg(feature = "rayon-threads")]
mod rayon_team;

pub use inline::InlineThreads;
pub use os_threads::OsThreads;
#[cfg(feature = "rayon-threads")]
pub use rayon_team::RayonTeam;

use std::any::Any;
use std::fmt;
use std::io;

/// Payload carried by a panicking worker
pub type PanicPayload = Box<dyn Any + Send + 'static>;

/// Entry point handed to [`Spawner::spawn`]
pub type WorkerEntry<'env> = Box<dyn FnOnce() + Send + 'env>;

/// Identifies a spawned worker within one region.
///
/// Deliberately neither `Clone` nor `Copy`: [`Spawner::join`] consumes it, so
/// a handle cannot be joined twice.
#[derive(Debug, PartialEq, Eq)]
pub struct WorkerHandle {
    slot: usize,
}

impl WorkerHandle {
    pub(crate) fn new(slot: usize) -> Self {
        WorkerHandle { slot }
    }

    /// Spawn order of the worker within its region
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// A worker that panicked, reported by the region that observed it
pub struct WorkerPanic {
    /// Spawn slot (equal to the worker index for dispatcher-driven regions)
    pub worker: usize,
    /// Original panic payload
    pub payload: PanicPayload,
}

impl fmt::Debug for WorkerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPanic")
            .field("worker", &self.worker)
            .field("message", &panic_message(&self.payload))
            .finish()
    }
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &PanicPayload) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Spawn/join capability available inside a region
pub trait Spawner<'env> {
    /// Start a worker running `entry`; returns without waiting for it.
    fn spawn(&mut self, entry: WorkerEntry<'env>) -> io::Result<WorkerHandle>;

    /// Block until the worker identified by `handle` has returned.
    ///
    /// Returns the panic payload if the worker panicked. Backends whose region
    /// exit is the join return `Ok(())` here and report failures from
    /// [`ThreadBackend::region`] instead.
    fn join(&mut self, handle: WorkerHandle) -> Result<(), PanicPayload>;
}

/// Which family of backend is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Kernel threads via `std::thread`
    Os,
    /// Runtime-managed team via rayon
    Rayon,
    /// No threading support
    Inline,
}

impl BackendKind {
    /// Short backend name for logs
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Os => "os",
            BackendKind::Rayon => "rayon",
            BackendKind::Inline => "inline",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A native way of running workers concurrently
pub trait ThreadBackend: Send + Sync {
    /// Backend family
    fn kind(&self) -> BackendKind;

    /// Whether spawned workers can actually run concurrently
    fn is_parallel(&self) -> bool {
        true
    }

    /// Open a structured region, run `body` with a spawner, and return once
    /// every worker spawned in it has finished.
    ///
    /// Workers the body did not join are joined before returning. The first
    /// panic observed outside of [`Spawner::join`] is returned.
    fn region<'env>(&self, body: &mut dyn FnMut(&mut dyn Spawner<'env>)) -> Option<WorkerPanic>;
}

/// Backend selected at build time
#[cfg(feature = "rayon-threads")]
pub type ActiveBackend = RayonTeam;

/// Backend selected at build time
#[cfg(all(feature = "os-threads", not(feature = "rayon-threads")))]
pub type ActiveBackend = OsThreads;

/// Backend selected at build time
#[cfg(not(any(feature = "os-threads", feature = "rayon-threads")))]
pub type ActiveBackend = InlineThreads;

/// Whether a threading backend is compiled in
pub const HAVE_THREADS: bool = cfg!(any(feature = "os-threads", feature = "rayon-threads"));

/// Kind of the build-selected backend
pub const ACTIVE_KIND: BackendKind = if cfg!(feature = "rayon-threads") {
    BackendKind::Rayon
} else if cfg!(feature = "os-threads") {
    BackendKind::Os
} else {
    BackendKind::Inline
};

/// Instantiate the build-selected backend
pub fn active_backend() -> ActiveBackend {
    ActiveBackend::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_kind_matches_backend() {
        assert_eq!(active_backend().kind(), ACTIVE_KIND);
        assert_eq!(HAVE_THREADS, ACTIVE_KIND != BackendKind::Inline);
    }

    #[test]
    fn test_panic_message() {
        let payload: PanicPayload = Box::new("static message");
        assert_eq!(panic_message(&payload), "static message");
        let payload: PanicPayload = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&payload), "owned message");
        let payload: PanicPayload = Box::new(42u32);
        assert_eq!(panic_message(&payload), "non-string panic payload");
    }
}

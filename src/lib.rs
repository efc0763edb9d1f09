//! # Spawnloop - Block-Parallel Loop Dispatch
//!
//! [![Crates.io](https://img.shields.io/crates/v/spawnloop.svg)](https://crates.io/crates/spawnloop)
//! [![Documentation](https://docs.rs/spawnloop/badge.svg)](https://docs.rs/spawnloop)
//! [![License: MIT](https://img.shields.io/badge/License-MIT-yellow.svg)](https://opensource.org/licenses/MIT)
//!
//! The concurrency primitive underneath single-threaded numeric kernels: split
//! an iteration range into contiguous blocks, run each block on its own
//! worker, and return once every worker is done.
//!
//! ## Features
//!
//! - **Critical-path partitioning** - the shortest longest-block for the
//!   requested workers, using no more workers than needed
//! - **One spawn fewer** - the last block runs on the calling thread
//! - **Join barrier** - worker writes are visible after [`spawn_loop`] returns
//! - **Pluggable backends** - kernel threads, a rayon team, or inline only
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! spawnloop = "1.0.0"
//! ```
//!
//! ```rust
//! use std::sync::Mutex;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Once, at startup. `NoThreads` is not fatal: dispatches run inline.
//! match spawnloop::threads_init() {
//!     Ok(()) | Err(spawnloop::Error::NoThreads) => {}
//!     Err(e) => return Err(e.into()),
//! }
//!
//! let blocks = Mutex::new(Vec::new());
//! spawnloop::spawn_loop(17, 4, |item| {
//!     item.data.lock().unwrap().push(item.range());
//! }, &blocks);
//!
//! let covered: usize = blocks.into_inner()?.iter().map(|r| r.len()).sum();
//! assert_eq!(covered, 17);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller → spawn_loop → partition → backend region (spawn N-1, run 1 inline) → join → return
//! ```
//!
//! - [`partition`] - block size and worker count
//! - [`spawn_loop`] - dispatch over the active backend
//! - [`runtime::backend`] - the spawn/join capability and its implementations
//! - [`threads_init`] - one-time thread attribute setup and hook installation
//!
//! ## Backends
//!
//! | Feature | Backend | Join |
//! |---------|---------|------|
//! | `os-threads` (default) | [`OsThreads`] | per worker |
//! | `rayon-threads` | `RayonTeam` | region exit |
//! | none | [`InlineThreads`] | not needed |
//!
//! ## License
//!
//! Licensed under the [MIT License](https://opensource.org/licenses/MIT).

/// Version of the Spawnloop crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod parallel;
pub mod runtime;

// Re-export main types
pub use error::{Error, ErrorSeverity, Result, NO_THREADS_STATUS};
pub use parallel::{
    default_workers, partition, spawn_loop, spawn_loop_with, try_spawn_loop, try_spawn_loop_with,
    Partition, WorkItem,
};
pub use runtime::{
    environment_state, registration_hooks, threads_init, threads_init_status, threads_init_with,
    BackendKind, EnvironmentConfig, EnvironmentState, InlineThreads, OsThreads, ThreadAttributes,
    ThreadBackend,
};
#[cfg(feature = "rayon-threads")]
pub use runtime::RayonTeam;

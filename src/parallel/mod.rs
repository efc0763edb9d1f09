//! Parallel loop dispatch
//!
//! [`partition`] decides how many workers a loop needs and how large their
//! blocks are; [`spawn_loop`] runs the blocks on the active thread backend.

mod dispatcher;
mod partition;

pub use dispatcher::{
    default_workers, spawn_loop, spawn_loop_with, try_spawn_loop, try_spawn_loop_with, WorkItem,
};
pub use partition::{partition, Partition};

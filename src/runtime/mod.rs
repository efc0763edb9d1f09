//! Thread runtime: backends, environment initialization and planner hooks

pub mod backend;
pub mod config;
pub mod environment;
pub mod hooks;

pub use backend::{
    active_backend, ActiveBackend, BackendKind, InlineThreads, OsThreads, Spawner, ThreadBackend,
    WorkerHandle, WorkerPanic, ACTIVE_KIND, HAVE_THREADS,
};
#[cfg(feature = "rayon-threads")]
pub use backend::RayonTeam;
pub use config::{ContentionScope, DetachState, EnvironmentConfig, ThreadAttributes};
pub use environment::{
    environment_state, thread_attributes, threads_init, threads_init_status, threads_init_with,
    Environment, EnvironmentState,
};
pub use hooks::{registration_hooks, CodeletDesc, Planner, RegistrationHooks, SolverDescriptor, SolverFamily};

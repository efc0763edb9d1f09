//! One-time thread environment initialization
//!
//! Establishes, once per process, the attributes used to create worker
//! threads: workers must be joinable and scheduled system-wide. When the
//! platform defaults already satisfy that, no custom attributes are kept.
//!
//! Initialization must succeed before relying on a dispatch to run in
//! parallel. It is idempotent: the first successful call fixes the state for
//! the lifetime of the process.

use crate::error::{Error, Result};
use crate::runtime::backend::{BackendKind, ACTIVE_KIND};
use crate::runtime::config::{
    ContentionScope, DetachState, EnvironmentConfig, ThreadAttributes, MIN_STACK_SIZE,
};
use crate::runtime::hooks;
use parking_lot::RwLock;
use serde::Serialize;

lazy_static::lazy_static! {
    /// Process-wide environment, written only by `threads_init_with`
    static ref ENVIRONMENT: RwLock<Environment> = RwLock::new(Environment::new(ACTIVE_KIND));
}

/// Lifecycle of the thread environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "attributes", rename_all = "snake_case")]
pub enum EnvironmentState {
    /// `threads_init` has not succeeded yet
    #[default]
    Uninitialized,
    /// Platform defaults are used as-is
    Default,
    /// Threads are created with these attributes
    Custom(ThreadAttributes),
}

impl EnvironmentState {
    /// Whether initialization has completed
    pub fn is_initialized(&self) -> bool {
        !matches!(self, EnvironmentState::Uninitialized)
    }

    /// Custom attributes, if any were retained
    pub fn attributes(&self) -> Option<&ThreadAttributes> {
        match self {
            EnvironmentState::Custom(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// Thread environment for one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    backend: BackendKind,
    state: EnvironmentState,
}

impl Environment {
    /// Uninitialized environment for `backend`
    pub fn new(backend: BackendKind) -> Self {
        Environment {
            backend,
            state: EnvironmentState::Uninitialized,
        }
    }

    /// Current state
    pub fn state(&self) -> &EnvironmentState {
        &self.state
    }

    /// Backend this environment configures
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Establish the environment from `config`.
    ///
    /// Repeated calls after a success leave the state unchanged. A failure
    /// leaves the environment uninitialized.
    pub fn init(&mut self, config: &EnvironmentConfig) -> Result<()> {
        self.init_from(|| Ok(config.clone()))
    }

    /// Like [`init`](Self::init), but `load` runs only when its configuration
    /// would actually be applied.
    ///
    /// An already-initialized environment never calls `load`, so a malformed
    /// source cannot fail a repeated initialization.
    pub fn init_from<F>(&mut self, load: F) -> Result<()>
    where
        F: FnOnce() -> Result<EnvironmentConfig>,
    {
        match self.backend {
            BackendKind::Inline => {
                self.state = EnvironmentState::Default;
                return Err(Error::NoThreads);
            }
            _ if self.state.is_initialized() => {
                tracing::debug!(backend = %self.backend, "thread environment already initialized");
                return Ok(());
            }
            BackendKind::Rayon => {
                // the rayon runtime owns thread creation
                self.state = EnvironmentState::Default;
            }
            BackendKind::Os => {
                let attrs = normalize(load()?.attributes)?;
                self.state = if attrs == ThreadAttributes::platform_default() {
                    EnvironmentState::Default
                } else {
                    EnvironmentState::Custom(attrs)
                };
            }
        }

        tracing::debug!(backend = %self.backend, state = ?self.state, "thread environment initialized");
        Ok(())
    }
}

/// Force joinable, system-scoped threads and validate the remaining attributes
fn normalize(mut attrs: ThreadAttributes) -> Result<ThreadAttributes> {
    if attrs.detach_state != DetachState::Joinable {
        tracing::debug!("thread attributes were detached; forcing joinable");
        attrs.detach_state = DetachState::Joinable;
    }

    if attrs.scope != ContentionScope::System {
        tracing::debug!("thread attributes were process-scoped; forcing system scope");
        attrs.scope = ContentionScope::System;
    }

    if let Some(size) = attrs.stack_size {
        if size < MIN_STACK_SIZE {
            return Err(Error::attribute(
                "stack_size",
                format!("{} bytes is below the minimum of {}", size, MIN_STACK_SIZE),
            ));
        }
    }

    if let Some(prefix) = &attrs.name_prefix {
        if prefix.contains('\0') {
            return Err(Error::attribute(
                "name_prefix",
                "thread names may not contain NUL bytes",
            ));
        }
    }

    Ok(attrs)
}

/// Initialize the process-wide environment from `SPAWNLOOP_*` variables.
///
/// Returns [`Error::NoThreads`] when no threading backend is compiled in;
/// dispatches still work, but always run inline.
///
/// The variables are read only by the first successful call; once the
/// environment is established, later calls return `Ok(())` without looking
/// at them.
pub fn threads_init() -> Result<()> {
    initialize(EnvironmentConfig::from_env)
}

/// Initialize the process-wide environment from an explicit configuration.
///
/// Installs the threaded registration hooks on success.
pub fn threads_init_with(config: &EnvironmentConfig) -> Result<()> {
    initialize(|| Ok(config.clone()))
}

fn initialize<F>(load: F) -> Result<()>
where
    F: FnOnce() -> Result<EnvironmentConfig>,
{
    let result = ENVIRONMENT.write().init_from(load);
    match &result {
        Ok(()) => hooks::install(hooks::RegistrationHooks::threaded()),
        Err(Error::NoThreads) => tracing::info!("no threading backend; dispatches run inline"),
        Err(e) => tracing::warn!("thread environment initialization failed: {}", e),
    }
    result
}

/// Status-code form of [`threads_init`]: `0` on success,
/// [`NO_THREADS_STATUS`](crate::error::NO_THREADS_STATUS) without a threading
/// backend, another non-zero value on configuration failure.
pub fn threads_init_status() -> i32 {
    match threads_init() {
        Ok(()) => 0,
        Err(e) => e.status_code(),
    }
}

/// Snapshot of the process-wide state
pub fn environment_state() -> EnvironmentState {
    ENVIRONMENT.read().state().clone()
}

/// Custom attributes for new worker threads, if any were retained
pub fn thread_attributes() -> Option<ThreadAttributes> {
    ENVIRONMENT.read().state().attributes().cloned()
}

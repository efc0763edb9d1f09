//! Thread creation configuration
//!
//! Attributes are requested through [`EnvironmentConfig`] and normalized by
//! [`threads_init_with`](crate::threads_init_with) before any worker starts.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable holding a worker stack size in bytes
pub const STACK_SIZE_VAR: &str = "SPAWNLOOP_STACK_SIZE";

/// Environment variable holding a worker thread name prefix
pub const THREAD_NAME_VAR: &str = "SPAWNLOOP_THREAD_NAME";

/// Smallest stack size accepted for worker threads (`PTHREAD_STACK_MIN` on Linux)
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Whether a created thread can be waited on
///
/// `std::thread` workers are always joinable. A `Detached` request is
/// accepted from configuration but corrected to `Joinable` during
/// initialization; it never reaches thread creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetachState {
    /// The creator may join the thread
    #[default]
    Joinable,
    /// Fire-and-forget; cannot be joined
    Detached,
}

/// Scheduling contention scope of a created thread
///
/// `std::thread` workers are always system-scoped kernel threads. A
/// `Process` request is corrected to `System` during initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentionScope {
    /// Competes with every thread on the system
    #[default]
    System,
    /// Confined to the process's scheduling group
    Process,
}

/// Attributes applied when creating worker threads
///
/// Only `stack_size` and `name_prefix` change how [`OsThreads`] builds a
/// thread. The detach state and scope record the normalized request.
///
/// [`OsThreads`]: crate::OsThreads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadAttributes {
    /// Detach state
    pub detach_state: DetachState,
    /// Contention scope
    pub scope: ContentionScope,
    /// Stack size in bytes (`None` keeps the platform default)
    pub stack_size: Option<usize>,
    /// Worker names become `{prefix}-{index}`
    pub name_prefix: Option<String>,
}

impl ThreadAttributes {
    /// What `std::thread::Builder::new()` produces: joinable and
    /// system-scoped, with no stack size or name set
    pub fn platform_default() -> Self {
        ThreadAttributes::default()
    }

    /// Whether workers created with these attributes can be joined and run
    /// in parallel
    pub fn is_parallel_safe(&self) -> bool {
        self.detach_state == DetachState::Joinable && self.scope == ContentionScope::System
    }
}

/// Requested environment configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Requested thread attributes
    pub attributes: ThreadAttributes,
}

impl EnvironmentConfig {
    /// Create a configuration builder
    pub fn builder() -> EnvironmentConfigBuilder {
        EnvironmentConfigBuilder::default()
    }

    /// Read the configuration from `SPAWNLOOP_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = EnvironmentConfig::default();

        if let Ok(raw) = env::var(STACK_SIZE_VAR) {
            let size = raw.trim().parse::<usize>().map_err(|e| {
                Error::InvalidConfig(format!("{}={:?}: {}", STACK_SIZE_VAR, raw, e))
            })?;
            config.attributes.stack_size = Some(size);
        }

        if let Ok(prefix) = env::var(THREAD_NAME_VAR) {
            if !prefix.is_empty() {
                config.attributes.name_prefix = Some(prefix);
            }
        }

        Ok(config)
    }

    /// Parse a JSON configuration document
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Builder for [`EnvironmentConfig`]
#[derive(Debug, Default)]
pub struct EnvironmentConfigBuilder {
    config: EnvironmentConfig,
}

impl EnvironmentConfigBuilder {
    pub fn detach_state(mut self, state: DetachState) -> Self {
        self.config.attributes.detach_state = state;
        self
    }

    pub fn scope(mut self, scope: ContentionScope) -> Self {
        self.config.attributes.scope = scope;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.attributes.stack_size = Some(size);
        self
    }

    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.attributes.name_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> EnvironmentConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = EnvironmentConfig::builder()
            .stack_size(1 << 20)
            .name_prefix("fft")
            .detach_state(DetachState::Detached)
            .build();
        assert_eq!(config.attributes.stack_size, Some(1 << 20));
        assert_eq!(config.attributes.name_prefix.as_deref(), Some("fft"));
        assert!(!config.attributes.is_parallel_safe());
    }

    #[test]
    fn test_platform_default_is_parallel_safe() {
        let attrs = ThreadAttributes::platform_default();
        assert!(attrs.is_parallel_safe());
        assert_eq!(attrs.stack_size, None);
        assert_eq!(attrs.name_prefix, None);
    }

    #[test]
    fn test_from_json() {
        let config = EnvironmentConfig::from_json(
            r#"{"attributes": {"scope": "process", "stack_size": 65536}}"#,
        )
        .unwrap();
        assert_eq!(config.attributes.scope, ContentionScope::Process);
        assert_eq!(config.attributes.stack_size, Some(65536));
        assert_eq!(config.attributes.detach_state, DetachState::Joinable);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = EnvironmentConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}

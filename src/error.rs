//! Error types for Spawnloop

use thiserror::Error;

/// Status returned by [`threads_init_status`](crate::threads_init_status) when
/// the crate was built without any threading backend.
pub const NO_THREADS_STATUS: i32 = -31416;

/// Status used for rejected thread creation attributes (matches `EINVAL`).
pub const EINVAL_STATUS: i32 = 22;

/// Spawnloop errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Environment errors
    /// No threading backend was compiled in
    ///
    /// **Triggered by:** Building without `os-threads` or `rayon-threads`
    /// **Recovery:** Not an error to retry; every dispatch runs inline
    #[error("No threading backend compiled in")]
    NoThreads,

    /// A thread creation attribute could not be established
    ///
    /// **Triggered by:** Stack size below the platform minimum, or a thread
    /// name prefix with an interior NUL byte
    /// **Prevention:** Validate configuration before calling `threads_init_with`
    #[error("Thread attribute {attribute} rejected: {reason}")]
    ThreadAttributes {
        /// Attribute name
        attribute: String,
        /// Reason for rejection
        reason: String,
    },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Dispatch errors
    /// The backend failed to start a worker
    #[error("Failed to spawn worker {worker}: {message}")]
    SpawnFailed {
        /// Index of the worker that could not be started
        worker: usize,
        /// Underlying platform error
        message: String,
    },

    /// A worker's callback panicked
    ///
    /// Reported only after every spawned worker has been joined.
    #[error("Worker {worker} panicked: {message}")]
    WorkerPanicked {
        /// Index of the first worker that failed
        worker: usize,
        /// Panic message, when it was a string
        message: String,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Fatal error that cannot be recovered from
    Fatal,
    /// Configuration problem the caller may correct and retry
    Recoverable,
    /// Condition that doesn't prevent execution
    Warning,
}

impl Error {
    /// Create an attribute error
    pub fn attribute(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ThreadAttributes {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Integer status reported by the status-code initialization entry point
    pub fn status_code(&self) -> i32 {
        match self {
            Error::NoThreads => NO_THREADS_STATUS,
            Error::ThreadAttributes { .. } | Error::InvalidConfig(_) => EINVAL_STATUS,
            Error::SpawnFailed { .. } | Error::WorkerPanicked { .. } => -1,
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::NoThreads => ErrorSeverity::Warning,
            Error::ThreadAttributes { .. } => ErrorSeverity::Recoverable,
            Error::InvalidConfig(_) => ErrorSeverity::Recoverable,
            Error::SpawnFailed { .. } => ErrorSeverity::Fatal,
            Error::WorkerPanicked { .. } => ErrorSeverity::Fatal,
        }
    }
}

/// Result type for Spawnloop operations
pub type Result<T> = std::result::Result<T, Error>;

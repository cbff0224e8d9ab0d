//! Error types for event dispatch

use thiserror::Error;

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event could not be resolved into pipeline runs
    #[error(transparent)]
    Resolve(#[from] latch_core::Error),

    #[error("config '{name}' not found in namespace '{namespace}'")]
    ConfigNotFound { namespace: String, name: String },

    /// A submitter rejected a run
    #[error("failed to submit '{run}': {reason}")]
    Submit { run: String, reason: String },

    #[error("submission of '{0}' timed out")]
    Timeout(String),

    /// A submission task panicked or was cancelled
    #[error("submission task failed: {0}")]
    Task(String),

    /// Best-effort batch submission finished with failures
    #[error("{} pipeline run(s) failed to submit, {submitted} submitted", failures.len())]
    Submission {
        failures: Vec<DispatchError>,
        submitted: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DispatchError {
    pub fn submit(run: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Submit {
            run: run.into(),
            reason: reason.to_string(),
        }
    }

    /// Individual failures of a batch, or the error itself
    pub fn failures(&self) -> &[DispatchError] {
        match self {
            Self::Submission { failures, .. } => failures,
            other => std::slice::from_ref(other),
        }
    }
}

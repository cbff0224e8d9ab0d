//! Error types for configuration resolution
//!
//! Every failure is returned to the immediate caller. The engine never logs
//! and swallows an error, and it never retries.

use thiserror::Error;

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by an expression engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The text is not a well-formed expression over the declared variables.
    ///
    /// This is the only failure that `safe_value_of` turns into a literal.
    #[error("invalid expression '{expression}': {reason}")]
    Invalid { expression: String, reason: String },

    /// A well-formed expression failed while being evaluated
    #[error("failed to evaluate '{expression}': {reason}")]
    Evaluation { expression: String, reason: String },
}

impl ResolveError {
    pub fn invalid(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn evaluation(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Evaluation {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Check if the expression was rejected before evaluation
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

/// Errors produced while merging, filtering, reconciling or materializing
#[derive(Debug, Error)]
pub enum Error {
    /// An event body or configuration document could not be decoded
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An expression failed at evaluation time
    #[error(transparent)]
    Expression(#[from] ResolveError),

    /// A trigger filter produced something other than a boolean
    #[error("unable to convert filter '{filter}' value from '{found}' to 'boolean'")]
    FilterType { filter: String, found: String },

    /// A parameter the caller relies on is absent from the event
    #[error("{0} param does not exist")]
    ParamNotFound(String),

    /// The event does not carry a pipeline configuration extension
    #[error("config does not exist")]
    ConfigNotFound,

    /// The event carries a pipeline configuration that cannot be decoded
    #[error("config is malformed: {0}")]
    ConfigMalformed(String),
}

impl Error {
    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::MalformedInput(err.to_string())
    }

    /// Check if this error came out of an expression evaluation
    pub fn is_expression_error(&self) -> bool {
        matches!(self, Self::Expression(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedInput(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::MalformedInput(err.to_string())
    }
}

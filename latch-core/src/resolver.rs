//! Expression resolution interface
//!
//! The engine consumes expression evaluation as an opaque capability. Any
//! engine that can evaluate a string against a [`ResolutionContext`] and
//! tell a malformed expression apart from a failed evaluation can be
//! plugged in here.

use serde_json::Value as JsonValue;

use crate::context::ResolutionContext;
use crate::error::ResolveError;

/// Evaluates expressions against an event
///
/// Implementations must be pure: no network, disk or other side effects,
/// and no state shared between calls.
pub trait Resolver: Send + Sync {
    /// Evaluates `expression` strictly
    ///
    /// # Errors
    /// - [`ResolveError::Invalid`] if the text is not a valid expression
    /// - [`ResolveError::Evaluation`] if a valid expression fails to evaluate
    fn value_of(
        &self,
        ctx: &ResolutionContext,
        expression: &str,
    ) -> Result<JsonValue, ResolveError>;

    /// Evaluates `expression`, treating invalid expressions as literal text
    ///
    /// Lets configuration authors write either a literal default (`main`) or
    /// a dynamic reference (`body.ref`) in the same field. Evaluation
    /// failures of valid expressions are still returned as errors.
    fn safe_value_of(
        &self,
        ctx: &ResolutionContext,
        expression: &str,
    ) -> Result<JsonValue, ResolveError> {
        match self.value_of(ctx, expression) {
            Err(err) if err.is_invalid() => Ok(JsonValue::String(expression.to_string())),
            other => other,
        }
    }

    /// Like [`Resolver::safe_value_of`], formatted back into a string
    fn resolve_string(
        &self,
        ctx: &ResolutionContext,
        expression: &str,
    ) -> Result<String, ResolveError> {
        self.safe_value_of(ctx, expression)
            .map(|value| format_value(&value))
    }
}

/// Formats a dynamic value for a string-typed configuration field
///
/// Strings are used verbatim, `null` becomes the empty string and
/// lists or maps are rendered as compact JSON.
pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

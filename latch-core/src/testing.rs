//! Minimal resolver used by the unit tests of this crate
//!
//! Understands dotted references into the four event variables, quoted
//! string literals, booleans, and a single `==` or `!=` comparison.

use serde_json::{Map, Value as JsonValue, json};

use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::resolver::Resolver;

pub(crate) struct PathResolver;

pub(crate) fn object(value: JsonValue) -> Map<String, JsonValue> {
    value.as_object().cloned().unwrap_or_default()
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl PathResolver {
    fn operand(
        &self,
        ctx: &ResolutionContext,
        expression: &str,
        text: &str,
    ) -> Result<JsonValue, ResolveError> {
        if let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            return Ok(json!(inner));
        }
        match text {
            "true" => return Ok(json!(true)),
            "false" => return Ok(json!(false)),
            _ => {}
        }

        if !text.split('.').all(is_identifier) {
            return Err(ResolveError::invalid(expression, "syntax error"));
        }

        let mut segments = text.split('.');
        let root = segments.next().unwrap_or_default();
        let mut current = match root {
            "body" => JsonValue::Object(ctx.body.clone()),
            "extensions" => JsonValue::Object(ctx.extensions.clone()),
            "params" => JsonValue::Object(ctx.params.clone()),
            "header" => serde_json::to_value(&ctx.header)
                .map_err(|e| ResolveError::evaluation(expression, e.to_string()))?,
            other => {
                return Err(ResolveError::invalid(
                    expression,
                    format!("undeclared reference to '{}'", other),
                ));
            }
        };

        for segment in segments {
            current = match current {
                JsonValue::Object(map) => map.get(segment).cloned().ok_or_else(|| {
                    ResolveError::evaluation(expression, format!("no such key: {}", segment))
                })?,
                _ => {
                    return Err(ResolveError::evaluation(
                        expression,
                        "type does not support field selection",
                    ));
                }
            };
        }

        Ok(current)
    }
}

impl Resolver for PathResolver {
    fn value_of(
        &self,
        ctx: &ResolutionContext,
        expression: &str,
    ) -> Result<JsonValue, ResolveError> {
        let text = expression.trim();
        for (op, negate) in [("==", false), ("!=", true)] {
            if let Some((lhs, rhs)) = text.split_once(op) {
                let left = self.operand(ctx, expression, lhs.trim())?;
                let right = self.operand(ctx, expression, rhs.trim())?;
                return Ok(JsonValue::Bool((left == right) != negate));
            }
        }
        self.operand(ctx, expression, text)
    }
}

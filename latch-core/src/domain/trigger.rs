//! Triggers and trigger filters

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::context::ResolutionContext;
use crate::domain::run::{RunTemplate, merge_pipelines};
use crate::error::{Error, Result};
use crate::merge::{Merge, merge_string};
use crate::resolver::Resolver;

/// A named filter plus the pipelines it starts when the filter matches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Trigger {
    /// Identifies the trigger when layers are merged
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "TriggerFilter::is_empty")]
    pub filter: TriggerFilter,

    /// Overrides the configuration defaults for this trigger's pipelines
    #[serde(skip_serializing_if = "is_empty_template")]
    pub defaults: RunTemplate,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pipelines: Vec<RunTemplate>,
}

pub(crate) fn is_empty_template(template: &RunTemplate) -> bool {
    *template == RunTemplate::default()
}

impl Trigger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = TriggerFilter::new(filter);
        self
    }

    pub fn with_defaults(mut self, defaults: RunTemplate) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_pipeline(mut self, pipeline: RunTemplate) -> Self {
        self.pipelines.push(pipeline);
        self
    }
}

impl Merge for Trigger {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.name, &other.name);
        merge_string(&mut self.filter.0, &other.filter.0);
        self.defaults.merge(&other.defaults);
        merge_pipelines(&mut self.pipelines, &other.pipelines);
    }
}

pub(crate) fn merge_triggers(dst: &mut Vec<Trigger>, src: &[Trigger]) {
    crate::merge::merge_by_key(dst, src, |t| t.name.as_str());
}

/// Boolean expression deciding whether a trigger fires
///
/// An empty filter matches every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerFilter(String);

impl TriggerFilter {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates the filter against an event
    ///
    /// Uses strict resolution: a filter that is not a valid expression is an
    /// error, never a silent non-match.
    ///
    /// # Errors
    /// - [`Error::Expression`] if the filter cannot be evaluated
    /// - [`Error::FilterType`] if the filter does not produce a boolean
    pub fn matches(&self, resolver: &dyn Resolver, ctx: &ResolutionContext) -> Result<bool> {
        if self.is_empty() {
            return Ok(true);
        }

        match resolver.value_of(ctx, &self.0)? {
            JsonValue::Bool(matched) => {
                debug!("Filter '{}' evaluated to {}", self.0, matched);
                Ok(matched)
            }
            other => Err(Error::FilterType {
                filter: self.0.clone(),
                found: type_name(&other).to_string(),
            }),
        }
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PathResolver, object};
    use serde_json::json;

    #[test]
    fn test_empty_filter_always_matches() {
        let filter = TriggerFilter::default();
        assert!(filter.matches(&PathResolver, &ResolutionContext::new()).unwrap());
    }

    #[test]
    fn test_filter_match_true() {
        let ctx = ResolutionContext::new().with_body(object(json!({"action": "opened"})));
        let filter = TriggerFilter::new(r#"body.action == "opened""#);
        assert!(filter.matches(&PathResolver, &ctx).unwrap());
    }

    #[test]
    fn test_filter_match_false() {
        let ctx = ResolutionContext::new().with_body(object(json!({"ref": "refs/heads/master"})));
        let filter = TriggerFilter::new(r#"body.ref == "refs/heads/main""#);
        assert!(!filter.matches(&PathResolver, &ctx).unwrap());
    }

    #[test]
    fn test_filter_non_boolean_is_error() {
        let ctx = ResolutionContext::new().with_body(object(json!({"ref": "refs/heads/master"})));
        let err = TriggerFilter::new("body.ref")
            .matches(&PathResolver, &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::FilterType { ref found, .. } if found == "string"));
        assert!(err.to_string().contains("to 'boolean'"));
    }

    #[test]
    fn test_filter_invalid_expression_is_error() {
        let err = TriggerFilter::new("not a filter")
            .matches(&PathResolver, &ResolutionContext::new())
            .unwrap_err();
        assert!(err.is_expression_error());
    }

    #[test]
    fn test_trigger_merge_by_pipeline_name() {
        let mut base = Trigger::new("pr")
            .with_filter("body.a")
            .with_pipeline(RunTemplate::named("build"));
        let layer = Trigger::new("pr")
            .with_pipeline(RunTemplate::named("build").with_param(
                crate::domain::spec::Param::string("target", "debug"),
            ))
            .with_pipeline(RunTemplate::named("lint"));

        base.merge(&layer);

        assert_eq!(base.filter.as_str(), "body.a");
        assert_eq!(base.pipelines.len(), 2);
        assert_eq!(base.pipelines[0].params.len(), 1);
        assert_eq!(base.pipelines[1].name, "lint");
    }
}

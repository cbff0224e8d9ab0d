//! Field reconciliation
//!
//! Replaces expression references in a merged template with values drawn
//! from the event. Each string goes through [`Resolver::resolve_string`], so
//! literals that are not valid expressions stay as they are.

use std::collections::BTreeMap;

use crate::context::ResolutionContext;
use crate::domain::run::{Metadata, RunTemplate};
use crate::domain::spec::{Param, ParamValue};
use crate::error::Result;
use crate::resolver::Resolver;

/// Rewrites a value in place from an event
pub trait Reconcile {
    /// Resolves every dynamic reference held by `self`
    ///
    /// # Errors
    /// Returns the first resolver error. `self` may then hold a mix of
    /// resolved and unresolved values, unless the implementation says otherwise.
    fn reconcile(&mut self, resolver: &dyn Resolver, ctx: &ResolutionContext) -> Result<()>;
}

impl Reconcile for BTreeMap<String, String> {
    fn reconcile(&mut self, resolver: &dyn Resolver, ctx: &ResolutionContext) -> Result<()> {
        for value in self.values_mut() {
            *value = resolver.resolve_string(ctx, value)?;
        }
        Ok(())
    }
}

impl Reconcile for Metadata {
    fn reconcile(&mut self, resolver: &dyn Resolver, ctx: &ResolutionContext) -> Result<()> {
        self.labels.reconcile(resolver, ctx)?;
        self.annotations.reconcile(resolver, ctx)
    }
}

impl Reconcile for Param {
    fn reconcile(&mut self, resolver: &dyn Resolver, ctx: &ResolutionContext) -> Result<()> {
        match &mut self.value {
            ParamValue::String(value) => {
                *value = resolver.resolve_string(ctx, value)?;
            }
            ParamValue::Array(values) => {
                for value in values.iter_mut() {
                    *value = resolver.resolve_string(ctx, value)?;
                }
            }
        }
        Ok(())
    }
}

impl Reconcile for Vec<Param> {
    fn reconcile(&mut self, resolver: &dyn Resolver, ctx: &ResolutionContext) -> Result<()> {
        for param in self.iter_mut() {
            param.reconcile(resolver, ctx)?;
        }
        Ok(())
    }
}

/// Reconciles metadata and parameters as one unit
///
/// On error the template is left exactly as it was.
impl Reconcile for RunTemplate {
    fn reconcile(&mut self, resolver: &dyn Resolver, ctx: &ResolutionContext) -> Result<()> {
        let mut metadata = self.metadata.clone();
        let mut params = self.params.clone();
        metadata.reconcile(resolver, ctx)?;
        params.reconcile(resolver, ctx)?;

        self.metadata = metadata;
        self.params = params;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PathResolver, object};
    use serde_json::json;

    fn context() -> ResolutionContext {
        ResolutionContext::new().with_body(object(json!({
            "repository": { "clone_url": "foo" },
            "ref": "refs/heads/dev",
        })))
    }

    #[test]
    fn test_param_string_reference() {
        let mut param = Param::string("url", "body.repository.clone_url");
        param.reconcile(&PathResolver, &context()).unwrap();
        assert_eq!(param, Param::string("url", "foo"));
    }

    #[test]
    fn test_param_array_reference() {
        let mut param = Param::array("urls", ["body.repository.clone_url"]);
        param.reconcile(&PathResolver, &context()).unwrap();
        assert_eq!(param, Param::array("urls", ["foo"]));
    }

    #[test]
    fn test_param_string_default() {
        let mut param = Param::string("branch", "foo");
        param.reconcile(&PathResolver, &ResolutionContext::new()).unwrap();
        assert_eq!(param, Param::string("branch", "foo"));
    }

    #[test]
    fn test_param_array_default() {
        let mut param = Param::array("targets", ["foo", "bar"]);
        param.reconcile(&PathResolver, &ResolutionContext::new()).unwrap();
        assert_eq!(param, Param::array("targets", ["foo", "bar"]));
    }

    #[test]
    fn test_metadata_labels_and_annotations() {
        let mut metadata = Metadata::default();
        metadata.labels.insert("ref".into(), "body.ref".into());
        metadata.annotations.insert("owner".into(), "platform-team".into());

        metadata.reconcile(&PathResolver, &context()).unwrap();

        assert_eq!(metadata.labels["ref"], "refs/heads/dev");
        assert_eq!(metadata.annotations["owner"], "platform-team");
    }

    #[test]
    fn test_reconcile_is_idempotent_for_literals() {
        let mut template = RunTemplate::default()
            .with_param(Param::string("branch", "body.ref"))
            .with_param(Param::string("mode", "release"));
        let ctx = context();

        template.reconcile(&PathResolver, &ctx).unwrap();
        let first = template.clone();
        template.reconcile(&PathResolver, &ctx).unwrap();

        assert_eq!(template, first);
    }

    #[test]
    fn test_template_failure_leaves_template_untouched() {
        let mut template = RunTemplate::default()
            .with_param(Param::string("branch", "body.ref"))
            .with_param(Param::string("sha", "body.head_commit.id"));
        template.metadata.labels.insert("ref".into(), "body.ref".into());
        let before = template.clone();

        let err = template.reconcile(&PathResolver, &context()).unwrap_err();

        assert!(err.is_expression_error());
        assert_eq!(template, before);
    }
}

//! Layered pipeline configuration
//!
//! A [`Configuration`] is decoded from YAML or JSON, merged with any override
//! layers, and then resolved against one event at a time by
//! [`Configuration::pipeline_runs`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::context::ResolutionContext;
use crate::domain::run::RunTemplate;
use crate::domain::trigger::{Trigger, is_empty_template, merge_triggers};
use crate::dto::pipeline_run::PipelineRun;
use crate::error::{Error, Result};
use crate::merge::Merge;
use crate::reconcile::Reconcile;
use crate::resolver::Resolver;

/// Extension key under which a serialized configuration travels with an event
pub const CONFIG_KEY: &str = "pipeline-config";

/// Data key holding the YAML document in a config-map-like source
pub const CONFIG_MAP_KEY: &str = "config.yaml";

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Configuration {
    /// Applied to every pipeline of every trigger
    #[serde(skip_serializing_if = "is_empty_template")]
    pub defaults: RunTemplate,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
}

/// A pipeline of the configuration, merged but not reconciled
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedPipeline {
    pub trigger: String,
    pub run: PipelineRun,
}

impl Configuration {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Decodes the configuration stored under `config.yaml` in a data map
    pub fn from_config_map(data: &BTreeMap<String, String>) -> Result<Self> {
        let yaml = data.get(CONFIG_MAP_KEY).ok_or(Error::ConfigNotFound)?;
        Self::from_yaml(yaml)
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Folds the three precedence layers of one pipeline into a scratch template
    fn merged_template(&self, trigger: &Trigger, pipeline: &RunTemplate) -> RunTemplate {
        let mut run = RunTemplate::default();
        run.merge_all([&self.defaults, &trigger.defaults, pipeline]);
        run
    }

    /// Resolves the configuration against one event
    ///
    /// Runs are returned in trigger order, then pipeline order within each
    /// trigger. Any failure aborts the whole event: no runs are returned if
    /// a single filter or reconciliation fails.
    ///
    /// # Errors
    /// - [`Error::Expression`] if a filter or field expression fails
    /// - [`Error::FilterType`] if a filter is not boolean
    pub fn pipeline_runs(
        &self,
        resolver: &dyn Resolver,
        ctx: &ResolutionContext,
    ) -> Result<Vec<PipelineRun>> {
        let mut runs = Vec::new();

        for trigger in &self.triggers {
            if !trigger.filter.matches(resolver, ctx)? {
                debug!("Trigger '{}' skipped", trigger.name);
                continue;
            }

            debug!(
                "Trigger '{}' matched with {} pipeline(s)",
                trigger.name,
                trigger.pipelines.len()
            );

            for pipeline in &trigger.pipelines {
                let mut template = self.merged_template(trigger, pipeline);
                template.reconcile(resolver, ctx)?;

                let run = template.into_pipeline_run();
                debug!("Materialized run '{}'", run.generate_name());
                runs.push(run);
            }
        }

        Ok(runs)
    }

    /// Materializes every pipeline of every trigger without filtering or
    /// reconciliation, for offline validation
    pub fn materialize_all(&self) -> Vec<MaterializedPipeline> {
        self.triggers
            .iter()
            .flat_map(|trigger| {
                trigger.pipelines.iter().map(move |pipeline| MaterializedPipeline {
                    trigger: trigger.name.clone(),
                    run: self.merged_template(trigger, pipeline).into_pipeline_run(),
                })
            })
            .collect()
    }
}

impl Merge for Configuration {
    fn merge(&mut self, other: &Self) {
        self.defaults.merge(&other.defaults);
        merge_triggers(&mut self.triggers, &other.triggers);
    }
}

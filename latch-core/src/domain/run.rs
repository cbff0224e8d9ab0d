//! Run templates
//!
//! A [`RunTemplate`] is a partial description of one pipeline run. Templates
//! from the global, trigger and pipeline layers are merged into a scratch
//! template, reconciled against the event, and materialized exactly once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::spec::{
    Param, PipelineRef, PipelineTaskRunSpec, TaskRunTemplate, Timeouts, WorkspaceBinding,
    merge_params, merge_task_run_specs, merge_workspaces,
};
use crate::dto::pipeline_run::{ObjectMeta, PipelineRun, PipelineRunSpec};
use crate::merge::{Merge, merge_map, merge_option, merge_string};

/// Labels and annotations of a run; every value may be an expression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Metadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty() && self.labels.is_empty() && self.annotations.is_empty()
    }
}

impl Merge for Metadata {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.namespace, &other.namespace);
        merge_map(&mut self.labels, &other.labels);
        merge_map(&mut self.annotations, &other.annotations);
    }
}

/// Partial, overridable description of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RunTemplate {
    /// Logical pipeline name, used when no pipeline reference names one
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<PipelineRef>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceBinding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<Timeouts>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_run_template: Option<TaskRunTemplate>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_run_specs: Vec<PipelineTaskRunSpec>,

    /// Initial run status, e.g. `PipelineRunPending`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
}

impl RunTemplate {
    /// Creates a template for the named pipeline
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Looks up a parameter by name
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Name used to derive the run's generated name
    ///
    /// A named pipeline reference takes priority over the template's own name.
    pub fn pipeline_name(&self) -> &str {
        match &self.pipeline_ref {
            Some(pipeline_ref) if !pipeline_ref.name.is_empty() => &pipeline_ref.name,
            _ => &self.name,
        }
    }

    /// Converts the template into a submission-ready run
    ///
    /// Performs no validation of the referenced pipeline. The template is
    /// consumed, so the run shares no state with it.
    pub fn into_pipeline_run(self) -> PipelineRun {
        let generate_name = format!("{}-run-", self.pipeline_name());

        let metadata = ObjectMeta {
            generate_name,
            namespace: self.metadata.namespace,
            labels: self.metadata.labels,
            annotations: self.metadata.annotations,
        };

        let spec = PipelineRunSpec {
            pipeline_ref: self.pipeline_ref,
            params: self.params,
            workspaces: self.workspaces,
            timeouts: self.timeouts,
            task_run_template: self.task_run_template,
            task_run_specs: self.task_run_specs,
            status: self.status,
        };

        PipelineRun::new(metadata, spec)
    }
}

impl Merge for RunTemplate {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.name, &other.name);
        self.metadata.merge(&other.metadata);
        merge_params(&mut self.params, &other.params);
        merge_option(&mut self.pipeline_ref, &other.pipeline_ref);
        merge_workspaces(&mut self.workspaces, &other.workspaces);
        merge_option(&mut self.timeouts, &other.timeouts);
        merge_option(&mut self.task_run_template, &other.task_run_template);
        merge_task_run_specs(&mut self.task_run_specs, &other.task_run_specs);
        merge_string(&mut self.status, &other.status);
    }
}

pub(crate) fn merge_pipelines(dst: &mut Vec<RunTemplate>, src: &[RunTemplate]) {
    crate::merge::merge_by_key(dst, src, |p| p.name.as_str());
}

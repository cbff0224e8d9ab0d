//! Materialized pipeline runs
//!
//! A [`PipelineRun`] is the final artifact of resolution. It has no setters:
//! once created it is only read, serialized, and handed to a submitter.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::spec::{
    Param, PipelineRef, PipelineTaskRunSpec, TaskRunTemplate, Timeouts, WorkspaceBinding,
};

/// API version stamped on every run
pub const API_VERSION: &str = "tekton.dev/v1";

/// Kind stamped on every run
pub const KIND: &str = "PipelineRun";

/// Object metadata of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Name prefix; the execution backend appends a unique suffix
    pub generate_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Fully resolved run spec
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<PipelineRef>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceBinding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<Timeouts>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_run_template: Option<TaskRunTemplate>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_run_specs: Vec<PipelineTaskRunSpec>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
}

/// Submission-ready pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    api_version: &'static str,
    kind: &'static str,
    metadata: ObjectMeta,
    spec: PipelineRunSpec,
}

impl PipelineRun {
    pub(crate) fn new(metadata: ObjectMeta, spec: PipelineRunSpec) -> Self {
        Self {
            api_version: API_VERSION,
            kind: KIND,
            metadata,
            spec,
        }
    }

    pub fn api_version(&self) -> &str {
        self.api_version
    }

    pub fn kind(&self) -> &str {
        self.kind
    }

    pub fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    pub fn spec(&self) -> &PipelineRunSpec {
        &self.spec
    }

    pub fn generate_name(&self) -> &str {
        &self.metadata.generate_name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Looks up a resolved parameter by name
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.spec.params.iter().find(|p| p.name == name)
    }

    /// Serializes the run as a YAML document
    pub fn to_yaml(&self) -> crate::error::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

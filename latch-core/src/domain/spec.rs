//! Run-spec field types
//!
//! These mirror the execution backend's pipeline run schema. They are carried
//! opaquely by the resolver: only parameters are reconciled, everything else
//! is merged and copied into the materialized run as-is.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::merge::{
    Merge, merge_by_key, merge_flag, merge_map, merge_opaque, merge_option, merge_replace,
    merge_string,
};

/// A named parameter passed to a pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub value: ParamValue,
}

impl Param {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ParamValue::String(value.into()),
        }
    }

    pub fn array<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            value: ParamValue::Array(values.into_iter().map(Into::into).collect()),
        }
    }
}

impl Merge for Param {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.name, &other.name);
        if !other.value.is_zero() {
            self.value = other.value.clone();
        }
    }
}

/// Parameter value: a single string or a list of strings
///
/// Unquoted numbers and booleans are accepted and kept as their text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Array(Vec<String>),
}

impl ParamValue {
    /// An empty string or an empty list
    pub fn is_zero(&self) -> bool {
        match self {
            ParamValue::String(s) => s.is_empty(),
            ParamValue::Array(values) => values.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            ParamValue::Array(_) => None,
        }
    }
}

fn scalar_text<E: de::Error>(value: JsonValue) -> Result<String, E> {
    match value {
        JsonValue::String(s) => Ok(s),
        JsonValue::Bool(b) => Ok(b.to_string()),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!(
            "expected a string, number or boolean param value, found {}",
            other
        ))),
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Array(items) => items
                .into_iter()
                .map(scalar_text)
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::Array),
            scalar => scalar_text(scalar).map(ParamValue::String),
        }
    }
}

impl Default for ParamValue {
    fn default() -> Self {
        ParamValue::String(String::new())
    }
}

pub(crate) fn merge_params(dst: &mut Vec<Param>, src: &[Param]) {
    merge_by_key(dst, src, |p| p.name.as_str());
}

/// Reference to the pipeline a run executes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineRef {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Remote resolver (e.g. `git`, `bundles`) used instead of an in-cluster name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resolver: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

impl PipelineRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Merge for PipelineRef {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.name, &other.name);
        merge_string(&mut self.resolver, &other.resolver);
        merge_params(&mut self.params, &other.params);
    }
}

/// Binds a pipeline workspace to a volume source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkspaceBinding {
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub sub_path: String,

    /// Full claim template, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_claim_template: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<ClaimSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMapSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretSource>,
}

impl Merge for WorkspaceBinding {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.name, &other.name);
        merge_string(&mut self.sub_path, &other.sub_path);
        merge_opaque(&mut self.volume_claim_template, &other.volume_claim_template);
        merge_option(&mut self.persistent_volume_claim, &other.persistent_volume_claim);
        merge_option(&mut self.empty_dir, &other.empty_dir);
        merge_option(&mut self.config_map, &other.config_map);
        merge_option(&mut self.secret, &other.secret);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ClaimSource {
    pub claim_name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl Merge for ClaimSource {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.claim_name, &other.claim_name);
        merge_flag(&mut self.read_only, other.read_only);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EmptyDirSource {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub medium: String,
}

impl Merge for EmptyDirSource {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.medium, &other.medium);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigMapSource {
    pub name: String,
}

impl Merge for ConfigMapSource {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.name, &other.name);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SecretSource {
    pub secret_name: String,
}

impl Merge for SecretSource {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.secret_name, &other.secret_name);
    }
}

pub(crate) fn merge_workspaces(dst: &mut Vec<WorkspaceBinding>, src: &[WorkspaceBinding]) {
    merge_by_key(dst, src, |w| w.name.as_str());
}

/// Run time limits, as duration strings such as `1h0m0s`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pipeline: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tasks: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub finally: String,
}

impl Merge for Timeouts {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.pipeline, &other.pipeline);
        merge_string(&mut self.tasks, &other.tasks);
        merge_string(&mut self.finally, &other.finally);
    }
}

/// Settings applied to every task run of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskRunTemplate {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplate>,
}

impl Merge for TaskRunTemplate {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.service_account_name, &other.service_account_name);
        merge_option(&mut self.pod_template, &other.pod_template);
    }
}

/// Per-task overrides, keyed by the pipeline task name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineTaskRunSpec {
    pub pipeline_task_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplate>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub timeout: String,
}

impl Merge for PipelineTaskRunSpec {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.pipeline_task_name, &other.pipeline_task_name);
        merge_string(&mut self.service_account_name, &other.service_account_name);
        merge_option(&mut self.pod_template, &other.pod_template);
        merge_string(&mut self.timeout, &other.timeout);
    }
}

pub(crate) fn merge_task_run_specs(dst: &mut Vec<PipelineTaskRunSpec>, src: &[PipelineTaskRunSpec]) {
    merge_by_key(dst, src, |s| s.pipeline_task_name.as_str());
}

/// Pod-level scheduling and environment settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PodTemplate {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub priority_class_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub scheduler_name: String,
}

impl Merge for PodTemplate {
    fn merge(&mut self, other: &Self) {
        merge_map(&mut self.node_selector, &other.node_selector);
        merge_by_key(&mut self.env, &other.env, |e| e.name.as_str());
        merge_replace(&mut self.tolerations, &other.tolerations);
        merge_by_key(&mut self.image_pull_secrets, &other.image_pull_secrets, |r| {
            r.name.as_str()
        });
        merge_string(&mut self.priority_class_name, &other.priority_class_name);
        merge_string(&mut self.scheduler_name, &other.scheduler_name);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvVar {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl Merge for EnvVar {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.name, &other.name);
        merge_string(&mut self.value, &other.value);
    }
}

/// Toleration entries have no identifying key and are replaced as a whole
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Toleration {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub operator: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalObjectReference {
    pub name: String,
}

impl Merge for LocalObjectReference {
    fn merge(&mut self, other: &Self) {
        merge_string(&mut self.name, &other.name);
    }
}

//! Read-only view of an inbound event
//!
//! Built once per event and shared by every expression evaluation made while
//! resolving that event. Nothing in the resolution engine mutates it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Event data that expressions are evaluated against
///
/// Exposed to expressions as the variables `header`, `body`, `extensions`
/// and `params`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionContext {
    /// HTTP headers, each with every value received
    #[serde(default)]
    pub header: BTreeMap<String, Vec<String>>,

    /// Decoded event payload
    #[serde(default)]
    pub body: Map<String, JsonValue>,

    /// Values carried forward by earlier processing stages
    #[serde(default)]
    pub extensions: Map<String, JsonValue>,

    /// Static parameters supplied by the trigger binding
    #[serde(default)]
    pub params: Map<String, JsonValue>,
}

impl ResolutionContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: Map<String, JsonValue>) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.header.insert(name.into(), values);
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

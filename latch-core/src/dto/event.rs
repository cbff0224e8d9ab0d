//! Interceptor request and response envelopes
//!
//! These mirror the JSON documents exchanged with the event listener: a
//! request carries the raw event plus whatever earlier interceptors attached
//! as extensions, and a response says whether processing continues.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

use crate::context::ResolutionContext;
use crate::domain::config::{CONFIG_KEY, Configuration};
use crate::error::{Error, Result};
use crate::merge::Merge;

/// Where an event came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerContext {
    pub event_url: String,
    pub event_id: String,
    pub trigger_id: String,
}

/// Inbound event as handed to an interceptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorRequest {
    /// Raw JSON payload
    pub body: String,
    pub header: BTreeMap<String, Vec<String>>,
    pub extensions: Map<String, JsonValue>,
    pub interceptor_params: Map<String, JsonValue>,
    pub context: Option<TriggerContext>,
}

impl InterceptorRequest {
    /// Decodes the raw body into a JSON object
    ///
    /// A `null` body decodes to an empty object.
    pub fn unmarshal_body(&self) -> Result<Map<String, JsonValue>> {
        match serde_json::from_str::<JsonValue>(&self.body)? {
            JsonValue::Object(body) => Ok(body),
            JsonValue::Null => Ok(Map::new()),
            other => Err(Error::MalformedInput(format!(
                "expected a JSON object body, found {}",
                other
            ))),
        }
    }

    /// Reads the configuration carried under the `pipeline-config` extension
    ///
    /// # Errors
    /// - [`Error::ConfigNotFound`] if the extension is absent
    /// - [`Error::ConfigMalformed`] if the extension is not a string
    /// - [`Error::MalformedInput`] if the string does not decode
    pub fn current_config(&self) -> Result<Configuration> {
        let value = self.extensions.get(CONFIG_KEY).ok_or(Error::ConfigNotFound)?;
        let json = value
            .as_str()
            .ok_or_else(|| Error::ConfigMalformed("expected a JSON string".to_string()))?;
        Configuration::from_json(json)
    }

    /// Merges `config` on top of the configuration carried by the event
    ///
    /// An absent extension, or one that is not a string, counts as empty.
    ///
    /// # Errors
    /// [`Error::MalformedInput`] if the carried configuration does not decode
    pub fn merge_config(&self, config: &Configuration) -> Result<Configuration> {
        let mut current = match self.current_config() {
            Ok(current) => current,
            Err(Error::ConfigNotFound | Error::ConfigMalformed(_)) => Configuration::default(),
            Err(err) => return Err(err),
        };
        current.merge(config);
        Ok(current)
    }

    /// Builds the expression context of this event
    pub fn resolution_context(&self) -> Result<ResolutionContext> {
        Ok(ResolutionContext {
            header: self.header.clone(),
            body: self.unmarshal_body()?,
            extensions: self.extensions.clone(),
            params: self.interceptor_params.clone(),
        })
    }

    pub fn event_id(&self) -> &str {
        self.context.as_ref().map_or("", |c| c.event_id.as_str())
    }

    pub fn trigger_id(&self) -> &str {
        self.context.as_ref().map_or("", |c| c.trigger_id.as_str())
    }
}

/// Outcome code of an interceptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    #[default]
    Ok,
    InvalidArgument,
    Internal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub code: StatusCode,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Interceptor verdict returned to the event listener
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorResponse {
    #[serde(rename = "continue")]
    pub proceed: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, JsonValue>,
    pub status: Status,
}

impl InterceptorResponse {
    /// Successful response; `proceed` says whether later interceptors run
    pub fn ok(proceed: bool) -> Self {
        Self {
            proceed,
            ..Self::default()
        }
    }

    /// Failed response; processing of the event stops
    pub fn fail(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            proceed: false,
            extensions: Map::new(),
            status: Status {
                code,
                message: message.into(),
            },
        }
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status.code == StatusCode::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::run::RunTemplate;
    use crate::domain::trigger::Trigger;
    use serde_json::json;

    fn request_with_config(config: JsonValue) -> InterceptorRequest {
        let mut request = InterceptorRequest {
            body: r#"{"ref":"refs/heads/main"}"#.to_string(),
            ..InterceptorRequest::default()
        };
        request.extensions.insert(CONFIG_KEY.to_string(), config);
        request
    }

    #[test]
    fn test_request_from_listener_json() {
        let request: InterceptorRequest = serde_json::from_value(json!({
            "body": "{\"action\":\"opened\"}",
            "header": {"X-GitHub-Event": ["pull_request"]},
            "interceptor_params": {"namespace": "ci"},
            "context": {"event_url": "http://listener", "event_id": "abc", "trigger_id": "t"}
        }))
        .unwrap();

        assert_eq!(request.event_id(), "abc");
        let ctx = request.resolution_context().unwrap();
        assert_eq!(ctx.body["action"], "opened");
        assert_eq!(ctx.header["X-GitHub-Event"], ["pull_request"]);
        assert_eq!(ctx.params["namespace"], "ci");
    }

    #[test]
    fn test_unmarshal_body_rejects_non_objects() {
        let request = InterceptorRequest {
            body: "[1, 2]".to_string(),
            ..InterceptorRequest::default()
        };
        assert!(matches!(request.unmarshal_body(), Err(Error::MalformedInput(_))));

        let request = InterceptorRequest {
            body: "{not json".to_string(),
            ..InterceptorRequest::default()
        };
        assert!(request.unmarshal_body().is_err());
    }

    #[test]
    fn test_current_config() {
        let request = InterceptorRequest::default();
        assert!(matches!(request.current_config(), Err(Error::ConfigNotFound)));

        let request = request_with_config(json!({"triggers": []}));
        assert!(matches!(request.current_config(), Err(Error::ConfigMalformed(_))));

        let request = request_with_config(json!(r#"{"triggers": 1}"#));
        assert!(matches!(request.current_config(), Err(Error::MalformedInput(_))));

        let request = request_with_config(json!(r#"{"triggers":[{"name":"t1"}]}"#));
        assert_eq!(request.current_config().unwrap().triggers[0].name, "t1");
    }

    #[test]
    fn test_merge_config_with_missing_current() {
        let base = Configuration::default()
            .with_trigger(Trigger::new("t1").with_pipeline(RunTemplate::named("build")));

        let merged = InterceptorRequest::default().merge_config(&base).unwrap();

        assert_eq!(merged, base);
    }

    #[test]
    fn test_merge_config_ignores_non_string_current() {
        let request = request_with_config(json!({"triggers": []}));
        let base = Configuration::default().with_trigger(Trigger::new("t1"));

        assert_eq!(request.merge_config(&base).unwrap(), base);
    }

    #[test]
    fn test_merge_config_rejects_undecodable_current() {
        let request = request_with_config(json!(r#"{"triggers": 1}"#));

        let err = request.merge_config(&Configuration::default()).unwrap_err();

        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_merge_config_layers_fetched_on_top() {
        let request = request_with_config(json!(
            r#"{"triggers":[{"name":"t1","filter":"body.a","pipelines":[{"name":"lint"}]}]}"#
        ));
        let fetched = Configuration::default()
            .with_trigger(Trigger::new("t1").with_pipeline(RunTemplate::named("build")));

        let merged = request.merge_config(&fetched).unwrap();

        assert_eq!(merged.triggers.len(), 1);
        assert_eq!(merged.triggers[0].filter.as_str(), "body.a");
        assert_eq!(merged.triggers[0].pipelines.len(), 2);
    }

    #[test]
    fn test_response_serialization() {
        let response = InterceptorResponse::ok(true).with_extension(CONFIG_KEY, json!("{}"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["continue"], true);
        assert_eq!(value["status"]["code"], "OK");

        let failed = InterceptorResponse::fail(StatusCode::InvalidArgument, "bad");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["continue"], false);
        assert_eq!(value["status"]["code"], "INVALID_ARGUMENT");
        assert!(!failed.is_ok());
    }
}

//! Config-merge interceptor
//!
//! Looks up the base configuration named by the trigger binding, layers it
//! over whatever configuration the event already carries, and forwards the
//! result to the next interceptor as the `pipeline-config` extension.

use async_trait::async_trait;
use latch_core::{
    CONFIG_KEY, Error, InterceptorRequest, InterceptorResponse, ResolutionContext, Resolver,
    StatusCode, format_value,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info};

use super::{Interceptor, request_id};
use crate::store::ConfigStore;

const NAMESPACE_PARAM: &str = "namespace";
const NAME_PARAM: &str = "name";

pub struct ConfigMergeInterceptor {
    store: Arc<dyn ConfigStore>,
    resolver: Arc<dyn Resolver>,
}

impl ConfigMergeInterceptor {
    pub fn new(store: Arc<dyn ConfigStore>, resolver: Arc<dyn Resolver>) -> Self {
        Self { store, resolver }
    }

    /// Reads an interceptor parameter, which may itself be an expression
    fn find_param(&self, ctx: &ResolutionContext, name: &str) -> latch_core::Result<String> {
        let reference = ctx
            .params
            .get(name)
            .ok_or_else(|| Error::ParamNotFound(name.to_string()))?;
        Ok(self
            .resolver
            .resolve_string(ctx, &format_value(reference))?)
    }
}

#[async_trait]
impl Interceptor for ConfigMergeInterceptor {
    async fn process(&self, request: &InterceptorRequest) -> InterceptorResponse {
        let request_id = request_id(request);

        let ctx = match request.resolution_context() {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to unmarshal request body");
                return InterceptorResponse::fail(
                    StatusCode::InvalidArgument,
                    "Request body is malformed",
                );
            }
        };

        let namespace = match self.find_param(&ctx, NAMESPACE_PARAM) {
            Ok(namespace) => namespace,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to get `namespace` parameter");
                return InterceptorResponse::fail(
                    StatusCode::InvalidArgument,
                    "`namespace` parameter is required",
                );
            }
        };

        let name = match self.find_param(&ctx, NAME_PARAM) {
            Ok(name) => name,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to get `name` parameter");
                return InterceptorResponse::fail(
                    StatusCode::InvalidArgument,
                    "`name` parameter is required",
                );
            }
        };

        let fetched = match self.store.get(&namespace, &name).await {
            Ok(config) => config,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to fetch config");
                return InterceptorResponse::fail(StatusCode::Internal, "Unable to fetch config");
            }
        };

        let merged = match request.merge_config(&fetched) {
            Ok(merged) => merged,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to merge config");
                return InterceptorResponse::fail(StatusCode::Internal, "Unable to merge config");
            }
        };
        let json = match merged.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to marshal config");
                return InterceptorResponse::fail(StatusCode::Internal, "Unable to marshal config");
            }
        };

        info!(request_id = %request_id, namespace = %namespace, name = %name, "Interceptor merged config");
        InterceptorResponse::ok(true).with_extension(CONFIG_KEY, JsonValue::String(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryConfigStore;
    use latch_core::{Configuration, RunTemplate, Trigger};
    use latch_lua::LuaResolver;
    use serde_json::json;

    async fn interceptor() -> ConfigMergeInterceptor {
        let store = InMemoryConfigStore::new(4);
        store
            .insert(
                "ci",
                "api-config",
                Configuration::default()
                    .with_trigger(Trigger::new("t1").with_pipeline(RunTemplate::named("build"))),
            )
            .await;
        ConfigMergeInterceptor::new(Arc::new(store), Arc::new(LuaResolver::new()))
    }

    fn request(params: JsonValue) -> InterceptorRequest {
        InterceptorRequest {
            body: r#"{"repository":{"name":"api"}}"#.to_string(),
            interceptor_params: params.as_object().cloned().unwrap_or_default(),
            ..InterceptorRequest::default()
        }
    }

    #[tokio::test]
    async fn test_merges_fetched_config() {
        let response = interceptor()
            .await
            .process(&request(json!({"namespace": "ci", "name": "api-config"})))
            .await;

        assert!(response.proceed);
        assert!(response.is_ok());

        let forwarded = InterceptorRequest {
            extensions: response.extensions,
            ..InterceptorRequest::default()
        };
        let config = forwarded.current_config().unwrap();
        assert_eq!(config.triggers[0].pipelines[0].name, "build");
    }

    #[tokio::test]
    async fn test_params_may_be_expressions() {
        let params = json!({
            "namespace": "ci",
            "name": r#"body.repository.name .. "-config""#,
        });

        let response = interceptor().await.process(&request(params)).await;

        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_missing_param_is_invalid_argument() {
        let response = interceptor()
            .await
            .process(&request(json!({"namespace": "ci"})))
            .await;

        assert!(!response.proceed);
        assert_eq!(response.status.code, StatusCode::InvalidArgument);
        assert_eq!(response.status.message, "`name` parameter is required");
    }

    #[tokio::test]
    async fn test_unknown_config_is_internal() {
        let response = interceptor()
            .await
            .process(&request(json!({"namespace": "ci", "name": "missing"})))
            .await;

        assert_eq!(response.status.code, StatusCode::Internal);
    }

    #[tokio::test]
    async fn test_undecodable_carried_config_is_internal() {
        let mut carried = request(json!({"namespace": "ci", "name": "api-config"}));
        carried
            .extensions
            .insert(CONFIG_KEY.to_string(), json!(r#"{"triggers": 1}"#));

        let response = interceptor().await.process(&carried).await;

        assert!(!response.proceed);
        assert_eq!(response.status.code, StatusCode::Internal);
        assert_eq!(response.status.message, "Unable to merge config");
        assert!(response.extensions.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut bad = request(json!({"namespace": "ci", "name": "api-config"}));
        bad.body = "not json".to_string();

        let response = interceptor().await.process(&bad).await;

        assert_eq!(response.status.code, StatusCode::InvalidArgument);
    }
}

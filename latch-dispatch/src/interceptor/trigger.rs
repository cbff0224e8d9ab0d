//! Pipeline-trigger interceptor
//!
//! Terminal interceptor: resolves the configuration carried by the event
//! into pipeline runs and submits them. Nothing is submitted unless the
//! whole event resolves.

use async_trait::async_trait;
use latch_core::{Configuration, Engine, InterceptorRequest, InterceptorResponse, StatusCode};
use tracing::{error, info};

use super::{Interceptor, request_id};
use crate::submit::Dispatcher;

pub struct PipelineTriggerInterceptor {
    engine: Engine,
    dispatcher: Dispatcher,
    base: Option<Configuration>,
}

impl PipelineTriggerInterceptor {
    pub fn new(engine: Engine, dispatcher: Dispatcher) -> Self {
        Self {
            engine,
            dispatcher,
            base: None,
        }
    }

    /// Resolves events against `base`, with the event's configuration as override
    pub fn with_base(mut self, base: Configuration) -> Self {
        self.base = Some(base);
        self
    }
}

#[async_trait]
impl Interceptor for PipelineTriggerInterceptor {
    async fn process(&self, request: &InterceptorRequest) -> InterceptorResponse {
        let request_id = request_id(request);

        let ctx = match request.resolution_context() {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to unmarshal request");
                return InterceptorResponse::fail(StatusCode::Internal, "Request body is malformed");
            }
        };

        let config = match self.engine.effective_config(self.base.as_ref(), request) {
            Ok(config) => config,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to get current config");
                return InterceptorResponse::fail(
                    StatusCode::InvalidArgument,
                    "Unable to get current config",
                );
            }
        };

        let runs = match self.engine.resolve(&config, &ctx) {
            Ok(runs) => runs,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Interceptor failed to get pipeline runs from config");
                return InterceptorResponse::fail(
                    StatusCode::Internal,
                    "Unable to get pipeline runs from config",
                );
            }
        };

        let total = runs.len();
        if let Err(e) = self.dispatcher.dispatch(runs).await {
            error!(request_id = %request_id, error = %e, "Interceptor failed to trigger pipeline runs");
            return InterceptorResponse::fail(StatusCode::Internal, "Unable to trigger pipeline runs");
        }

        info!(
            request_id = %request_id,
            trigger_id = request.trigger_id(),
            runs = total,
            "Interceptor triggered pipeline runs"
        );
        InterceptorResponse::ok(false)
    }
}

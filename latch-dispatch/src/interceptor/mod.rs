//! Event interceptors
//!
//! An interceptor receives an event envelope from the listener and answers
//! with a verdict. Failures never escape as errors: they are reported in the
//! response status, and the listener stops processing the event.

mod config;
mod trigger;

pub use config::ConfigMergeInterceptor;
pub use trigger::PipelineTriggerInterceptor;

use async_trait::async_trait;
use latch_core::{InterceptorRequest, InterceptorResponse};
use uuid::Uuid;

#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn process(&self, request: &InterceptorRequest) -> InterceptorResponse;
}

/// Identifier used to correlate the log lines of one request
fn request_id(request: &InterceptorRequest) -> String {
    match request.event_id() {
        "" => Uuid::new_v4().to_string(),
        id => id.to_string(),
    }
}

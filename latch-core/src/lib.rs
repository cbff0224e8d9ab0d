//! Latch Core
//!
//! Resolution engine that turns layered pipeline configuration and an
//! inbound event into submission-ready pipeline runs.
//!
//! This crate contains:
//! - Domain types: the configuration model (Configuration, Trigger, RunTemplate)
//! - DTOs: interceptor envelopes and materialized pipeline runs
//! - Merge, reconcile and resolver abstractions shared by every engine

pub mod context;
pub mod domain;
pub mod dto;
pub mod engine;
pub mod error;
pub mod merge;
pub mod reconcile;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use context::ResolutionContext;
pub use domain::config::{CONFIG_KEY, Configuration, MaterializedPipeline};
pub use domain::run::{Metadata, RunTemplate};
pub use domain::spec::{Param, ParamValue, PipelineRef, WorkspaceBinding};
pub use domain::trigger::{Trigger, TriggerFilter};
pub use dto::event::{InterceptorRequest, InterceptorResponse, Status, StatusCode};
pub use dto::pipeline_run::PipelineRun;
pub use engine::Engine;
pub use error::{Error, ResolveError, Result};
pub use merge::Merge;
pub use reconcile::Reconcile;
pub use resolver::{Resolver, format_value};

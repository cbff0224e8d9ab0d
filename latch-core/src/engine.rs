//! Per-event resolution entry point

use std::sync::Arc;
use tracing::{debug, info};

use crate::context::ResolutionContext;
use crate::domain::config::Configuration;
use crate::dto::event::InterceptorRequest;
use crate::dto::pipeline_run::PipelineRun;
use crate::error::{Error, Result};
use crate::merge::Merge;
use crate::resolver::Resolver;

/// Resolves events into pipeline runs
///
/// Holds no per-event state, so one engine can serve concurrent events.
#[derive(Clone)]
pub struct Engine {
    resolver: Arc<dyn Resolver>,
}

impl Engine {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// Computes the configuration that applies to an event
    ///
    /// The override carried by the event is merged onto a clone of `base`.
    /// Without a base, the carried configuration is required.
    ///
    /// # Errors
    /// - [`Error::ConfigNotFound`] if there is neither a base nor an override
    /// - [`Error::ConfigMalformed`] if the carried override is not a string
    /// - [`Error::MalformedInput`] if the carried override does not decode
    pub fn effective_config(
        &self,
        base: Option<&Configuration>,
        request: &InterceptorRequest,
    ) -> Result<Configuration> {
        match (base, request.current_config()) {
            (Some(base), Ok(layer)) => {
                let mut config = base.clone();
                config.merge(&layer);
                Ok(config)
            }
            (Some(base), Err(Error::ConfigNotFound)) => Ok(base.clone()),
            (_, Err(err)) => Err(err),
            (None, Ok(config)) => Ok(config),
        }
    }

    /// Resolves a configuration against an already decoded event
    pub fn resolve(
        &self,
        config: &Configuration,
        ctx: &ResolutionContext,
    ) -> Result<Vec<PipelineRun>> {
        let runs = config.pipeline_runs(self.resolver(), ctx)?;
        debug!("Resolved {} run(s)", runs.len());
        Ok(runs)
    }

    /// Decodes an event and resolves it to the runs it should start
    ///
    /// Either every run of the event is returned, or an error and none.
    pub fn resolve_request(
        &self,
        base: Option<&Configuration>,
        request: &InterceptorRequest,
    ) -> Result<Vec<PipelineRun>> {
        let ctx = request.resolution_context()?;
        let config = self.effective_config(base, request)?;
        let runs = self.resolve(&config, &ctx)?;

        info!(
            event_id = request.event_id(),
            trigger_id = request.trigger_id(),
            runs = runs.len(),
            "Event resolved"
        );

        Ok(runs)
    }
}

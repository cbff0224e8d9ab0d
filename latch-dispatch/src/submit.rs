//! Pipeline run submission
//!
//! A [`Submitter`] hands one run to an execution backend. The [`Dispatcher`]
//! fans a batch of runs out to a submitter with bounded parallelism and
//! reports every failure, without rolling back runs that were accepted.

use async_trait::async_trait;
use latch_core::PipelineRun;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DispatchError, Result};

/// Creates pipeline runs on an execution backend
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submits a single run
    ///
    /// # Errors
    /// [`DispatchError::Submit`] if the backend rejects the run
    async fn submit(&self, run: PipelineRun) -> Result<()>;
}

/// Bounded-parallelism batch submission
#[derive(Clone)]
pub struct Dispatcher {
    submitter: Arc<dyn Submitter>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(submitter: Arc<dyn Submitter>, config: &Config) -> Self {
        Self {
            submitter,
            permits: Arc::new(Semaphore::new(config.max_parallel_submissions)),
            timeout: config.submission_timeout,
        }
    }

    /// Submits every run, returning how many were accepted
    ///
    /// # Errors
    /// [`DispatchError::Submission`] listing every failed run, if any failed
    pub async fn dispatch(&self, runs: Vec<PipelineRun>) -> Result<usize> {
        let mut tasks = JoinSet::new();

        for run in runs {
            let submitter = self.submitter.clone();
            let permits = self.permits.clone();
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| DispatchError::Task(e.to_string()))?;

                let name = run.generate_name().to_string();
                info!(
                    namespace = run.namespace(),
                    generate_name = %name,
                    labels = ?run.metadata().labels,
                    "Submitting pipeline run"
                );

                match tokio::time::timeout(timeout, submitter.submit(run)).await {
                    Ok(result) => result,
                    Err(_) => Err(DispatchError::Timeout(name)),
                }
            });
        }

        let mut submitted = 0;
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => submitted += 1,
                Ok(Err(err)) => {
                    warn!("Submission failed: {}", err);
                    failures.push(err);
                }
                Err(err) => {
                    warn!("Submission task failed: {}", err);
                    failures.push(DispatchError::Task(err.to_string()));
                }
            }
        }

        if failures.is_empty() {
            Ok(submitted)
        } else {
            Err(DispatchError::Submission {
                failures,
                submitted,
            })
        }
    }
}

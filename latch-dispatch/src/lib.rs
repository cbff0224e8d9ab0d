//! Latch Dispatch
//!
//! The service layer around the resolution engine: interceptors that receive
//! events from a listener, a store of named base configurations, and the
//! dispatcher that submits resolved runs to an execution backend.
//!
//! Architecture:
//! - Configuration: submission parallelism, cache size and timeouts
//! - Store: named base configurations, bounded in memory
//! - Submission: `Submitter` trait and the bounded-parallelism `Dispatcher`
//! - Interceptors: config merging and pipeline triggering

pub mod config;
pub mod error;
pub mod interceptor;
pub mod store;
pub mod submit;

pub use config::Config;
pub use error::{DispatchError, Result};
pub use interceptor::{ConfigMergeInterceptor, Interceptor, PipelineTriggerInterceptor};
pub use store::{ConfigStore, InMemoryConfigStore};
pub use submit::{Dispatcher, Submitter};

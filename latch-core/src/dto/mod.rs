//! Data transfer objects
//!
//! Documents exchanged with the outside world: inbound interceptor envelopes
//! and the pipeline runs handed to an execution backend.

pub mod event;
pub mod pipeline_run;

//! Configuration model
//!
//! The layered documents that describe which pipelines run for which events.

pub mod config;
pub mod run;
pub mod spec;
pub mod trigger;

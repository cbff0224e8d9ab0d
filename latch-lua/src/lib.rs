//! Latch Lua Expressions
//!
//! This crate provides the Lua expression engine used to resolve pipeline
//! configuration against events. It includes:
//! - A restricted sandbox with no I/O or code loading
//! - Module trait and registry for expression helpers
//! - Core helper modules (`has`, `null`, `strings`)
//! - `LuaResolver`, the implementation of the core `Resolver` trait
//! - Stub generation for editor support

pub mod module;
pub mod modules;
pub mod resolver;
pub mod sandbox;

pub use module::{ExpressionModule, ModuleRegistry};
pub use modules::{EventModule, StringsModule};
pub use resolver::{LuaResolver, default_modules};
pub use sandbox::create_sandbox;

//! Local event resolution
//!
//! Runs the resolution engine against a recorded interceptor request, the
//! same way the trigger interceptor would, and prints the resulting runs as
//! a YAML stream instead of submitting them.

use anyhow::{Context, Result};
use colored::Colorize;
use latch_core::Engine;
use latch_lua::LuaResolver;
use std::path::Path;
use std::sync::Arc;

use crate::config::{load_layered, load_request};

/// Handle the resolve command
pub fn handle_resolve(config: &Path, overlay: Option<&Path>, event: &Path) -> Result<()> {
    let config = load_layered(config, overlay)?;
    let request = load_request(event)?;

    let engine = Engine::new(Arc::new(LuaResolver::new()));
    let runs = engine
        .resolve_request(Some(&config), &request)
        .context("Failed to resolve event")?;

    if runs.is_empty() {
        eprintln!("{}", "No trigger matched the event".yellow());
        return Ok(());
    }

    for run in &runs {
        print!("---\n{}", run.to_yaml()?);
    }
    eprintln!(
        "{} {} pipeline run(s)",
        "✓ Resolved".green().bold(),
        runs.len()
    );

    Ok(())
}

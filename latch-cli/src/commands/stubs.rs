//! Editor stub generation
//!
//! Expressions are Lua, so a Lua language server can complete the globals
//! they see if it is given stub definitions for them.

use anyhow::{Context, Result};
use colored::Colorize;
use latch_lua::LuaResolver;
use std::fs;
use std::path::Path;

/// Handle the stubs command
pub fn handle_stubs(output: Option<&Path>) -> Result<()> {
    let stubs = LuaResolver::new().stubs();

    let Some(path) = output else {
        print!("{}", stubs);
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(path, stubs).with_context(|| format!("Failed to write stubs to {:?}", path))?;

    println!(
        "{} {}",
        "✓ Stubs written to".green().bold(),
        path.display().to_string().cyan()
    );
    Ok(())
}

//! Offline configuration validation
//!
//! Merges a local configuration onto a default one and materializes every
//! pipeline without evaluating any expression, reporting structural problems
//! per run.

use anyhow::{Result, bail};
use colored::Colorize;
use latch_core::{PipelineRun, WorkspaceBinding};
use std::path::Path;

use crate::config::load_layered;

/// Handle the validate command
pub fn handle_validate(default: &Path, local: &Path, verbose: bool) -> Result<()> {
    let config = load_layered(default, Some(local))?;
    let pipelines = config.materialize_all();
    tracing::debug!("Validating {} pipeline(s)", pipelines.len());

    let mut failed = false;
    for pipeline in &pipelines {
        let problems = check_run(&pipeline.run);
        let name = pipeline.run.generate_name();

        if problems.is_empty() {
            println!("Pipeline {}: {}", name.cyan(), "Valid".green().bold());
        } else {
            failed = true;
            println!(
                "Pipeline {} (trigger {}): {}",
                name.cyan(),
                pipeline.trigger,
                "Failed".red().bold()
            );
            for problem in &problems {
                println!("  {} {}", "-".red(), problem);
            }
        }

        if verbose {
            println!("---\n{}", pipeline.run.to_yaml()?);
        }
    }

    if failed {
        bail!("Pipelines validation failed.");
    }

    println!("{}", "✓ All pipelines are valid".green().bold());
    Ok(())
}

/// Lists the structural problems of a materialized run
fn check_run(run: &PipelineRun) -> Vec<String> {
    let mut problems = Vec::new();

    if run.generate_name() == "-run-" {
        problems.push("pipeline has neither a name nor a pipelineRef".to_string());
    }

    let spec = run.spec();
    if let Some(pipeline_ref) = &spec.pipeline_ref {
        if pipeline_ref.name.is_empty() && pipeline_ref.resolver.is_empty() {
            problems.push("pipelineRef needs a name or a resolver".to_string());
        }
    }

    if spec.params.iter().any(|p| p.name.is_empty()) {
        problems.push("param without a name".to_string());
    }

    for workspace in &spec.workspaces {
        let label = if workspace.name.is_empty() {
            problems.push("workspace without a name".to_string());
            "<unnamed>"
        } else {
            workspace.name.as_str()
        };

        match volume_sources(workspace) {
            1 => {}
            0 => problems.push(format!("workspace '{}' has no volume source", label)),
            n => problems.push(format!("workspace '{}' has {} volume sources", label, n)),
        }
    }

    problems
}

fn volume_sources(workspace: &WorkspaceBinding) -> usize {
    [
        workspace.volume_claim_template.is_some(),
        workspace.persistent_volume_claim.is_some(),
        workspace.empty_dir.is_some(),
        workspace.config_map.is_some(),
        workspace.secret.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count()
}

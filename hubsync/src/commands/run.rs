//! `hubsync run`: orchestrated multi-repository sync.

use std::sync::Arc;

use anyhow::{bail, Result};
use dialoguer::Confirm;

use hubsync_engine::{DockerCli, MirrorConfig};
use hubsync_orchestrator::{run_sync, OrchestratorConfig};

pub async fn run(
    config: &MirrorConfig,
    repos: Vec<String>,
    image: Option<String>,
    concurrency: Option<usize>,
    yes: bool,
) -> Result<()> {
    let orchestrator = OrchestratorConfig {
        worker_image: image.unwrap_or_else(|| config.worker_image.clone()),
        concurrency: concurrency.unwrap_or(config.concurrency),
        data_dir: config.data_dir.clone(),
    };

    if !yes {
        let prompt = format!(
            "Launch up to {} concurrent privileged worker containers from {}?",
            orchestrator.concurrency, orchestrator.worker_image
        );
        if !Confirm::new().with_prompt(prompt).interact()? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let engine = Arc::new(DockerCli::new()?);
    let outcomes = run_sync(engine, orchestrator, repos).await?;

    let failed: Vec<_> = outcomes.iter().filter(|o| o.is_failure()).collect();
    println!(
        "Sync finished: {} repositories, {} failed",
        outcomes.len(),
        failed.len()
    );
    for outcome in &failed {
        println!("  failed {}: {:?}", outcome.repo, outcome.status);
    }

    if !failed.is_empty() {
        bail!("{} repository syncs failed", failed.len());
    }
    Ok(())
}

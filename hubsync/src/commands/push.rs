//! `hubsync push`: push phase for one repository.

use std::path::Path;

use anyhow::{anyhow, Result};

use hubsync_engine::{push_phase, DockerCli, MirrorConfig};

pub async fn run(config: &MirrorConfig, dat_dir: &Path, profile_name: &str) -> Result<()> {
    let profile = config.profile(profile_name).ok_or_else(|| {
        anyhow!(
            "destination profile {profile_name:?} is not configured (known: {})",
            config
                .profiles
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    let engine = DockerCli::new()?;
    let report = push_phase(&engine, dat_dir, &config.policy, profile).await?;

    println!(
        "Push phase done: {} pushed, {} skipped",
        report.succeeded.len(),
        report.skipped.len()
    );
    for skip in &report.skipped {
        println!("  skipped {} ({})", skip.reference, skip.reason);
    }
    Ok(())
}

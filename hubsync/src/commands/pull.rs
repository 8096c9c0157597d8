//! `hubsync pull`: pull phase for one repository.

use std::path::Path;

use anyhow::Result;

use hubsync_engine::{pull_phase, DockerCli, MirrorConfig};

pub async fn run(config: &MirrorConfig, dat_dir: &Path) -> Result<()> {
    let engine = DockerCli::new()?;
    let report = pull_phase(&engine, dat_dir, &config.policy).await?;

    println!(
        "Pull phase done: {} pulled, {} skipped",
        report.succeeded.len(),
        report.skipped.len()
    );
    for skip in &report.skipped {
        println!("  skipped {} ({})", skip.reference, skip.reason);
    }
    Ok(())
}

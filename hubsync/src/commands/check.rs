//! `hubsync check`: reconciliation report over the progress ledger.
//!
//! A completed run's summary is the skip lists (tags needing manual
//! attention) plus any tag with no recorded outcome at all, which indicates
//! an interrupted run or a bug. Ledger corruption (foreign or duplicate
//! outcome references) is reported and makes the command fail; the ledger is
//! never repaired automatically.

use std::fs;

use anyhow::{bail, Context, Result};

use hubsync_core::HubSyncError;
use hubsync_engine::{status, MirrorConfig};

pub fn run(config: &MirrorConfig, repo: Option<String>) -> Result<()> {
    let repos = match repo {
        Some(repo) => vec![repo],
        None => cached_repos(config)?,
    };

    let mut stuck_total = 0usize;
    let mut violation_total = 0usize;
    for repo in &repos {
        let dat_dir = hubsync_catalog::repo_dat_dir(&config.data_dir, repo);
        let state = match status(&dat_dir) {
            Ok(state) => state,
            Err(HubSyncError::NotFound(_)) => {
                println!("{repo}: no tag list yet (run init first)");
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("cannot read ledger for {repo}")),
        };

        println!(
            "{repo}: {} tags, {} pulled, {} pull-skipped, {} pushed, {} push-skipped",
            state.tags.len(),
            state.pulled.len(),
            state.pull_skips.len(),
            state.pushed.len(),
            state.push_skips.len()
        );
        for tag in &state.pull_skips {
            println!("  pull skipped: {tag}");
        }
        for tag in &state.push_skips {
            println!("  push skipped: {tag}");
        }
        for tag in &state.pull_remaining {
            println!("  STUCK (no pull outcome): {tag}");
        }
        for tag in &state.push_remaining {
            println!("  STUCK (no push outcome): {tag}");
        }
        if let Some(violation) = &state.pull_violation {
            println!("  LEDGER VIOLATION (pull): {violation}");
        }
        if let Some(violation) = &state.push_violation {
            println!("  LEDGER VIOLATION (push): {violation}");
        }
        stuck_total += state.pull_remaining.len() + state.push_remaining.len();
        violation_total +=
            state.pull_violation.iter().count() + state.push_violation.iter().count();
    }

    if stuck_total > 0 {
        println!("{stuck_total} tags have no recorded outcome; re-run the affected phases");
    }
    if violation_total > 0 {
        bail!("{violation_total} ledger violations found; the ledger is never repaired automatically");
    }
    Ok(())
}

fn cached_repos(config: &MirrorConfig) -> Result<Vec<String>> {
    let repos_dir = config.data_dir.join("repos");
    let entries = fs::read_dir(&repos_dir)
        .with_context(|| format!("catalog cache at {} is unreadable", repos_dir.display()))?;

    let mut repos = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            repos.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    repos.sort();
    Ok(repos)
}

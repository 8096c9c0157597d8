//! Phase drivers: wire the pull/push engines to the progress ledger.
//!
//! Each driver reconciles the intended set against the recorded outcomes,
//! runs its engine over the remainder only, and rewrites the ledger files as
//! complete sequences. Re-running a completed phase does no engine work.

use std::path::Path;

use tracing::info;

use hubsync_core::error::Result;
use hubsync_core::ledger::{self, LedgerPaths};

use crate::config::{DestinationProfile, SyncPolicy};
use crate::docker::ContainerEngine;
use crate::outcome::PhaseReport;
use crate::{pull, push};

/// Run the pull phase for one repository's `dat` directory.
///
/// The intended set (`tags.txt`) must exist; the outcome files are created
/// as needed. Returns the work done by *this* run (resumes return less).
pub async fn pull_phase<E: ContainerEngine>(
    engine: &E,
    dat_dir: &Path,
    policy: &SyncPolicy,
) -> Result<PhaseReport> {
    let paths = LedgerPaths::new(dat_dir);
    let tags = ledger::load(&paths.tags)?;
    let pulled = ledger::load_or_default(&paths.pulled)?;
    let skipped = ledger::load_or_default(&paths.pull_skips)?;

    let remaining = ledger::reconcile(&tags, &pulled, &skipped);
    if remaining.is_empty() {
        info!(dat_dir = %dat_dir.display(), "pull phase already complete");
        ledger::verify_phase(&tags, &pulled, &skipped)?;
        return Ok(PhaseReport::default());
    }

    info!(
        total = tags.len(),
        remaining = remaining.len(),
        "pull phase starting"
    );
    let report = pull::pull(engine, &remaining, policy).await;

    let mut new_pulled = pulled;
    new_pulled.extend(report.succeeded.iter().cloned());
    let mut new_skipped = skipped;
    new_skipped.extend(report.skipped_references());

    ledger::write(&paths.pulled, &new_pulled)?;
    ledger::write(&paths.pull_skips, &new_skipped)?;
    ledger::verify_phase(&tags, &new_pulled, &new_skipped)?;

    info!(
        pulled = report.succeeded.len(),
        skipped = report.skipped.len(),
        "pull phase finished"
    );
    Ok(report)
}

/// Run the push phase for one repository's `dat` directory.
///
/// The intended set is the pull phase's success ledger; its absence means
/// there is nothing to push yet.
pub async fn push_phase<E: ContainerEngine>(
    engine: &E,
    dat_dir: &Path,
    policy: &SyncPolicy,
    profile: &DestinationProfile,
) -> Result<PhaseReport> {
    let paths = LedgerPaths::new(dat_dir);
    let pulled = ledger::load_or_default(&paths.pulled)?;
    if pulled.is_empty() {
        info!(dat_dir = %dat_dir.display(), "nothing pulled yet, skipping push phase");
        return Ok(PhaseReport::default());
    }

    let pushed = ledger::load_or_default(&paths.pushed)?;
    let skipped = ledger::load_or_default(&paths.push_skips)?;

    let remaining = ledger::reconcile(&pulled, &pushed, &skipped);
    if remaining.is_empty() {
        info!(dat_dir = %dat_dir.display(), "push phase already complete");
        ledger::verify_phase(&pulled, &pushed, &skipped)?;
        return Ok(PhaseReport::default());
    }

    info!(
        total = pulled.len(),
        remaining = remaining.len(),
        profile = %profile.name,
        "push phase starting"
    );
    let report = push::push(engine, &remaining, policy, profile).await?;

    let mut new_pushed = pushed;
    new_pushed.extend(report.succeeded.iter().cloned());
    let mut new_skipped = skipped;
    new_skipped.extend(report.skipped_references());

    ledger::write(&paths.pushed, &new_pushed)?;
    ledger::write(&paths.push_skips, &new_skipped)?;
    ledger::verify_phase(&pulled, &new_pushed, &new_skipped)?;

    info!(
        pushed = report.succeeded.len(),
        skipped = report.skipped.len(),
        "push phase finished"
    );
    Ok(report)
}

/// Reconciliation snapshot of one repository's ledger.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    pub tags: Vec<String>,
    pub pulled: Vec<String>,
    pub pull_skips: Vec<String>,
    pub pushed: Vec<String>,
    pub push_skips: Vec<String>,
    /// Tags with no pull outcome yet ("stuck" if the phase claimed to finish).
    pub pull_remaining: Vec<String>,
    /// Pulled tags with no push outcome yet.
    pub push_remaining: Vec<String>,
    /// Corruption detected in the pull outcome files (foreign or duplicate
    /// references). Reported, never repaired.
    pub pull_violation: Option<String>,
    /// Corruption detected in the push outcome files.
    pub push_violation: Option<String>,
}

impl SyncStatus {
    pub fn is_complete(&self) -> bool {
        self.pull_remaining.is_empty()
            && self.push_remaining.is_empty()
            && self.pull_violation.is_none()
            && self.push_violation.is_none()
    }
}

/// Read the ledger and report remaining work and any corruption, without
/// touching the engine.
pub fn status(dat_dir: &Path) -> Result<SyncStatus> {
    let paths = LedgerPaths::new(dat_dir);
    let tags = ledger::load(&paths.tags)?;
    let pulled = ledger::load_or_default(&paths.pulled)?;
    let pull_skips = ledger::load_or_default(&paths.pull_skips)?;
    let pushed = ledger::load_or_default(&paths.pushed)?;
    let push_skips = ledger::load_or_default(&paths.push_skips)?;

    let pull_remaining = ledger::reconcile(&tags, &pulled, &pull_skips);
    let push_remaining = ledger::reconcile(&pulled, &pushed, &push_skips);

    let pull_violation = ledger::audit_phase(&tags, &pulled, &pull_skips)
        .err()
        .map(|e| e.to_string());
    let push_violation = ledger::audit_phase(&pulled, &pushed, &push_skips)
        .err()
        .map(|e| e.to_string());

    Ok(SyncStatus {
        tags,
        pulled,
        pull_skips,
        pushed,
        push_skips,
        pull_remaining,
        push_remaining,
        pull_violation,
        push_violation,
    })
}

//! The persisted progress ledger.
//!
//! Per repository, five newline-delimited files under its `dat` directory
//! record the intended tag set and the per-phase outcomes. Each write is a
//! full rematerialization of one file, never an incremental append; on resume
//! the engines reconcile against these files and only fill in outcomes for
//! tags not yet present in either the success or skip sequence.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{HubSyncError, Result};
use crate::file_system;

/// Full intended tag set for the repository, `repository:tag` per line.
pub const TAGS_FILE: &str = "tags.txt";
/// Tags pulled successfully.
pub const PULLED_FILE: &str = "downloads.txt";
/// Tags skipped during pull (unsupported platform, exhausted retries, ...).
pub const PULL_SKIPS_FILE: &str = "skips.txt";
/// Tags pushed successfully (source references).
pub const PUSHED_FILE: &str = "push_success.txt";
/// Tags skipped during push.
pub const PUSH_SKIPS_FILE: &str = "push_skips.txt";

/// Load one ledger file. Absence is a [`HubSyncError::NotFound`].
pub fn load(path: &Path) -> Result<Vec<String>> {
    file_system::read_lines(path)
}

/// Load one ledger file, treating absence as "phase not yet run".
pub fn load_or_default(path: &Path) -> Result<Vec<String>> {
    match file_system::read_lines(path) {
        Ok(refs) => Ok(refs),
        Err(HubSyncError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Overwrite one ledger file with the complete current sequence.
pub fn write(path: &Path, refs: &[String]) -> Result<()> {
    file_system::write_lines(path, refs)
}

/// Ordered set difference `intended \ (succeeded ∪ skipped)`.
///
/// Empty iff the phase ran to completion; otherwise the returned references
/// are the "stuck" tags, in the order `intended` lists them.
pub fn reconcile(intended: &[String], succeeded: &[String], skipped: &[String]) -> Vec<String> {
    let done: HashSet<&str> = succeeded
        .iter()
        .chain(skipped.iter())
        .map(String::as_str)
        .collect();

    intended
        .iter()
        .filter(|tag| !done.contains(tag.as_str()))
        .cloned()
        .collect()
}

/// Detect ledger corruption without requiring the phase to be complete:
/// outcomes recorded for references outside the intended set, or recorded
/// more than once across the success and skip files.
///
/// Corruption is reported as [`HubSyncError::Ledger`], never repaired here.
pub fn audit_phase(intended: &[String], succeeded: &[String], skipped: &[String]) -> Result<()> {
    let known: HashSet<&str> = intended.iter().map(String::as_str).collect();
    if let Some(foreign) = succeeded
        .iter()
        .chain(skipped.iter())
        .find(|tag| !known.contains(tag.as_str()))
    {
        return Err(HubSyncError::Ledger(format!(
            "outcome recorded for unknown reference {foreign:?}"
        )));
    }

    // With no foreign or duplicate outcomes, the recorded outcomes plus the
    // still-unresolved remainder account for the intended set exactly.
    let remaining = reconcile(intended, succeeded, skipped).len();
    if succeeded.len() + skipped.len() + remaining != intended.len() {
        return Err(HubSyncError::Ledger(format!(
            "duplicate outcomes: {} succeeded + {} skipped + {} remaining != {} intended",
            succeeded.len(),
            skipped.len(),
            remaining,
            intended.len()
        )));
    }

    Ok(())
}

/// Check the completion invariant `|intended| = |succeeded| + |skipped|` on
/// top of the corruption audit.
pub fn verify_phase(intended: &[String], succeeded: &[String], skipped: &[String]) -> Result<()> {
    audit_phase(intended, succeeded, skipped)?;

    if intended.len() != succeeded.len() + skipped.len() {
        return Err(HubSyncError::Ledger(format!(
            "phase incomplete or corrupted: {} intended, {} succeeded + {} skipped",
            intended.len(),
            succeeded.len(),
            skipped.len()
        )));
    }

    Ok(())
}

/// Paths of one repository's ledger files.
#[derive(Debug, Clone)]
pub struct LedgerPaths {
    pub tags: PathBuf,
    pub pulled: PathBuf,
    pub pull_skips: PathBuf,
    pub pushed: PathBuf,
    pub push_skips: PathBuf,
}

impl LedgerPaths {
    /// Ledger layout inside a repository's `dat` directory.
    pub fn new(dat_dir: &Path) -> Self {
        Self {
            tags: dat_dir.join(TAGS_FILE),
            pulled: dat_dir.join(PULLED_FILE),
            pull_skips: dat_dir.join(PULL_SKIPS_FILE),
            pushed: dat_dir.join(PUSHED_FILE),
            push_skips: dat_dir.join(PUSH_SKIPS_FILE),
        }
    }
}

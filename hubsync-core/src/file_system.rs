//! Line-oriented file helpers for the catalog cache and the progress ledger.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::{HubSyncError, Result};

/// Read a newline-delimited file into a list of lines.
///
/// Absence is reported as [`HubSyncError::NotFound`]; callers decide whether
/// that means "phase not yet run" or a fatal misconfiguration.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HubSyncError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(contents.lines().map(str::to_string).collect())
}

/// Overwrite `path` with the given lines, one per line, newline-terminated.
///
/// The write goes to a temporary sibling first and is renamed into place, so
/// a crash mid-write never leaves a truncated ledger behind. Lines containing
/// newlines are rejected rather than silently corrupting the format.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(bad) = lines.iter().find(|line| line.contains('\n')) {
        return Err(HubSyncError::Ledger(format!(
            "refusing to write value containing a newline: {bad:?}"
        )));
    }

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Whether a cached file at `path` should be refetched.
///
/// Absent files are always stale; present files are stale once their
/// modification time is older than `max_age`.
pub fn needs_refresh(path: &Path, max_age: Duration) -> bool {
    let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(_) => return true,
    };
    is_stale(modified, SystemTime::now(), max_age)
}

/// Staleness predicate on raw timestamps. A modification time in the future
/// (clock skew) counts as fresh.
pub fn is_stale(modified: SystemTime, now: SystemTime, max_age: Duration) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age > max_age,
        Err(_) => false,
    }
}

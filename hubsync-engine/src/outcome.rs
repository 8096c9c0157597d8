//! Per-tag outcome classification.

use std::fmt::{self, Display, Formatter};

/// Status line the engine emits when the destination platform is not
/// published for a tag. Terminal: never retried.
pub const UNSUPPORTED_MANIFEST_MARKER: &str =
    "no matching manifest for linux/amd64 in the manifest list entries";
/// Status line for an image that was already current locally.
pub const UP_TO_DATE_MARKER: &str = "Image is up to date for";
/// Status line for a freshly downloaded image.
pub const DOWNLOADED_MARKER: &str = "Downloaded newer image for";

/// Why a tag was skipped. Skips are terminal per phase and recorded in the
/// ledger; they are not failures of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The tag publishes no manifest for the mirror's platform.
    UnsupportedPlatform,
    /// Transport kept failing through the retry budget.
    RetryExhausted,
    /// Local retag failed (source image absent): a precondition failure,
    /// not a transient fault.
    RetagFailed,
    /// Pull output matched no known status line and the image could not be
    /// confirmed in the engine inventory afterwards.
    UnrecognizedStatus,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedPlatform => write!(f, "unsupported platform"),
            SkipReason::RetryExhausted => write!(f, "retry budget exhausted"),
            SkipReason::RetagFailed => write!(f, "retag failed"),
            SkipReason::UnrecognizedStatus => write!(f, "unrecognized engine status"),
        }
    }
}

/// A tag's outcome in one phase is either success or a terminal skip;
/// re-runs never overwrite an existing outcome. Successes travel as plain
/// references, skips carry their reason.
#[derive(Debug, Clone)]
pub struct SkippedTag {
    pub reference: String,
    pub reason: SkipReason,
}

/// Result of running one phase over a sequence of tags.
#[derive(Debug, Clone, Default)]
pub struct PhaseReport {
    pub succeeded: Vec<String>,
    pub skipped: Vec<SkippedTag>,
}

impl PhaseReport {
    pub fn skipped_references(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|skip| skip.reference.clone())
            .collect()
    }
}

/// What the engine's pull status text says about a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStatus {
    Succeeded,
    UnsupportedPlatform,
    /// No known marker present; caller confirms against the image inventory.
    Unrecognized,
}

/// Classify the engine's human-readable pull output.
///
/// The status line is the only signal the engine's pull stream offers; the
/// pull engine backs the `Unrecognized` case with an inventory query instead
/// of assuming success.
pub fn classify_pull_output(output: &str) -> PullStatus {
    if output.contains(UNSUPPORTED_MANIFEST_MARKER) {
        PullStatus::UnsupportedPlatform
    } else if output.contains(UP_TO_DATE_MARKER) || output.contains(DOWNLOADED_MARKER) {
        PullStatus::Succeeded
    } else {
        PullStatus::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unsupported_platform() {
        let output = format!("3.8-windows: Pulling...\n{UNSUPPORTED_MANIFEST_MARKER}\n");
        assert_eq!(classify_pull_output(&output), PullStatus::UnsupportedPlatform);
    }

    #[test]
    fn test_classify_success_markers() {
        assert_eq!(
            classify_pull_output("Status: Downloaded newer image for alpine:3.12"),
            PullStatus::Succeeded
        );
        assert_eq!(
            classify_pull_output("Status: Image is up to date for alpine:latest"),
            PullStatus::Succeeded
        );
    }

    #[test]
    fn test_classify_unknown_output() {
        assert_eq!(
            classify_pull_output("something unexpected"),
            PullStatus::Unrecognized
        );
    }
}

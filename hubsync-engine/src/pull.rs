//! Pull engine: per-tag image pull with bounded retry and three-way outcome
//! classification. Strictly sequential within one repository; cross-repository
//! parallelism belongs to the orchestrator.

use tracing::{info, warn};

use crate::config::SyncPolicy;
use crate::docker::ContainerEngine;
use crate::outcome::{classify_pull_output, PhaseReport, PullStatus, SkipReason, SkippedTag};

/// Pull every tag, classifying each as succeeded or skipped.
///
/// A tag is attempted at most `policy.max_retries + 1` times, with
/// `policy.backoff()` between attempts. Terminal conditions (unsupported
/// platform, unrecognized status) are never retried.
pub async fn pull<E: ContainerEngine>(
    engine: &E,
    tags: &[String],
    policy: &SyncPolicy,
) -> PhaseReport {
    let mut report = PhaseReport::default();

    for tag in tags {
        info!(%tag, "pulling");

        let mut attempt = 0u32;
        let output = loop {
            match engine.image_pull(tag) {
                Ok(output) => break Some(output),
                Err(e) => {
                    if attempt >= policy.max_retries {
                        warn!(%tag, attempt, error = %e, "retry budget exhausted, skipping");
                        break None;
                    }
                    attempt += 1;
                    warn!(%tag, attempt, error = %e, "pull failed, backing off and retrying");
                    tokio::time::sleep(policy.backoff()).await;
                }
            }
        };

        let Some(output) = output else {
            report.skipped.push(SkippedTag {
                reference: tag.clone(),
                reason: SkipReason::RetryExhausted,
            });
            continue;
        };

        match classify_pull_output(&output) {
            PullStatus::Succeeded => report.succeeded.push(tag.clone()),
            PullStatus::UnsupportedPlatform => {
                info!(%tag, "platform not published for this tag, skipping");
                report.skipped.push(SkippedTag {
                    reference: tag.clone(),
                    reason: SkipReason::UnsupportedPlatform,
                });
            }
            // The status text is the engine's only direct signal; when it is
            // unrecognized, the inventory decides instead of assuming success.
            PullStatus::Unrecognized => match engine.image_list() {
                Ok(images) if images.iter().any(|image| image == tag) => {
                    info!(%tag, "status unrecognized but image present, counting as pulled");
                    report.succeeded.push(tag.clone());
                }
                Ok(_) => {
                    warn!(%tag, "unrecognized pull status and image absent, skipping");
                    report.skipped.push(SkippedTag {
                        reference: tag.clone(),
                        reason: SkipReason::UnrecognizedStatus,
                    });
                }
                Err(e) => {
                    warn!(%tag, error = %e, "cannot list images to confirm pull, skipping");
                    report.skipped.push(SkippedTag {
                        reference: tag.clone(),
                        reason: SkipReason::UnrecognizedStatus,
                    });
                }
            },
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockEngine, PullStep};
    use crate::outcome::{DOWNLOADED_MARKER, UNSUPPORTED_MANIFEST_MARKER};

    fn fast_policy(max_retries: u32) -> SyncPolicy {
        SyncPolicy {
            max_retries,
            backoff_secs: 0,
            tag_limit: None,
        }
    }

    fn refs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_downloaded_marker_is_success() {
        let engine = MockEngine::new();
        engine.script_pull(
            "alpine:3.12",
            vec![PullStep::Output(format!(
                "Status: {DOWNLOADED_MARKER} alpine:3.12"
            ))],
        );

        let report = pull(&engine, &refs(&["alpine:3.12"]), &fast_policy(3)).await;
        assert_eq!(report.succeeded, refs(&["alpine:3.12"]));
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_platform_skips_without_retry() {
        let engine = MockEngine::new();
        engine.script_pull(
            "mssql:2017",
            vec![PullStep::Output(format!(
                "pulling...\n{UNSUPPORTED_MANIFEST_MARKER}"
            ))],
        );

        let report = pull(&engine, &refs(&["mssql:2017"]), &fast_policy(5)).await;
        assert!(report.succeeded.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::UnsupportedPlatform);
        assert_eq!(engine.pull_attempts("mssql:2017"), 1);
    }

    #[tokio::test]
    async fn test_transport_errors_exhaust_retry_budget() {
        let engine = MockEngine::new();
        // More scripted failures than the budget allows; the extras must
        // never be consumed.
        engine.script_pull("flaky:1", vec![PullStep::TransportError; 10]);

        let report = pull(&engine, &refs(&["flaky:1"]), &fast_policy(3)).await;
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::RetryExhausted);
        // Exactly max_retries + 1 attempts.
        assert_eq!(engine.pull_attempts("flaky:1"), 4);
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let engine = MockEngine::new();
        engine.script_pull(
            "alpine:edge",
            vec![
                PullStep::TransportError,
                PullStep::TransportError,
                PullStep::Output(format!("Status: {DOWNLOADED_MARKER} alpine:edge")),
            ],
        );

        let report = pull(&engine, &refs(&["alpine:edge"]), &fast_policy(5)).await;
        assert_eq!(report.succeeded, refs(&["alpine:edge"]));
        assert_eq!(engine.pull_attempts("alpine:edge"), 3);
    }

    #[tokio::test]
    async fn test_unrecognized_output_confirmed_by_inventory() {
        let engine = MockEngine::new();
        engine.script_pull(
            "odd:1",
            vec![PullStep::Output("some new engine phrasing".to_string())],
        );
        engine.add_image("odd:1");

        let report = pull(&engine, &refs(&["odd:1"]), &fast_policy(0)).await;
        assert_eq!(report.succeeded, refs(&["odd:1"]));
    }

    #[tokio::test]
    async fn test_unrecognized_output_without_image_is_skipped() {
        let engine = MockEngine::new();
        engine.script_pull(
            "odd:2",
            vec![PullStep::Output("some new engine phrasing".to_string())],
        );

        let report = pull(&engine, &refs(&["odd:2"]), &fast_policy(0)).await;
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::UnrecognizedStatus);
    }

    #[tokio::test]
    async fn test_mixed_batch_processes_every_tag() {
        let engine = MockEngine::new();
        engine.script_pull("bad:1", vec![PullStep::TransportError; 2]);

        let tags = refs(&["ok:1", "bad:1", "ok:2"]);
        let report = pull(&engine, &tags, &fast_policy(1)).await;

        assert_eq!(report.succeeded, refs(&["ok:1", "ok:2"]));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reference, "bad:1");
    }
}

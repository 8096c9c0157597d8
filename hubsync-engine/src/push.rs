//! Push engine: retag each pulled image under the destination namespace and
//! push it, with the same bounded retry and skip classification as the pull
//! engine.

use tracing::{info, warn};

use hubsync_core::error::Result;

use crate::config::{DestinationProfile, SyncPolicy};
use crate::docker::ContainerEngine;
use crate::outcome::{PhaseReport, SkipReason, SkippedTag};

/// Retag and push every tag to the destination profile's namespace.
///
/// The report records *source* references for successes and skips alike, so
/// push outcomes reconcile cleanly against the pull ledger. Login failure is
/// fatal for the phase; per-tag failures are skips.
pub async fn push<E: ContainerEngine>(
    engine: &E,
    tags: &[String],
    policy: &SyncPolicy,
    profile: &DestinationProfile,
) -> Result<PhaseReport> {
    engine.registry_login(profile)?;
    info!(profile = %profile.name, registry = %profile.registry, "pushing to destination");

    let mut report = PhaseReport::default();

    for tag in tags {
        let destination = profile.destination_reference(tag);

        // Retag failure means the source image is not present locally; a
        // precondition failure, skipped without retry.
        if let Err(e) = engine.image_tag(tag, &destination) {
            warn!(%tag, destination = %destination, error = %e, "retag failed, skipping");
            report.skipped.push(SkippedTag {
                reference: tag.clone(),
                reason: SkipReason::RetagFailed,
            });
            continue;
        }

        info!(%tag, destination = %destination, "pushing");

        let mut attempt = 0u32;
        let pushed = loop {
            match engine.image_push(&destination) {
                Ok(_) => break true,
                Err(e) => {
                    if attempt >= policy.max_retries {
                        warn!(%tag, attempt, error = %e, "retry budget exhausted, skipping");
                        break false;
                    }
                    attempt += 1;
                    warn!(%tag, attempt, error = %e, "push failed, backing off and retrying");
                    tokio::time::sleep(policy.backoff()).await;
                }
            }
        };

        if pushed {
            report.succeeded.push(tag.clone());
        } else {
            report.skipped.push(SkippedTag {
                reference: tag.clone(),
                reason: SkipReason::RetryExhausted,
            });
        }
    }

    Ok(report)
}

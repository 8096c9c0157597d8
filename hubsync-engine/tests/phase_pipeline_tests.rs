//! Full pull-then-push pipeline over an on-disk ledger, driven through the
//! crate's public API with a scripted engine.

use std::path::Path;

use hubsync_engine::mock::{MockEngine, PullStep};
use hubsync_engine::outcome::UNSUPPORTED_MANIFEST_MARKER;
use hubsync_engine::{pull_phase, push_phase, status, DestinationProfile, SkipReason, SyncPolicy};

use hubsync_core::ledger::{self, LedgerPaths};

fn fast_policy() -> SyncPolicy {
    SyncPolicy {
        max_retries: 1,
        backoff_secs: 0,
        tag_limit: None,
    }
}

fn profile() -> DestinationProfile {
    DestinationProfile {
        name: "mirror".to_string(),
        registry: "reg.example.com".to_string(),
        namespace_prefix: "reg.example.com/library".to_string(),
        username: "svc".to_string(),
        password: "secret".to_string(),
    }
}

fn refs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn write_tags(dat_dir: &Path, tags: &[&str]) {
    let paths = LedgerPaths::new(dat_dir);
    ledger::write(&paths.tags, &refs(tags)).unwrap();
}

#[tokio::test]
async fn test_full_pipeline_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    write_tags(dir.path(), &["alpine:3.12", "alpine:3.13", "alpine:latest"]);

    let engine = MockEngine::new();
    let pull_report = pull_phase(&engine, dir.path(), &fast_policy())
        .await
        .unwrap();
    assert_eq!(pull_report.succeeded.len(), 3);

    let push_report = push_phase(&engine, dir.path(), &fast_policy(), &profile())
        .await
        .unwrap();
    assert_eq!(push_report.succeeded.len(), 3);
    assert_eq!(engine.logins(), vec!["reg.example.com".to_string()]);

    let state = status(dir.path()).unwrap();
    assert!(state.is_complete());

    // The ledger files on disk are the source of truth for re-runs.
    let paths = LedgerPaths::new(dir.path());
    assert_eq!(
        ledger::load(&paths.pulled).unwrap(),
        refs(&["alpine:3.12", "alpine:3.13", "alpine:latest"])
    );
    assert_eq!(
        ledger::load(&paths.pushed).unwrap(),
        refs(&["alpine:3.12", "alpine:3.13", "alpine:latest"])
    );
}

#[tokio::test]
async fn test_pipeline_with_skips_reconciles_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    write_tags(dir.path(), &["a:good", "a:windows-only", "a:flaky"]);

    let engine = MockEngine::new();
    engine.script_pull(
        "a:windows-only",
        vec![PullStep::Output(UNSUPPORTED_MANIFEST_MARKER.to_string())],
    );
    engine.script_pull("a:flaky", vec![PullStep::TransportError; 5]);

    let pull_report = pull_phase(&engine, dir.path(), &fast_policy())
        .await
        .unwrap();
    assert_eq!(pull_report.succeeded, refs(&["a:good"]));
    assert_eq!(pull_report.skipped.len(), 2);
    assert_eq!(
        pull_report.skipped[0].reason,
        SkipReason::UnsupportedPlatform
    );
    assert_eq!(pull_report.skipped[1].reason, SkipReason::RetryExhausted);
    // max_retries = 1: exactly two attempts for the flaky tag.
    assert_eq!(engine.pull_attempts("a:flaky"), 2);

    // The push phase consumes only the pull successes.
    let push_report = push_phase(&engine, dir.path(), &fast_policy(), &profile())
        .await
        .unwrap();
    assert_eq!(push_report.succeeded, refs(&["a:good"]));
    assert_eq!(engine.push_attempts("reg.example.com/library/a:good"), 1);
    assert_eq!(
        engine.push_attempts("reg.example.com/library/a:windows-only"),
        0
    );

    let state = status(dir.path()).unwrap();
    assert!(state.is_complete());
    assert_eq!(state.pull_skips, refs(&["a:windows-only", "a:flaky"]));
}

#[tokio::test]
async fn test_rerun_after_completion_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_tags(dir.path(), &["a:1", "a:2"]);

    let engine = MockEngine::new();
    pull_phase(&engine, dir.path(), &fast_policy()).await.unwrap();
    push_phase(&engine, dir.path(), &fast_policy(), &profile())
        .await
        .unwrap();

    // Whole-pipeline re-run: no pulls, no pushes, no second login.
    let pull_report = pull_phase(&engine, dir.path(), &fast_policy())
        .await
        .unwrap();
    let push_report = push_phase(&engine, dir.path(), &fast_policy(), &profile())
        .await
        .unwrap();

    assert!(pull_report.succeeded.is_empty() && pull_report.skipped.is_empty());
    assert!(push_report.succeeded.is_empty() && push_report.skipped.is_empty());
    assert_eq!(engine.pull_attempts("a:1"), 1);
    assert_eq!(engine.push_attempts("reg.example.com/library/a:1"), 1);
    assert_eq!(engine.logins().len(), 1);
}

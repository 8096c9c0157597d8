//! Multi-repository sync orchestration.
//!
//! One worker container per repository runs the pull/push pipeline against
//! that repository's bind-mounted state (`/dat`) and scoped image storage
//! (`/var/lib/docker`). A counting semaphore bounds how many workers run at
//! once; each worker's lifecycle is create, start, wait for exit, harvest
//! logs, remove. Engine failures are per-repository outcomes, never aborts
//! of the whole run.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use hubsync_core::error::{HubSyncError, Result};
use hubsync_engine::docker::{BindMount, ContainerEngine, WorkerSpec};

/// Configuration for an orchestrated run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Image the per-repository workers run.
    pub worker_image: String,
    /// Admission-pool size: maximum workers running simultaneously.
    pub concurrency: usize,
    /// Catalog cache root (`<data_dir>/repos/<repo>/{dat,docker}`).
    pub data_dir: PathBuf,
}

/// Terminal state of one repository's worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSyncStatus {
    /// The worker reached not-running state; non-zero exit codes are
    /// reported, not treated as orchestration failures.
    Completed { exit_code: i64 },
    /// The engine failed somewhere in the worker's lifecycle.
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct RepoSyncOutcome {
    pub repo: String,
    pub status: RepoSyncStatus,
}

impl RepoSyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, RepoSyncStatus::Failed { .. })
    }
}

/// Run one worker per repository, bounded by the admission pool, and collect
/// every repository's outcome.
///
/// An empty `repos` means "every repository present in the catalog cache".
pub async fn run_sync<E: ContainerEngine + 'static>(
    engine: Arc<E>,
    config: OrchestratorConfig,
    repos: Vec<String>,
) -> Result<Vec<RepoSyncOutcome>> {
    let repos = if repos.is_empty() {
        cached_repos(&config)?
    } else {
        repos
    };
    info!(
        repos = repos.len(),
        concurrency = config.concurrency,
        image = %config.worker_image,
        "starting orchestrated sync"
    );

    let pool = Arc::new(Semaphore::new(config.concurrency));
    let mut workers: JoinSet<RepoSyncOutcome> = JoinSet::new();

    for repo in repos {
        let engine = Arc::clone(&engine);
        let config = config.clone();
        let pool = Arc::clone(&pool);

        workers.spawn(async move {
            // Admission: blocks while the pool is saturated. The permit is
            // dropped only after teardown, on every path.
            let _permit = match pool.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return RepoSyncOutcome {
                        repo,
                        status: RepoSyncStatus::Failed {
                            error: format!("admission pool closed: {e}"),
                        },
                    };
                }
            };

            let worker_repo = repo.clone();
            let joined = tokio::task::spawn_blocking(move || {
                run_worker(engine.as_ref(), &config, &worker_repo)
            })
            .await;

            let status = match joined {
                Ok(Ok(exit_code)) => RepoSyncStatus::Completed { exit_code },
                Ok(Err(e)) => RepoSyncStatus::Failed {
                    error: e.to_string(),
                },
                Err(e) => RepoSyncStatus::Failed {
                    error: format!("worker task panicked: {e}"),
                },
            };
            RepoSyncOutcome { repo, status }
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) => {
                match &outcome.status {
                    RepoSyncStatus::Completed { exit_code } => {
                        info!(repo = %outcome.repo, exit_code, "repository sync finished");
                    }
                    RepoSyncStatus::Failed { error } => {
                        warn!(repo = %outcome.repo, error, "repository sync failed");
                    }
                }
                outcomes.push(outcome);
            }
            Err(e) => warn!(error = %e, "orchestrator task failed"),
        }
    }

    info!(
        completed = outcomes.iter().filter(|o| !o.is_failure()).count(),
        failed = outcomes.iter().filter(|o| o.is_failure()).count(),
        "orchestrated sync finished"
    );
    Ok(outcomes)
}

/// One worker's full lifecycle: create, start, wait, harvest logs, remove.
fn run_worker<E: ContainerEngine + ?Sized>(
    engine: &E,
    config: &OrchestratorConfig,
    repo: &str,
) -> Result<i64> {
    info!(repo, "creating worker container");

    let spec = WorkerSpec {
        image: config.worker_image.clone(),
        name: Some(format!("hubsync-{}", repo.replace('/', "-"))),
        privileged: true,
        binds: vec![
            BindMount {
                source: hubsync_catalog::repo_docker_dir(&config.data_dir, repo),
                target: "/var/lib/docker".to_string(),
            },
            BindMount {
                source: hubsync_catalog::repo_dat_dir(&config.data_dir, repo),
                target: "/dat".to_string(),
            },
        ],
    };

    let id = engine.container_create(&spec)?;

    let run = (|| -> Result<i64> {
        engine.container_start(&id)?;
        let exit_code = engine.container_wait(&id)?;
        let logs = engine.container_logs(&id)?;
        info!(repo, container = %id, exit_code, "worker output:\n{}", logs.trim_end());
        Ok(exit_code)
    })();

    // Teardown happens regardless of how the run went; a failed removal is
    // reported but does not mask the run's result.
    if let Err(e) = engine.container_remove(&id) {
        warn!(repo, container = %id, error = %e, "failed to remove worker container");
    }

    run
}

/// Enumerate repositories present in the catalog cache.
fn cached_repos(config: &OrchestratorConfig) -> Result<Vec<String>> {
    let repos_dir = config.data_dir.join("repos");
    let entries = fs::read_dir(&repos_dir).map_err(|e| {
        HubSyncError::NotFound(format!(
            "catalog cache at {} is unreadable ({e}); run init first",
            repos_dir.display()
        ))
    })?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use hubsync_engine::mock::MockEngine;
    use std::time::Duration;

    fn config(data_dir: PathBuf, concurrency: usize) -> OrchestratorConfig {
        OrchestratorConfig {
            worker_image: "hubsync/worker:latest".to_string(),
            concurrency,
            data_dir,
        }
    }

    fn repos(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_admission_pool_bounds_running_workers() {
        let mut engine = MockEngine::new();
        engine.wait_delay = Duration::from_millis(50);
        let engine = Arc::new(engine);

        let dir = tempfile::tempdir().unwrap();
        let outcomes = run_sync(
            Arc::clone(&engine),
            config(dir.path().to_path_buf(), 2),
            repos(&["r1", "r2", "r3", "r4", "r5"]),
        )
        .await
        .unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(|o| !o.is_failure()));
        // Never more than the pool size running at once.
        assert!(engine.max_observed_running() <= 2);
        // Every worker got torn down.
        assert_eq!(engine.removed_containers().len(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_engine_failure_is_per_repository() {
        let engine = Arc::new(MockEngine::new());
        engine.fail_creates(1);

        let dir = tempfile::tempdir().unwrap();
        let outcomes = run_sync(
            Arc::clone(&engine),
            config(dir.path().to_path_buf(), 2),
            repos(&["r1", "r2", "r3"]),
        )
        .await
        .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.is_failure()).count(), 1);
        // The other repositories still completed and were torn down.
        assert_eq!(engine.removed_containers().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_repo_list_enumerates_catalog_cache() {
        let dir = tempfile::tempdir().unwrap();
        for repo in ["alpine", "nginx"] {
            fs::create_dir_all(dir.path().join("repos").join(repo)).unwrap();
        }

        let engine = Arc::new(MockEngine::new());
        let outcomes = run_sync(
            Arc::clone(&engine),
            config(dir.path().to_path_buf(), 2),
            Vec::new(),
        )
        .await
        .unwrap();

        let mut synced: Vec<&str> = outcomes.iter().map(|o| o.repo.as_str()).collect();
        synced.sort();
        assert_eq!(synced, vec!["alpine", "nginx"]);
    }

    #[tokio::test]
    async fn test_missing_catalog_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockEngine::new());
        let err = run_sync(engine, config(dir.path().join("nope"), 2), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HubSyncError::NotFound(_)));
    }
}

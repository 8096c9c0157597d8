//! On-disk catalog cache.
//!
//! Mirror state lives under a data directory:
//!
//! ```text
//! <data_dir>/repos.txt                    repository list
//! <data_dir>/repos/<repo>/dat/            ledger files (tags.txt, ...)
//! <data_dir>/repos/<repo>/docker/         per-repository image storage
//! ```
//!
//! Both the repository list and each repository's tag list are refreshed
//! independently when absent or older than the configured max age, and reused
//! otherwise.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use hubsync_core::error::Result;
use hubsync_core::{file_system, ledger};

use crate::client::HubClient;

/// Repository list cache file under the data directory.
pub const REPOS_FILE: &str = "repos.txt";

#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Cached lists older than this are refetched.
    pub max_age: Duration,
    /// Keep only the first N tags of each repository; `None` keeps all.
    pub tag_limit: Option<usize>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 3600),
            tag_limit: Some(100),
        }
    }
}

/// A repository's ledger directory (bind-mounted as `/dat` in workers).
pub fn repo_dat_dir(data_dir: &Path, repo: &str) -> PathBuf {
    data_dir.join("repos").join(repo).join("dat")
}

/// A repository's scoped image-storage directory (bind-mounted as
/// `/var/lib/docker` in workers).
pub fn repo_docker_dir(data_dir: &Path, repo: &str) -> PathBuf {
    data_dir.join("repos").join(repo).join("docker")
}

/// Initialize or refresh the catalog cache and return the repository list.
///
/// Creates the per-repository directory pair and writes each repository's
/// intended tag set (`repo:tag` references) into its ledger when stale.
pub async fn refresh_catalog(
    client: &HubClient,
    data_dir: &Path,
    options: &CacheOptions,
) -> Result<Vec<String>> {
    fs::create_dir_all(data_dir)?;
    let repos_file = data_dir.join(REPOS_FILE);

    let repos = if file_system::needs_refresh(&repos_file, options.max_age) {
        info!("fetching latest repository list");
        let records = client.list_official_repos().await?;
        let names: Vec<String> = records.into_iter().map(|record| record.name).collect();
        file_system::write_lines(&repos_file, &names)?;
        names
    } else {
        debug!("repository list is fresh, reusing cached copy");
        file_system::read_lines(&repos_file)?
    };

    for repo in &repos {
        let dat_dir = repo_dat_dir(data_dir, repo);
        fs::create_dir_all(&dat_dir)?;
        fs::create_dir_all(repo_docker_dir(data_dir, repo))?;

        let tags_file = dat_dir.join(ledger::TAGS_FILE);
        if file_system::needs_refresh(&tags_file, options.max_age) {
            info!(%repo, "fetching latest tag list");
            let references: Vec<String> = client
                .list_tags(repo, options.tag_limit)
                .await?
                .into_iter()
                .map(|tag| format!("{repo}:{tag}"))
                .collect();
            file_system::write_lines(&tags_file, &references)?;
        } else {
            debug!(%repo, "tag list is fresh, reusing cached copy");
        }
    }

    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CatalogConfig;

    #[test]
    fn test_directory_layout() {
        let data_dir = Path::new("/srv/hubsync");
        assert_eq!(
            repo_dat_dir(data_dir, "alpine"),
            Path::new("/srv/hubsync/repos/alpine/dat")
        );
        assert_eq!(
            repo_docker_dir(data_dir, "alpine"),
            Path::new("/srv/hubsync/repos/alpine/docker")
        );
    }

    #[tokio::test]
    async fn test_fresh_cache_is_reused_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path();

        // Pre-populate a fresh cache: one repository with its tag list.
        file_system::write_lines(&data_dir.join(REPOS_FILE), &["alpine".to_string()]).unwrap();
        let dat_dir = repo_dat_dir(data_dir, "alpine");
        fs::create_dir_all(&dat_dir).unwrap();
        file_system::write_lines(
            &dat_dir.join(ledger::TAGS_FILE),
            &["alpine:3.12".to_string()],
        )
        .unwrap();

        // Endpoints point nowhere; a fresh cache must short-circuit all fetches.
        let config = CatalogConfig {
            search_url: "http://127.0.0.1:1/search".to_string(),
            tag_list_url: "http://127.0.0.1:1/tags".to_string(),
            tag_page_url: "http://127.0.0.1:1/paged".to_string(),
            details_url: "http://127.0.0.1:1/details".to_string(),
            ..CatalogConfig::default()
        };
        let client = HubClient::new(config).unwrap();

        let repos = refresh_catalog(&client, data_dir, &CacheOptions::default())
            .await
            .unwrap();
        assert_eq!(repos, vec!["alpine".to_string()]);

        // The cached tag list survives untouched.
        let tags = file_system::read_lines(&dat_dir.join(ledger::TAGS_FILE)).unwrap();
        assert_eq!(tags, vec!["alpine:3.12".to_string()]);
    }
}

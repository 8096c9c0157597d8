//! HTTP client for the source registry's catalog, tag-listing, and
//! product-details endpoints.
//!
//! Repository pages are fetched with unbounded fan-out (page counts are tens,
//! not thousands); tag pages are fetched sequentially. A page that fails or
//! decodes badly is dropped with a warning rather than aborting the whole
//! discovery call.

use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use url::Url;

use hubsync_core::error::{HubSyncError, Result};

use crate::types::{ProductDetails, RepoRecord, SearchResponse, TagEntry, TagPage};

/// Endpoint and paging configuration for the source registry.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Search endpoint listing repositories in a namespace.
    pub search_url: String,
    /// Unpaginated tag-listing endpoint (full list in one response).
    pub tag_list_url: String,
    /// Paginated tag-listing endpoint.
    pub tag_page_url: String,
    /// Product-details endpoint for human-readable descriptions.
    pub details_url: String,
    /// Namespace stamped on top-level official repositories.
    pub library_namespace: String,
    /// Records per page for both paginated endpoints.
    pub page_size: usize,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_url: "https://index.docker.io/v1/search".to_string(),
            tag_list_url: "https://registry.hub.docker.com/v1/repositories".to_string(),
            tag_page_url: "https://store.docker.com/api/content/v1/repositories/public/library"
                .to_string(),
            details_url: "https://store.docker.com/api/content/v1/products/images".to_string(),
            library_namespace: "library".to_string(),
            page_size: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the source registry's public HTTP APIs.
#[derive(Clone)]
pub struct HubClient {
    client: Client,
    config: CatalogConfig,
}

impl HubClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("hubsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HubSyncError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// List the top-level official repositories of the configured namespace.
    ///
    /// Page 1 is fetched first to learn the page count; the remaining pages
    /// are fetched concurrently. Failed pages are omitted with a warning, so
    /// the result can be a subset when the upstream is flaky.
    pub async fn list_official_repos(&self) -> Result<Vec<RepoRecord>> {
        let first = self.fetch_search_page(1).await?;
        let total_pages = first.num_pages;
        debug!(total_pages, "catalog discovery started");

        let mut pages: JoinSet<(usize, Result<SearchResponse>)> = JoinSet::new();
        for page in 2..=total_pages {
            let client = self.clone();
            pages.spawn(async move { (page, client.fetch_search_page(page).await) });
        }

        let mut fetched = Vec::new();
        while let Some(joined) = pages.join_next().await {
            match joined {
                Ok(pair) => fetched.push(pair),
                Err(e) => warn!(error = %e, "catalog page task failed"),
            }
        }

        let records = collect_pages(first.results, fetched);
        Ok(official_top_level(records, &self.config.library_namespace))
    }

    async fn fetch_search_page(&self, page: usize) -> Result<SearchResponse> {
        debug!(page, page_size = self.config.page_size, "fetching catalog page");
        let url = Url::parse_with_params(
            &self.config.search_url,
            &[
                ("q", self.config.library_namespace.clone()),
                ("n", self.config.page_size.to_string()),
                ("page", page.to_string()),
            ],
        )
        .map_err(|e| HubSyncError::Upstream(format!("invalid search URL: {e}")))?;

        self.get_json(url).await
    }

    /// Full tag list for one repository via the unpaginated endpoint.
    pub async fn list_all_tags(&self, repo: &str) -> Result<Vec<String>> {
        debug!(repo, "fetching full tag list");
        let url = Url::parse(&format!("{}/{}/tags", self.config.tag_list_url, repo))
            .map_err(|e| HubSyncError::Upstream(format!("invalid tag-list URL: {e}")))?;

        let entries: Vec<TagEntry> = self.get_json(url).await?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// Tag list via the paginated endpoint, with the platform-exclusion
    /// filter applied and the result truncated to `limit` when set.
    pub async fn list_tags(&self, repo: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let first = self.fetch_tag_page(repo, 1).await?;
        let total_pages = page_count(first.count, self.config.page_size);
        debug!(repo, count = first.count, total_pages, "fetching paginated tag list");

        let mut pages = vec![first.results.into_iter().map(|t| t.name).collect()];
        for page in 2..=total_pages {
            match self.fetch_tag_page(repo, page).await {
                Ok(response) => {
                    pages.push(response.results.into_iter().map(|t| t.name).collect())
                }
                Err(e) => warn!(repo, page, error = %e, "dropping unreadable tag page"),
            }
        }

        Ok(assemble_tag_list(pages, limit))
    }

    async fn fetch_tag_page(&self, repo: &str, page: usize) -> Result<TagPage> {
        let url = Url::parse_with_params(
            &format!("{}/{}/tags", self.config.tag_page_url, repo),
            &[
                ("page_size", self.config.page_size.to_string()),
                ("page", page.to_string()),
            ],
        )
        .map_err(|e| HubSyncError::Upstream(format!("invalid tag-page URL: {e}")))?;

        self.get_json(url).await
    }

    /// Short and full description for one repository.
    pub async fn fetch_description(&self, repo: &str) -> Result<ProductDetails> {
        debug!(repo, "fetching product details");
        let url = Url::parse(&format!("{}/{}", self.config.details_url, repo))
            .map_err(|e| HubSyncError::Upstream(format!("invalid details URL: {e}")))?;

        self.get_json(url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| HubSyncError::Network(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubSyncError::Upstream(format!(
                "GET {url} returned status {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| HubSyncError::Upstream(format!("GET {url}: malformed body: {e}")))
    }
}

/// Fan-in for fetched catalog pages, seeded with page 1's records: readable
/// pages are appended, unreadable ones are dropped with a warning so one bad
/// page costs a subset, not the whole discovery call.
pub(crate) fn collect_pages(
    mut records: Vec<RepoRecord>,
    pages: Vec<(usize, Result<SearchResponse>)>,
) -> Vec<RepoRecord> {
    for (page, result) in pages {
        match result {
            Ok(mut response) => records.append(&mut response.results),
            Err(e) => warn!(page, error = %e, "dropping unreadable catalog page"),
        }
    }
    records
}

/// Filter a raw record stream down to top-level official repositories and
/// stamp the library namespace on them.
pub(crate) fn official_top_level(records: Vec<RepoRecord>, namespace: &str) -> Vec<RepoRecord> {
    records
        .into_iter()
        .filter(|record| record.is_official && !record.name.contains('/'))
        .map(|mut record| {
            record.namespace = Some(namespace.to_string());
            record
        })
        .collect()
}

/// Number of pages needed for `count` entries at `page_size` per page.
pub(crate) fn page_count(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Tags for Windows-only platforms are never mirrored.
pub(crate) fn is_platform_excluded(name: &str) -> bool {
    name.contains("windowsserver") || name.contains("nanoserver")
}

/// Merge fetched tag pages in page order, drop excluded platforms, and
/// truncate to the configured limit.
pub(crate) fn assemble_tag_list(pages: Vec<Vec<String>>, limit: Option<usize>) -> Vec<String> {
    let mut tags: Vec<String> = pages
        .into_iter()
        .flatten()
        .filter(|name| !is_platform_excluded(name))
        .collect();

    if let Some(limit) = limit {
        tags.truncate(limit);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, official: bool) -> RepoRecord {
        RepoRecord {
            name: name.to_string(),
            namespace: None,
            description: String::new(),
            star_count: 0,
            is_official: official,
            is_automated: false,
            is_trusted: false,
        }
    }

    fn page_of(names: &[&str]) -> SearchResponse {
        SearchResponse {
            num_pages: 0,
            num_results: 0,
            page_size: 0,
            page_index: 0,
            query: String::new(),
            results: names.iter().map(|name| record(name, true)).collect(),
        }
    }

    #[test]
    fn test_failed_pages_are_dropped_not_fatal() {
        let fetched = vec![
            (2, Ok(page_of(&["nginx", "redis"]))),
            (3, Err(HubSyncError::Network("connection reset".to_string()))),
            (4, Ok(page_of(&["postgres"]))),
        ];

        let records = collect_pages(vec![record("alpine", true)], fetched);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        // Page 3 is missing, everything else survives.
        assert_eq!(names, vec!["alpine", "nginx", "redis", "postgres"]);
    }

    #[tokio::test]
    async fn test_first_page_failure_aborts_discovery() {
        // Page 1 carries the page count; without it discovery cannot proceed.
        let config = CatalogConfig {
            search_url: "http://127.0.0.1:1/search".to_string(),
            ..CatalogConfig::default()
        };
        let client = HubClient::new(config).unwrap();

        let err = client.list_official_repos().await.unwrap_err();
        assert!(matches!(
            err,
            HubSyncError::Network(_) | HubSyncError::Upstream(_)
        ));
    }

    #[test]
    fn test_official_top_level_filter() {
        let records = vec![
            record("alpine", true),
            record("someuser/alpine", true),
            record("unofficial", false),
        ];

        let filtered = official_top_level(records, "library");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "alpine");
        assert_eq!(filtered[0].namespace.as_deref(), Some("library"));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(250, 100), 3);
        assert_eq!(page_count(200, 100), 2);
        assert_eq!(page_count(1, 100), 1);
        assert_eq!(page_count(0, 100), 0);
    }

    #[test]
    fn test_platform_exclusion() {
        assert!(is_platform_excluded("10.0-nanoserver-amd64"));
        assert!(is_platform_excluded("ltsc2019-windowsserver"));
        assert!(!is_platform_excluded("3.12-alpine"));
        assert!(!is_platform_excluded("latest"));
    }

    #[test]
    fn test_assemble_truncates_preserving_first_page_order() {
        // 250 tags across 3 pages, first-100 mode.
        let pages: Vec<Vec<String>> = (0..3)
            .map(|page| {
                (0..if page == 2 { 50 } else { 100 })
                    .map(|i| format!("tag-{page}-{i}"))
                    .collect()
            })
            .collect();

        let tags = assemble_tag_list(pages.clone(), Some(100));
        assert_eq!(tags.len(), 100);
        assert_eq!(tags.first().unwrap(), "tag-0-0");
        assert_eq!(tags.last().unwrap(), "tag-0-99");

        // Without a limit the merged list keeps everything, in page order.
        let all = assemble_tag_list(pages, None);
        assert_eq!(all.len(), 250);
        assert_eq!(all[100], "tag-1-0");
    }

    #[test]
    fn test_assemble_filters_excluded_platforms() {
        let pages = vec![vec![
            "3.12-alpine".to_string(),
            "10.0-nanoserver-amd64".to_string(),
            "latest".to_string(),
        ]];
        let tags = assemble_tag_list(pages, None);
        assert_eq!(tags, vec!["3.12-alpine".to_string(), "latest".to_string()]);
    }
}

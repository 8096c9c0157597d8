//! Response models for the registry catalog, tag-listing, and product APIs.

use serde::{Deserialize, Serialize};

/// One repository as reported by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    /// Repository name; top-level official repositories carry no `/`.
    pub name: String,
    /// Namespace the repository is mirrored under. The search endpoint omits
    /// it for official repositories; discovery stamps the configured library
    /// namespace instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub star_count: i64,
    #[serde(default)]
    pub is_official: bool,
    #[serde(default)]
    pub is_automated: bool,
    #[serde(default)]
    pub is_trusted: bool,
}

/// One page of the search endpoint's response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub num_pages: usize,
    #[serde(default)]
    pub num_results: usize,
    #[serde(default)]
    pub page_size: usize,
    #[serde(default, rename = "page")]
    pub page_index: usize,
    #[serde(default)]
    pub query: String,
    pub results: Vec<RepoRecord>,
}

/// A tag name as returned by both tag-listing variants.
#[derive(Debug, Clone, Deserialize)]
pub struct TagEntry {
    pub name: String,
}

/// One page of the paginated tag-listing endpoint's response.
#[derive(Debug, Clone, Deserialize)]
pub struct TagPage {
    /// Total number of tags across all pages.
    pub count: usize,
    pub results: Vec<TagEntry>,
}

/// Human-readable repository descriptions from the product-details endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDetails {
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
}

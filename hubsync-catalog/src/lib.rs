//! Catalog discovery against the source registry's search and tag-listing
//! APIs, plus the on-disk catalog cache that feeds the sync pipeline.

pub mod cache;
pub mod client;
pub mod types;

pub use cache::{refresh_catalog, repo_dat_dir, repo_docker_dir, CacheOptions};
pub use client::{CatalogConfig, HubClient};
pub use types::{ProductDetails, RepoRecord, SearchResponse, TagPage};

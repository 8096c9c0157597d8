//! Pipeline configuration.
//!
//! One explicit configuration object replaces the scattered retry counts,
//! truncation limits, and hardcoded registry credentials of the earlier
//! pipeline drafts. Destination registries differ only by credential and
//! namespace prefix, so they are profiles, not code paths.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry and truncation policy shared by the pull and push engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPolicy {
    /// Retries after the first failed attempt; a tag is attempted at most
    /// `max_retries + 1` times before it is skipped.
    pub max_retries: u32,
    /// Sleep between attempts, in seconds.
    pub backoff_secs: u64,
    /// Keep only the first N tags of a repository; `None` mirrors all.
    pub tag_limit: Option<usize>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_secs: 5,
            tag_limit: Some(100),
        }
    }
}

impl SyncPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

/// A destination registry: credential set plus namespace prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationProfile {
    /// Profile name used for selection (e.g. "personal", "mirror").
    pub name: String,
    /// Registry host the credentials authenticate against.
    pub registry: String,
    /// Prefix composed onto each source reference, e.g.
    /// `reg.example.com/library` turns `alpine:3.12` into
    /// `reg.example.com/library/alpine:3.12`.
    pub namespace_prefix: String,
    pub username: String,
    pub password: String,
}

impl DestinationProfile {
    /// Destination reference for a source `repository:tag`.
    pub fn destination_reference(&self, reference: &str) -> String {
        format!("{}/{}", self.namespace_prefix, reference)
    }
}

/// Top-level mirror configuration, loadable from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Root of the catalog cache and per-repository state.
    pub data_dir: PathBuf,
    /// Image run per repository by the orchestrator (docker-in-docker worker).
    pub worker_image: String,
    /// Admission-pool size for concurrent workers.
    pub concurrency: usize,
    /// Cached repository/tag lists older than this are refetched.
    pub refresh_max_age_hours: u64,
    pub policy: SyncPolicy,
    /// Configured destination registries; selected by name at push time.
    pub profiles: Vec<DestinationProfile>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            worker_image: "hubsync/worker:latest".to_string(),
            concurrency: 5,
            refresh_max_age_hours: 24,
            policy: SyncPolicy::default(),
            profiles: Vec::new(),
        }
    }
}

impl MirrorConfig {
    pub fn refresh_max_age(&self) -> Duration {
        Duration::from_secs(self.refresh_max_age_hours * 3600)
    }

    pub fn profile(&self, name: &str) -> Option<&DestinationProfile> {
        self.profiles.iter().find(|profile| profile.name == name)
    }
}

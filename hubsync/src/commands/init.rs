//! `hubsync init`: refresh the catalog cache.

use anyhow::Result;

use hubsync_catalog::{refresh_catalog, CacheOptions, CatalogConfig, HubClient};
use hubsync_engine::MirrorConfig;

pub async fn run(config: &MirrorConfig, all_tags: bool) -> Result<()> {
    let client = HubClient::new(CatalogConfig::default())?;
    let options = CacheOptions {
        max_age: config.refresh_max_age(),
        tag_limit: if all_tags {
            None
        } else {
            config.policy.tag_limit
        },
    };

    let repos = refresh_catalog(&client, &config.data_dir, &options).await?;
    println!(
        "Catalog cache ready: {} repositories under {}",
        repos.len(),
        config.data_dir.display()
    );
    Ok(())
}

//! `hubsync describe`: fetch a repository's human-readable descriptions.

use anyhow::Result;

use hubsync_catalog::{CatalogConfig, HubClient};

pub async fn run(repo: &str) -> Result<()> {
    let client = HubClient::new(CatalogConfig::default())?;
    let details = client.fetch_description(repo).await?;

    println!("{repo}: {}", details.short_description);
    if !details.full_description.is_empty() {
        println!("\n{}", details.full_description);
    }
    Ok(())
}

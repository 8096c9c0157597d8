//! Command dispatch and shared configuration loading.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use hubsync_engine::MirrorConfig;

use crate::cli::{Args, Command};

mod check;
mod describe;
mod init;
mod pull;
mod push;
mod run;

pub async fn execute(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    match args.command {
        Command::Init { all_tags } => init::run(&config, all_tags).await,
        Command::Pull { repo, dat } => {
            let dat_dir = resolve_dat_dir(&config, repo.as_deref(), dat)?;
            pull::run(&config, &dat_dir).await
        }
        Command::Push { repo, dat, profile } => {
            let dat_dir = resolve_dat_dir(&config, repo.as_deref(), dat)?;
            push::run(&config, &dat_dir, &profile).await
        }
        Command::Run {
            repos,
            image,
            concurrency,
            yes,
        } => run::run(&config, repos, image, concurrency, yes).await,
        Command::Check { repo } => check::run(&config, repo),
        Command::Describe { repo } => describe::run(&repo).await,
    }
}

fn load_config(args: &Args) -> Result<MirrorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("cannot read configuration at {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("invalid configuration at {}", path.display()))?
        }
        None => {
            let mut config = MirrorConfig::default();
            if let Some(home) = dirs::home_dir() {
                config.data_dir = home.join(".hubsync");
            }
            config
        }
    };

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

fn resolve_dat_dir(
    config: &MirrorConfig,
    repo: Option<&str>,
    dat: Option<PathBuf>,
) -> Result<PathBuf> {
    match (dat, repo) {
        (Some(dat), _) => Ok(dat),
        (None, Some(repo)) => Ok(hubsync_catalog::repo_dat_dir(&config.data_dir, repo)),
        (None, None) => bail!("specify a repository name or --dat <dir>"),
    }
}

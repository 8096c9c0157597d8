//! Container-engine seam.
//!
//! [`ContainerEngine`] is the boundary the pipeline drives image transfer and
//! worker containers through. [`DockerCli`] implements it by shelling out to
//! the `docker` binary with combined stdout/stderr capture, which is where
//! the pull/push status text the classifier reads comes from.

use std::path::PathBuf;

use duct::cmd;
use tracing::debug;

use hubsync_core::error::{HubSyncError, Result};

use crate::config::DestinationProfile;
use crate::outcome::UNSUPPORTED_MANIFEST_MARKER;

/// A host directory bind-mounted into a worker container.
#[derive(Debug, Clone)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: String,
}

/// Specification for one isolated execution unit.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub image: String,
    pub name: Option<String>,
    /// Docker-in-docker workers need a privileged daemon.
    pub privileged: bool,
    pub binds: Vec<BindMount>,
}

/// Operations the pipeline needs from a container engine.
///
/// Methods block; async callers wrap them in `spawn_blocking`.
pub trait ContainerEngine: Send + Sync {
    /// All local `repository:tag` references.
    fn image_list(&self) -> Result<Vec<String>>;

    /// Pull a reference. `Ok` carries the engine's status output (which may
    /// describe a terminal condition such as an unsupported platform);
    /// `Err(Network)` is a retryable transport failure.
    fn image_pull(&self, reference: &str) -> Result<String>;

    /// Retag a local image. Failure means the source image is absent.
    fn image_tag(&self, source: &str, target: &str) -> Result<()>;

    /// Authenticate against a destination registry.
    fn registry_login(&self, profile: &DestinationProfile) -> Result<()>;

    /// Push a reference. Same error contract as [`Self::image_pull`].
    fn image_push(&self, reference: &str) -> Result<String>;

    fn container_create(&self, spec: &WorkerSpec) -> Result<String>;
    fn container_start(&self, id: &str) -> Result<()>;
    /// Block until the container is no longer running; returns its exit code.
    fn container_wait(&self, id: &str) -> Result<i64>;
    fn container_logs(&self, id: &str) -> Result<String>;
    fn container_remove(&self, id: &str) -> Result<()>;
}

/// `docker` CLI driver.
pub struct DockerCli;

impl DockerCli {
    /// Construct after verifying the docker binary and daemon are reachable.
    pub fn new() -> Result<Self> {
        Self::ensure_available()?;
        Ok(Self)
    }

    fn ensure_available() -> Result<()> {
        if which::which("docker").is_err() {
            return Err(HubSyncError::Engine(
                "docker is not installed or not in PATH".to_string(),
            ));
        }

        let output = cmd!("docker", "version")
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|e| HubSyncError::Engine(format!("failed to run docker version: {e}")))?;

        if !output.status.success() {
            return Err(HubSyncError::Engine(format!(
                "docker daemon is not running: {}",
                String::from_utf8_lossy(&output.stdout).trim()
            )));
        }

        debug!("docker is available");
        Ok(())
    }

    /// Run a docker subcommand, capturing combined output.
    fn run(&self, args: &[&str]) -> Result<(bool, String)> {
        debug!(?args, "executing docker command");
        let output = cmd("docker", args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|e| HubSyncError::Engine(format!("failed to execute docker: {e}")))?;

        Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).to_string(),
        ))
    }
}

impl ContainerEngine for DockerCli {
    fn image_list(&self) -> Result<Vec<String>> {
        let (ok, output) = self.run(&["image", "ls", "--format", "{{.Repository}}:{{.Tag}}"])?;
        if !ok {
            return Err(HubSyncError::Engine(format!(
                "docker image ls failed: {}",
                output.trim()
            )));
        }

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.contains("<none>"))
            .map(str::to_string)
            .collect())
    }

    fn image_pull(&self, reference: &str) -> Result<String> {
        let (ok, output) = self.run(&["pull", reference])?;
        // A manifest-list miss exits non-zero but is a terminal classification,
        // not a transport fault; hand the text to the classifier.
        if ok || output.contains(UNSUPPORTED_MANIFEST_MARKER) {
            Ok(output)
        } else {
            Err(HubSyncError::Network(format!(
                "pull {reference} failed: {}",
                last_line(&output)
            )))
        }
    }

    fn image_tag(&self, source: &str, target: &str) -> Result<()> {
        let (ok, output) = self.run(&["tag", source, target])?;
        if ok {
            Ok(())
        } else {
            Err(HubSyncError::Engine(format!(
                "tag {source} -> {target} failed: {}",
                last_line(&output)
            )))
        }
    }

    fn registry_login(&self, profile: &DestinationProfile) -> Result<()> {
        debug!(registry = %profile.registry, username = %profile.username, "logging in");
        let output = cmd!(
            "docker",
            "login",
            &profile.registry,
            "--username",
            &profile.username,
            "--password-stdin"
        )
        .stdin_bytes(profile.password.as_bytes())
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked()
        .run()
        .map_err(|e| HubSyncError::Engine(format!("failed to execute docker login: {e}")))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(HubSyncError::Engine(format!(
                "login to {} failed: {}",
                profile.registry,
                last_line(&String::from_utf8_lossy(&output.stdout))
            )))
        }
    }

    fn image_push(&self, reference: &str) -> Result<String> {
        let (ok, output) = self.run(&["push", reference])?;
        if ok {
            Ok(output)
        } else {
            Err(HubSyncError::Network(format!(
                "push {reference} failed: {}",
                last_line(&output)
            )))
        }
    }

    fn container_create(&self, spec: &WorkerSpec) -> Result<String> {
        let mut args: Vec<String> = vec!["create".to_string()];
        if spec.privileged {
            args.push("--privileged".to_string());
        }
        if let Some(name) = &spec.name {
            args.push("--name".to_string());
            args.push(name.clone());
        }
        for bind in &spec.binds {
            args.push("-v".to_string());
            args.push(format!("{}:{}", bind.source.display(), bind.target));
        }
        args.push(spec.image.clone());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let (ok, output) = self.run(&arg_refs)?;
        if !ok {
            return Err(HubSyncError::Engine(format!(
                "container create from {} failed: {}",
                spec.image,
                last_line(&output)
            )));
        }

        // `docker create` prints warnings before the id; the id is last.
        Ok(last_line(&output))
    }

    fn container_start(&self, id: &str) -> Result<()> {
        let (ok, output) = self.run(&["start", id])?;
        if ok {
            Ok(())
        } else {
            Err(HubSyncError::Engine(format!(
                "container start {id} failed: {}",
                last_line(&output)
            )))
        }
    }

    fn container_wait(&self, id: &str) -> Result<i64> {
        let (ok, output) = self.run(&["wait", id])?;
        if !ok {
            return Err(HubSyncError::Engine(format!(
                "container wait {id} failed: {}",
                last_line(&output)
            )));
        }

        last_line(&output).parse::<i64>().map_err(|_| {
            HubSyncError::Engine(format!(
                "container wait {id} returned unparsable status: {}",
                output.trim()
            ))
        })
    }

    fn container_logs(&self, id: &str) -> Result<String> {
        let (ok, output) = self.run(&["logs", id])?;
        if ok {
            Ok(output)
        } else {
            Err(HubSyncError::Engine(format!(
                "container logs {id} failed: {}",
                last_line(&output)
            )))
        }
    }

    fn container_remove(&self, id: &str) -> Result<()> {
        let (ok, output) = self.run(&["rm", "-f", id])?;
        if ok {
            Ok(())
        } else {
            Err(HubSyncError::Engine(format!(
                "container remove {id} failed: {}",
                last_line(&output)
            )))
        }
    }
}

fn last_line(output: &str) -> String {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_line_skips_trailing_blanks() {
        assert_eq!(last_line("warning\nabc123\n\n"), "abc123");
        assert_eq!(last_line(""), "");
    }

    #[test]
    fn test_worker_spec_bind_format() {
        let bind = BindMount {
            source: PathBuf::from("/srv/data/repos/alpine/dat"),
            target: "/dat".to_string(),
        };
        assert_eq!(
            format!("{}:{}", bind.source.display(), bind.target),
            "/srv/data/repos/alpine/dat:/dat"
        );
    }
}

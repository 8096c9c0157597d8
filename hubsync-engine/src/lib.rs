//! Pull/push engines over a container-engine seam.
//!
//! The engines drive image transfer per tag with bounded retry and a
//! three-way outcome classification (success / permanent skip / exhausted
//! retry), and the phase drivers wire them to the progress ledger so re-runs
//! only fill in outcomes for tags without one.

pub mod config;
pub mod docker;
pub mod outcome;
pub mod pull;
pub mod push;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::{DestinationProfile, MirrorConfig, SyncPolicy};
pub use docker::{BindMount, ContainerEngine, DockerCli, WorkerSpec};
pub use outcome::{PhaseReport, SkipReason, SkippedTag};
pub use sync::{pull_phase, push_phase, status, SyncStatus};

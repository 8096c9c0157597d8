//! Scripted in-memory [`ContainerEngine`] for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use hubsync_core::error::{HubSyncError, Result};

use crate::config::DestinationProfile;
use crate::docker::{ContainerEngine, WorkerSpec};
use crate::outcome::DOWNLOADED_MARKER;

/// One scripted response to `image_pull`.
#[derive(Debug, Clone)]
pub enum PullStep {
    /// Transport succeeded; this is the engine's status output.
    Output(String),
    /// Retryable transport failure.
    TransportError,
}

#[derive(Default)]
struct MockState {
    images: Vec<String>,
    pull_script: HashMap<String, VecDeque<PullStep>>,
    pull_attempts: HashMap<String, usize>,
    retag_failures: HashSet<String>,
    push_failures: HashMap<String, usize>,
    push_attempts: HashMap<String, usize>,
    logins: Vec<String>,
    create_failures: usize,
    created: usize,
    removed: Vec<String>,
}

/// Scripted engine. Unscripted pulls report a fresh download and unscripted
/// pushes succeed, so tests only spell out the interesting cases.
pub struct MockEngine {
    state: Mutex<MockState>,
    running: AtomicUsize,
    max_running: AtomicUsize,
    /// How long `container_wait` blocks, simulating the worker's run time.
    pub wait_delay: Duration,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            wait_delay: Duration::from_millis(0),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    pub fn script_pull(&self, reference: &str, steps: Vec<PullStep>) {
        self.locked()
            .pull_script
            .insert(reference.to_string(), steps.into());
    }

    pub fn add_image(&self, reference: &str) {
        self.locked().images.push(reference.to_string());
    }

    pub fn fail_retag(&self, reference: &str) {
        self.locked().retag_failures.insert(reference.to_string());
    }

    /// Make the next `n` pushes of `reference` fail before succeeding.
    pub fn fail_pushes(&self, reference: &str, n: usize) {
        self.locked().push_failures.insert(reference.to_string(), n);
    }

    /// Make the next `n` `container_create` calls fail.
    pub fn fail_creates(&self, n: usize) {
        self.locked().create_failures = n;
    }

    pub fn pull_attempts(&self, reference: &str) -> usize {
        self.locked()
            .pull_attempts
            .get(reference)
            .copied()
            .unwrap_or(0)
    }

    pub fn push_attempts(&self, reference: &str) -> usize {
        self.locked()
            .push_attempts
            .get(reference)
            .copied()
            .unwrap_or(0)
    }

    pub fn logins(&self) -> Vec<String> {
        self.locked().logins.clone()
    }

    pub fn removed_containers(&self) -> Vec<String> {
        self.locked().removed.clone()
    }

    /// Highest number of workers observed running simultaneously.
    pub fn max_observed_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

impl ContainerEngine for MockEngine {
    fn image_list(&self) -> Result<Vec<String>> {
        Ok(self.locked().images.clone())
    }

    fn image_pull(&self, reference: &str) -> Result<String> {
        let mut state = self.locked();
        *state
            .pull_attempts
            .entry(reference.to_string())
            .or_insert(0) += 1;

        let step = state
            .pull_script
            .get_mut(reference)
            .and_then(VecDeque::pop_front);

        match step {
            Some(PullStep::Output(output)) => Ok(output),
            Some(PullStep::TransportError) => Err(HubSyncError::Network(format!(
                "mock transport failure pulling {reference}"
            ))),
            None => {
                state.images.push(reference.to_string());
                Ok(format!("Status: {DOWNLOADED_MARKER} {reference}"))
            }
        }
    }

    fn image_tag(&self, source: &str, target: &str) -> Result<()> {
        let mut state = self.locked();
        if state.retag_failures.contains(source) {
            return Err(HubSyncError::Engine(format!(
                "mock: no such image {source}"
            )));
        }
        state.images.push(target.to_string());
        Ok(())
    }

    fn registry_login(&self, profile: &DestinationProfile) -> Result<()> {
        self.locked().logins.push(profile.registry.clone());
        Ok(())
    }

    fn image_push(&self, reference: &str) -> Result<String> {
        let mut state = self.locked();
        *state
            .push_attempts
            .entry(reference.to_string())
            .or_insert(0) += 1;

        if let Some(remaining) = state.push_failures.get_mut(reference) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(HubSyncError::Network(format!(
                    "mock transport failure pushing {reference}"
                )));
            }
        }
        Ok(format!("{reference}: pushed"))
    }

    fn container_create(&self, spec: &WorkerSpec) -> Result<String> {
        let mut state = self.locked();
        if state.create_failures > 0 {
            state.create_failures -= 1;
            return Err(HubSyncError::Engine(format!(
                "mock: cannot create container from {}",
                spec.image
            )));
        }
        state.created += 1;
        Ok(format!("mock-container-{}", state.created))
    }

    fn container_start(&self, _id: &str) -> Result<()> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        Ok(())
    }

    fn container_wait(&self, _id: &str) -> Result<i64> {
        std::thread::sleep(self.wait_delay);
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(0)
    }

    fn container_logs(&self, id: &str) -> Result<String> {
        Ok(format!("logs of {id}\n"))
    }

    fn container_remove(&self, id: &str) -> Result<()> {
        self.locked().removed.push(id.to_string());
        Ok(())
    }
}

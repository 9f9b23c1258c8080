//! Change watcher - keeps a file-backed registry in sync with its directory.
//!
//! Every `check_interval` the watcher samples each loaded definition's
//! source file. The first drift it sees triggers one full reload of the
//! registry and ends the pass. When no loaded file drifted, the directory
//! listing is compared with the loaded set so added and removed files are
//! picked up as well.
//!
//! Errors never stop the watcher: stat failures are logged per file and a
//! failed reload keeps the previous entries in place.

use super::core::Registry;
use crate::definition::DefinitionError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Default interval between two watch passes
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest interval the watcher will poll at
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Result of a single watch pass
#[derive(Debug)]
pub enum ScanOutcome {
    /// Nothing drifted
    Unchanged,
    /// Drift was detected and the registry now holds `definitions` entries
    Reloaded { definitions: usize },
    /// Drift was detected but the reload failed; the previous entries remain
    ReloadFailed(DefinitionError),
}

/// What triggered a reload
enum Drift {
    File(PathBuf),
    Directory,
}

/// Periodic drift detector for a file-backed registry
#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    registry: Arc<Registry>,
    check_interval: Duration,
}

impl ChangeWatcher {
    /// Create a watcher. Intervals below [`MIN_CHECK_INTERVAL`] are raised to it.
    pub fn new(registry: Arc<Registry>, check_interval: Duration) -> Self {
        if check_interval < MIN_CHECK_INTERVAL {
            warn!(
                requested_ms = check_interval.as_millis() as u64,
                "Check interval too short, using the minimum"
            );
        }
        Self {
            registry,
            check_interval: check_interval.max(MIN_CHECK_INTERVAL),
        }
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Run one watch pass. Blocks on file system calls.
    pub fn scan(&self) -> ScanOutcome {
        let Some(drift) = self.detect_drift() else {
            return ScanOutcome::Unchanged;
        };

        match drift {
            Drift::File(path) => {
                info!(path = %path.display(), "Definition has changed, reloading")
            }
            Drift::Directory => info!("Definitions directory content has changed, reloading"),
        }

        match self.registry.load() {
            Ok(definitions) => {
                info!(definitions, "Definitions reloaded");
                ScanOutcome::Reloaded { definitions }
            }
            Err(e) => {
                error!(error = %e, "Failed to reload definitions, keeping previous set");
                ScanOutcome::ReloadFailed(e)
            }
        }
    }

    fn detect_drift(&self) -> Option<Drift> {
        let snapshot = self.registry.snapshot();
        for definition in snapshot.values() {
            match definition.has_changed() {
                Ok(true) => {
                    // One reload covers every drifted file
                    return definition.source_path.clone().map(Drift::File);
                }
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to check definition stats"),
            }
        }

        match self.registry.source_files_changed() {
            Ok(true) => Some(Drift::Directory),
            Ok(false) => None,
            Err(e) => {
                warn!(error = %e, "Failed to list definitions directory");
                None
            }
        }
    }

    /// Watch until `shutdown` fires or its sender is dropped.
    ///
    /// The first pass runs one `check_interval` after the call. Passes run on
    /// the blocking thread pool.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() completes its first tick immediately
        ticker.tick().await;

        info!(
            interval_ms = self.check_interval.as_millis() as u64,
            "Watching definitions for changes"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let watcher = self.clone();
                    match tokio::task::spawn_blocking(move || watcher.scan()).await {
                        Ok(outcome) => debug!(?outcome, "Watch pass complete"),
                        Err(e) => error!(error = %e, "Watch pass panicked"),
                    }
                }
                _ = shutdown.recv() => {
                    info!("Definition watcher shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn [`ChangeWatcher::run`] on the current runtime
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

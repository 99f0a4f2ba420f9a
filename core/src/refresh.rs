use crate::index::Snapshot;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Monotonic id of a fetch, issued when the fetch starts. Generation 0 is the initial empty snapshot.
pub type Generation = u64;

/// Time-based staleness. The store is never asked for change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// How long an installed snapshot is served before the next read re-fetches.
    pub staleness: Duration,
    /// Minimum wait after a failed fetch before trying again.
    pub retry_after: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self { staleness: Duration::from_secs(300), retry_after: Duration::from_secs(30) }
    }
}

impl RefreshPolicy {
    pub fn new(staleness: Duration, retry_after: Duration) -> Self {
        Self { staleness, retry_after }
    }

    /// Whether a read at `now` should trigger a fetch.
    pub fn needs_fetch(&self, installed_at: Option<Instant>, last_failure: Option<Instant>, now: Instant) -> bool {
        if let Some(failed) = last_failure {
            if now.saturating_duration_since(failed) < self.retry_after {
                return false;
            }
        }
        match installed_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.staleness,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// A fetch issued later has already been installed; this one was dropped.
    Superseded { current: Generation },
}

struct Current {
    generation: Generation,
    snapshot: Arc<Snapshot>,
    installed_at: Option<Instant>,
}

/// Owner of the "current snapshot" pointer.
///
/// Readers take an `Arc` handle and keep querying it even after a swap. Installs replace the
/// pointer as a whole and only move forward in generation order.
pub struct SnapshotCell {
    issued: AtomicU64,
    current: RwLock<Current>,
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            current: RwLock::new(Current { generation: 0, snapshot: Arc::new(Snapshot::empty()), installed_at: None }),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.current.read().snapshot.clone()
    }

    /// Current handle together with its generation, read under one lock.
    pub fn load_with_generation(&self) -> (Generation, Arc<Snapshot>) {
        let c = self.current.read();
        (c.generation, c.snapshot.clone())
    }

    pub fn generation(&self) -> Generation {
        self.current.read().generation
    }

    /// When the current snapshot was installed; `None` until the first successful fetch.
    pub fn installed_at(&self) -> Option<Instant> {
        self.current.read().installed_at
    }

    /// Issue the generation for a fetch about to start.
    pub fn begin_fetch(&self) -> Generation {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn install(&self, generation: Generation, snapshot: Arc<Snapshot>) -> InstallOutcome {
        let mut c = self.current.write();
        if generation <= c.generation {
            return InstallOutcome::Superseded { current: c.generation };
        }
        *c = Current { generation, snapshot, installed_at: Some(Instant::now()) };
        InstallOutcome::Installed
    }
}

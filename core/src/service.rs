//! Search front door for a presentation layer.
//!
//! Holds the current snapshot, re-fetches it from the content store once it goes stale, and
//! answers keystroke queries against whichever snapshot was current when the query started.
//! Fetch failures never clear results: the last good snapshot keeps serving and the failure is
//! published on the status channel.

use crate::article::{FieldBoosts, RankedResult};
use crate::error::FetchError;
use crate::index::{build_index, Snapshot};
use crate::query::query;
use crate::refresh::{Generation, InstallOutcome, RefreshPolicy, SnapshotCell};
use crate::store::ContentStore;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Queries shorter than this (in characters, after trimming) are answered with no results
/// before reaching the store or the ranking engine.
pub const MIN_QUERY_CHARS: usize = 2;

/// Shortest period accepted by [`SearchService::spawn_scheduled_refresh`].
pub const MIN_SCHEDULE_PERIOD: Duration = Duration::from_secs(1);

pub fn passes_min_length(text: &str) -> bool {
    text.trim().chars().count() >= MIN_QUERY_CHARS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Installed { generation: Generation, documents: usize },
    Superseded { generation: Generation, current: Generation },
}

/// Last known refresh state, broadcast to subscribers after every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    pub generation: Generation,
    pub documents: usize,
    pub last_success: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

pub struct SearchService<S> {
    store: S,
    cell: SnapshotCell,
    policy: RefreshPolicy,
    boosts: FieldBoosts,
    last_failure: Mutex<Option<Instant>>,
    // serializes staleness-triggered fetches so a burst of reads issues one fetch
    fetch_gate: tokio::sync::Mutex<()>,
    status: watch::Sender<RefreshStatus>,
}

impl<S: ContentStore> SearchService<S> {
    pub fn new(store: S, policy: RefreshPolicy, boosts: FieldBoosts) -> Self {
        let (status, _) = watch::channel(RefreshStatus::default());
        Self {
            store,
            cell: SnapshotCell::new(),
            policy,
            boosts,
            last_failure: Mutex::new(None),
            fetch_gate: tokio::sync::Mutex::new(()),
            status,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub fn boosts(&self) -> &FieldBoosts {
        &self.boosts
    }

    /// Handle to the current snapshot. It stays valid and unchanged across later refreshes.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.cell.load()
    }

    pub fn generation(&self) -> Generation {
        self.cell.generation()
    }

    pub fn status(&self) -> RefreshStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.status.subscribe()
    }

    pub fn is_stale(&self) -> bool {
        self.policy.needs_fetch(self.cell.installed_at(), *self.last_failure.lock(), Instant::now())
    }

    /// Re-fetch if the staleness window (or the retry window after a failure) has elapsed.
    pub async fn ensure_fresh(&self) {
        if !self.is_stale() {
            return;
        }
        let _guard = self.fetch_gate.lock().await;
        if self.is_stale() {
            // failures are already logged and published
            self.refresh().await.ok();
        }
    }

    /// Fetch, build and install a new snapshot regardless of staleness.
    pub async fn refresh(&self) -> Result<RefreshOutcome, FetchError> {
        let generation = self.cell.begin_fetch();
        tracing::debug!(generation, store = self.store.name(), "fetching published articles");
        let articles = match self.store.fetch_published().await {
            Ok(articles) => articles,
            Err(e) => {
                self.record_failure(generation, &e);
                return Err(e);
            }
        };

        let snapshot = Arc::new(build_index(articles));
        let documents = snapshot.len();
        match self.cell.install(generation, snapshot) {
            InstallOutcome::Installed => {
                *self.last_failure.lock() = None;
                let now = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
                self.status.send_modify(|s| {
                    s.generation = generation;
                    s.documents = documents;
                    s.last_success = Some(now);
                    s.last_error = None;
                    s.consecutive_failures = 0;
                });
                tracing::info!(generation, documents, "installed snapshot");
                Ok(RefreshOutcome::Installed { generation, documents })
            }
            InstallOutcome::Superseded { current } => {
                tracing::debug!(generation, current, "discarded snapshot from superseded fetch");
                Ok(RefreshOutcome::Superseded { generation, current })
            }
        }
    }

    fn record_failure(&self, generation: Generation, error: &FetchError) {
        if generation <= self.cell.generation() {
            tracing::debug!(generation, error = %error, "superseded fetch failed");
            return;
        }
        *self.last_failure.lock() = Some(Instant::now());
        let message = error.to_string();
        self.status.send_modify(|s| {
            s.last_error = Some(message);
            s.consecutive_failures += 1;
        });
        tracing::warn!(generation, store = self.store.name(), error = %error, "fetch failed, serving last snapshot");
    }

    pub async fn search(&self, text: &str) -> Vec<RankedResult> {
        self.search_with_generation(text).await.1
    }

    /// Like [`search`](Self::search), also reporting which snapshot generation answered.
    pub async fn search_with_generation(&self, text: &str) -> (Generation, Vec<RankedResult>) {
        if !passes_min_length(text) {
            return (self.cell.generation(), Vec::new());
        }
        self.ensure_fresh().await;
        let (generation, snapshot) = self.cell.load_with_generation();
        (generation, query(&snapshot, text, &self.boosts))
    }
}

impl<S: ContentStore + 'static> SearchService<S> {
    /// Refresh every `period` on a background task, starting immediately. A zero period is
    /// raised to [`MIN_SCHEDULE_PERIOD`].
    pub fn spawn_scheduled_refresh(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let period = period.max(MIN_SCHEDULE_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                service.refresh().await.ok();
            }
        })
    }
}

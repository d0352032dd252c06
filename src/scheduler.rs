//! Background refresh of every cached resource.
//!
//! One ticker task per resource. The first tick fires immediately so the
//! cache is populated at startup. Each tick spawns a refresh run unless the
//! previous run for the same resource is still in flight, in which case the
//! tick is dropped rather than queued. Resources never wait on each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::FetchError;
use crate::normalize::{normalize, Record};
use crate::resources::ResourceType;
use crate::upstream::Upstream;

/// One row of the refresh table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub resource: ResourceType,
    pub interval: Duration,
}

impl RefreshSchedule {
    /// The fixed production table: every cached resource at its own cadence.
    pub fn default_table() -> Vec<RefreshSchedule> {
        ResourceType::CACHED
            .iter()
            .filter_map(|&resource| {
                resource
                    .interval()
                    .map(|interval| RefreshSchedule { resource, interval })
            })
            .collect()
    }
}

/// Per-resource `Idle -> Running -> Idle` flag.
#[derive(Debug, Default)]
pub struct RunGuard {
    running: AtomicBool,
}

impl RunGuard {
    /// Claim the resource for a run. Returns `None` if a run is in flight.
    pub fn try_start(self: &Arc<Self>) -> Option<RunPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                guard: Arc::clone(self),
            })
    }
}

/// Held for the duration of one run; returns the resource to idle on drop,
/// including when the run panics.
#[derive(Debug)]
pub struct RunPermit {
    guard: Arc<RunGuard>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// Outcome of one successful refresh, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Replaced { items: usize },
    Merged { retained: usize, evicted: usize },
}

/// Drives the upstream → normalizer → cache pipeline for every resource.
#[derive(Clone)]
pub struct Scheduler {
    upstream: Arc<dyn Upstream>,
    store: CacheStore,
    table: Vec<RefreshSchedule>,
}

impl Scheduler {
    pub fn new(upstream: Arc<dyn Upstream>, store: CacheStore) -> Self {
        Self::with_table(upstream, store, RefreshSchedule::default_table())
    }

    pub fn with_table(
        upstream: Arc<dyn Upstream>,
        store: CacheStore,
        table: Vec<RefreshSchedule>,
    ) -> Self {
        Scheduler {
            upstream,
            store,
            table,
        }
    }

    /// Fetch, normalize and store one resource. On failure the previous
    /// snapshot is kept and the error is recorded on the slot.
    pub async fn refresh(&self, resource: ResourceType) -> Result<RefreshOutcome, FetchError> {
        let result = self.fetch_normalized(resource).await;
        match result {
            Ok(items) if resource == ResourceType::LiveScores => {
                let stats = self.store.merge_live_matches(items);
                debug!(
                    "Live matches: {} updated, {} new",
                    stats.updated, stats.appended
                );
                if stats.skipped > 0 {
                    debug!("{} live matches without an id were skipped", stats.skipped);
                }
                Ok(RefreshOutcome::Merged {
                    retained: stats.retained,
                    evicted: stats.evicted,
                })
            }
            Ok(items) => {
                let count = items.len();
                self.store.replace(resource, items);
                Ok(RefreshOutcome::Replaced { items: count })
            }
            Err(e) => {
                self.store.record_error(resource, &e);
                Err(e)
            }
        }
    }

    async fn fetch_normalized(&self, resource: ResourceType) -> Result<Vec<Record>, FetchError> {
        let payload = self
            .upstream
            .fetch(resource.endpoint(), resource.params())
            .await?;
        normalize(resource, &payload)
    }

    /// Spawn one ticker task per table entry. The handles run for the life of
    /// the process; aborting one stops that resource's refreshes.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        info!(
            "Scheduler started ({} resources from {})",
            self.table.len(),
            self.upstream.name()
        );
        let this = Arc::new(self);
        this.table
            .iter()
            .map(|entry| {
                let this = Arc::clone(&this);
                let entry = *entry;
                tokio::spawn(async move { this.run_schedule(entry).await })
            })
            .collect()
    }

    async fn run_schedule(self: Arc<Self>, entry: RefreshSchedule) {
        let RefreshSchedule { resource, interval } = entry;
        let guard = Arc::new(RunGuard::default());
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        debug!("Refreshing {} every {:?}", resource, interval);

        loop {
            ticker.tick().await;

            let Some(permit) = guard.try_start() else {
                debug!("Previous {} refresh still running, skipping tick", resource);
                continue;
            };

            let this = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = permit;
                match this.refresh(resource).await {
                    Ok(RefreshOutcome::Replaced { items }) => {
                        debug!("Refreshed {} ({} items)", resource, items);
                    }
                    Ok(RefreshOutcome::Merged { retained, evicted }) => {
                        debug!(
                            "Merged {} ({} retained, {} evicted)",
                            resource, retained, evicted
                        );
                    }
                    Err(e) => {
                        warn!("Refresh of {} failed, keeping previous snapshot: {}", resource, e);
                    }
                }
            });
        }
    }
}

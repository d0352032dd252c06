//! In-memory snapshot store, one slot per cached resource.
//!
//! Each slot is an [`ArcSwap`] cell holding an immutable [`SlotSnapshot`].
//! Readers `load()` the current `Arc` without taking a lock and therefore
//! always see a whole snapshot. The resource's refresh task is the only
//! writer; it builds the next snapshot off to the side and swaps it in with a
//! single atomic store. Nothing here is held across an upstream call.

pub mod live;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ErrorInfo, FetchError};
use crate::normalize::Record;
use crate::resources::ResourceType;

pub use live::LIVE_MATCH_CAP;

/// Immutable view of one slot at a point in time.
#[derive(Debug, Clone, Default)]
pub struct SlotSnapshot {
    pub items: Arc<Vec<Record>>,
    /// `None` until the first successful refresh
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<ErrorInfo>,
    /// Touch stamp per item, parallel to `items`
    touched: Arc<Vec<u64>>,
}

/// Counts from a live-match merge, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub updated: usize,
    pub appended: usize,
    pub evicted: usize,
    pub skipped: usize,
    pub retained: usize,
}

/// Shared handle to every resource slot. Cloning is cheap.
#[derive(Clone)]
pub struct CacheStore {
    slots: Arc<HashMap<ResourceType, ArcSwap<SlotSnapshot>>>,
    touch_clock: Arc<AtomicU64>,
    live_cap: usize,
}

impl CacheStore {
    /// Create a store with one empty slot per cached resource.
    pub fn new() -> Self {
        Self::with_live_cap(LIVE_MATCH_CAP)
    }

    pub fn with_live_cap(live_cap: usize) -> Self {
        let slots = ResourceType::CACHED
            .iter()
            .map(|r| (*r, ArcSwap::from_pointee(SlotSnapshot::default())))
            .collect();
        CacheStore {
            slots: Arc::new(slots),
            touch_clock: Arc::new(AtomicU64::new(1)),
            live_cap,
        }
    }

    fn slot(&self, resource: ResourceType) -> Option<&ArcSwap<SlotSnapshot>> {
        let slot = self.slots.get(&resource);
        if slot.is_none() {
            debug!("No cache slot for request-scoped resource {}", resource);
        }
        slot
    }

    fn stamp(&self) -> u64 {
        self.touch_clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Current items for a resource. Never blocks; an uncached resource reads
    /// as empty.
    pub fn read(&self, resource: ResourceType) -> Arc<Vec<Record>> {
        self.slot(resource)
            .map(|s| Arc::clone(&s.load().items))
            .unwrap_or_default()
    }

    /// Full slot view including freshness and the last error.
    pub fn snapshot(&self, resource: ResourceType) -> Option<Arc<SlotSnapshot>> {
        self.slot(resource).map(|s| s.load_full())
    }

    /// Swap in a whole new collection, marking the slot fresh and clearing
    /// any previous error.
    pub fn replace(&self, resource: ResourceType, items: Vec<Record>) {
        let Some(slot) = self.slot(resource) else {
            return;
        };
        let touched = (0..items.len()).map(|_| self.stamp()).collect();
        slot.store(Arc::new(SlotSnapshot {
            items: Arc::new(items),
            last_updated: Some(Utc::now()),
            last_error: None,
            touched: Arc::new(touched),
        }));
    }

    /// Merge incoming live matches by id into the live-scores slot, keeping at
    /// most the configured number of most recently touched matches.
    pub fn merge_live_matches(&self, matches: Vec<Record>) -> MergeStats {
        let Some(slot) = self.slot(ResourceType::LiveScores) else {
            return MergeStats::default();
        };
        let mut stats = MergeStats::default();
        let now = Utc::now();
        slot.rcu(|current| {
            let merged = live::merge_by_id(
                &current.items,
                &current.touched,
                &matches,
                self.live_cap,
                || self.stamp(),
            );
            stats = MergeStats {
                updated: merged.updated,
                appended: merged.appended,
                evicted: merged.evicted,
                skipped: merged.skipped,
                retained: merged.items.len(),
            };
            SlotSnapshot {
                items: Arc::new(merged.items),
                last_updated: Some(now),
                last_error: None,
                touched: Arc::new(merged.touched),
            }
        });
        stats
    }

    /// Remember a failed refresh without touching the cached items.
    pub fn record_error(&self, resource: ResourceType, err: &FetchError) {
        let Some(slot) = self.slot(resource) else {
            return;
        };
        let info = ErrorInfo::from(err);
        slot.rcu(|current| SlotSnapshot {
            last_error: Some(info.clone()),
            ..(**current).clone()
        });
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicBool;

    fn live_ids(store: &CacheStore) -> Vec<i64> {
        store
            .read(ResourceType::LiveScores)
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_slots_start_empty() {
        let store = CacheStore::new();
        for r in ResourceType::CACHED {
            assert!(store.read(r).is_empty());
            let snap = store.snapshot(r).unwrap();
            assert!(snap.last_updated.is_none());
            assert!(snap.last_error.is_none());
        }
        assert!(store.read(ResourceType::News).is_empty());
        assert!(store.snapshot(ResourceType::News).is_none());
    }

    #[test]
    fn test_replace_sets_items_and_freshness() {
        let store = CacheStore::new();
        let teams = vec![json!({"id": 1, "name": "India"})];
        store.replace(ResourceType::Teams, teams.clone());
        assert_eq!(*store.read(ResourceType::Teams), teams);
        assert!(store.snapshot(ResourceType::Teams).unwrap().last_updated.is_some());
        // Other slots are untouched
        assert!(store.read(ResourceType::Players).is_empty());
    }

    #[test]
    fn test_replace_is_idempotent() {
        let store = CacheStore::new();
        let items = vec![json!({"id": 1}), json!({"id": 2})];
        store.replace(ResourceType::Leagues, items.clone());
        let first = store.read(ResourceType::Leagues);
        store.replace(ResourceType::Leagues, items.clone());
        let second = store.read(ResourceType::Leagues);
        assert_eq!(first, second);
        assert_eq!(*second, items);
    }

    #[test]
    fn test_replace_clears_previous_error() {
        let store = CacheStore::new();
        store.record_error(ResourceType::Seasons, &FetchError::Transport("refused".into()));
        assert!(store.snapshot(ResourceType::Seasons).unwrap().last_error.is_some());
        store.replace(ResourceType::Seasons, vec![json!({"id": 1})]);
        assert!(store.snapshot(ResourceType::Seasons).unwrap().last_error.is_none());
    }

    #[test]
    fn test_record_error_preserves_items() {
        let store = CacheStore::new();
        store.replace(ResourceType::Officials, vec![json!({"id": 9, "name": "X"})]);
        let before = store.snapshot(ResourceType::Officials).unwrap().last_updated;

        store.record_error(
            ResourceType::Officials,
            &FetchError::Status {
                status: 500,
                message: "Internal Server Error".into(),
            },
        );

        assert_eq!(
            *store.read(ResourceType::Officials),
            vec![json!({"id": 9, "name": "X"})]
        );
        let snap = store.snapshot(ResourceType::Officials).unwrap();
        assert_eq!(snap.last_error.as_ref().unwrap().status, Some(500));
        assert_eq!(snap.last_updated, before);
    }

    #[test]
    fn test_merge_live_matches_update_and_append() {
        let store = CacheStore::new();
        store.merge_live_matches(vec![json!({"id": 1, "score": "A"})]);
        let stats = store.merge_live_matches(vec![
            json!({"id": 1, "score": "B"}),
            json!({"id": 2, "score": "C"}),
        ]);
        assert_eq!(
            *store.read(ResourceType::LiveScores),
            vec![json!({"id": 1, "score": "B"}), json!({"id": 2, "score": "C"})]
        );
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.appended, 1);
        assert_eq!(stats.retained, 2);
    }

    #[test]
    fn test_live_window_bounded_to_cap() {
        let store = CacheStore::new();
        for id in 1..=15 {
            store.merge_live_matches(vec![json!({"id": id})]);
            assert!(store.read(ResourceType::LiveScores).len() <= LIVE_MATCH_CAP);
        }
        let ids = live_ids(&store);
        assert_eq!(ids.len(), 10);
        assert_eq!(ids, (6..=15).collect::<Vec<_>>());
    }

    #[test]
    fn test_least_recently_updated_evicted_first() {
        let store = CacheStore::new();
        for id in 1..=10 {
            store.merge_live_matches(vec![json!({"id": id})]);
        }
        // Match 1 is still being played; match 2 has gone quiet
        store.merge_live_matches(vec![json!({"id": 1, "runs": 150})]);
        store.merge_live_matches(vec![json!({"id": 11})]);

        let ids = live_ids(&store);
        assert_eq!(ids.len(), 10);
        assert!(ids.contains(&1));
        assert!(!ids.contains(&2));
    }

    #[test]
    fn test_merge_after_replace_still_bounded() {
        let store = CacheStore::with_live_cap(3);
        store.replace(
            ResourceType::LiveScores,
            vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})],
        );
        store.merge_live_matches(vec![json!({"id": 4})]);
        assert_eq!(live_ids(&store), vec![2, 3, 4]);
    }

    #[test]
    fn test_concurrent_reads_never_torn() {
        const ITEMS: usize = 64;
        let store = CacheStore::new();
        let generation = |g: u64| -> Vec<Record> {
            (0..ITEMS).map(|i| json!({"id": i, "gen": g})).collect()
        };
        store.replace(ResourceType::Fixtures, generation(0));
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let items = store.read(ResourceType::Fixtures);
                        assert_eq!(items.len(), ITEMS);
                        let gen = items[0]["gen"].clone();
                        assert!(items.iter().all(|r| r["gen"] == gen), "torn snapshot");
                    }
                });
            }
            s.spawn(|| {
                for g in 1..=500 {
                    store.replace(ResourceType::Fixtures, generation(g));
                }
                done.store(true, Ordering::Release);
            });
        });

        assert_eq!(store.read(ResourceType::Fixtures)[0]["gen"], 500);
    }
}

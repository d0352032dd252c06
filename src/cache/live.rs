//! Merge-by-id with a bounded window for the live-match slot.
//!
//! Live scores arrive incrementally, and a match can drop out of the
//! upstream's "live" list a poll or two before the frontend should stop
//! showing it. Merging keeps recently active matches around; the cap keeps
//! the slot small.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::normalize::Record;

/// Maximum number of live matches retained.
pub const LIVE_MATCH_CAP: usize = 10;

/// Key a match by its `id` field. Numeric and string ids are both accepted
/// and never collide: `1` and `"1"` are different matches.
pub fn match_key(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::Number(n) => Some(format!("n:{}", n)),
        Value::String(s) if !s.is_empty() => Some(format!("s:{}", s)),
        _ => None,
    }
}

/// Result of merging a batch of incoming matches into the current window.
#[derive(Debug, Default)]
pub struct Merged {
    pub items: Vec<Record>,
    /// Touch stamp per item, parallel to `items`
    pub touched: Vec<u64>,
    pub updated: usize,
    pub appended: usize,
    pub evicted: usize,
    /// Incoming records without a usable id
    pub skipped: usize,
}

/// Update matches in place by id or append new ones, then evict the
/// least-recently-touched entries until at most `cap` remain.
///
/// `next_stamp` hands out monotonically increasing touch stamps.
pub fn merge_by_id(
    items: &[Record],
    touched: &[u64],
    incoming: &[Record],
    cap: usize,
    mut next_stamp: impl FnMut() -> u64,
) -> Merged {
    let mut out = Merged {
        items: items.to_vec(),
        touched: touched.to_vec(),
        ..Default::default()
    };
    // Slots written by `replace` may lack stamps; treat those as oldest.
    out.touched.resize(out.items.len(), 0);

    let mut index: HashMap<String, usize> = out
        .items
        .iter()
        .enumerate()
        .filter_map(|(i, r)| match_key(r).map(|k| (k, i)))
        .collect();

    for record in incoming {
        let Some(key) = match_key(record) else {
            out.skipped += 1;
            continue;
        };
        let stamp = next_stamp();
        match index.get(&key) {
            Some(&i) => {
                out.items[i] = record.clone();
                out.touched[i] = stamp;
                out.updated += 1;
            }
            None => {
                index.insert(key, out.items.len());
                out.items.push(record.clone());
                out.touched.push(stamp);
                out.appended += 1;
            }
        }
    }

    if out.items.len() > cap {
        let excess = out.items.len() - cap;
        let mut by_age: Vec<usize> = (0..out.items.len()).collect();
        // Stable: equal stamps evict front-first
        by_age.sort_by_key(|&i| out.touched[i]);
        let evict: HashSet<usize> = by_age.into_iter().take(excess).collect();

        let (items, touched): (Vec<_>, Vec<_>) = std::mem::take(&mut out.items)
            .into_iter()
            .zip(std::mem::take(&mut out.touched))
            .enumerate()
            .filter(|(i, _)| !evict.contains(i))
            .map(|(_, pair)| pair)
            .unzip();
        out.items = items;
        out.touched = touched;
        out.evicted = excess;
    }

    out
}

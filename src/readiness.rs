//! FEC set readiness and block level batch statistics.
//!
//! A FEC set is reconstructible once roughly half of its shreds arrived. The
//! threshold is `set_size / 2` rounded half to even, so a set of 5 needs 2
//! shreds and a set of 3 needs 2. Sets whose size is never declared (no row
//! with a non-zero data shred count) are left out of everything here.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::event::{group_by_fec_set, ReceiptEvent, Timestamp};

/// Shreds needed to reconstruct a set of `set_size`: half of it, rounded
/// half to even.
pub fn required_fragments(set_size: u32) -> usize {
    let half = (set_size / 2) as usize;
    if set_size % 2 == 0 || half % 2 == 0 {
        half
    } else {
        half + 1
    }
}

/// Per-set outcome, one row per evaluable FEC set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub fec_set_id: u32,
    pub set_size: u32,
    /// Distinct shreds needed before the set counts as ready. At least 1.
    pub required: usize,
    pub unique_received: usize,
    pub total_received: usize,
    pub ready_at: Option<Timestamp>,
}

impl BatchSummary {
    pub fn is_ready(&self) -> bool {
        self.ready_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationSummary {
    pub mean_micros: f64,
    pub min_micros: i64,
    pub max_micros: i64,
}

/// Aggregates over the evaluable FEC sets of a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockStats {
    pub evaluable_sets: usize,
    /// First to last receipt per set. `None` when no set had a usable
    /// timestamp.
    pub batch_duration: Option<DurationSummary>,
    pub total_events: usize,
    pub unique_fragments: usize,
    pub duplicates: usize,
    pub repair_events: usize,
}

impl BlockStats {
    /// False when the block had no FEC set with a declared size.
    pub fn has_data(&self) -> bool {
        self.evaluable_sets > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadinessReport {
    pub ready: BTreeMap<u32, Timestamp>,
    pub batches: Vec<BatchSummary>,
    pub stats: BlockStats,
}

/// Find when each FEC set of one block crossed its reconstruction threshold.
///
/// Readiness follows first-arrival order: the earliest timestamp of every
/// distinct shred, ascending. The set is ready at the `required`-th of them.
/// Raw totals count rows with unusable timestamps; readiness and durations
/// do not.
pub fn detect_readiness(events: &[ReceiptEvent]) -> ReadinessReport {
    let mut report = ReadinessReport::default();
    let mut durations = Vec::new();

    for (fec_set_id, group) in group_by_fec_set(events) {
        let Some(set_size) = group.iter().rev().find_map(|ev| ev.set_size()) else {
            warn!(fec_set_id, events = group.len(), "FEC set has no declared size, skipping");
            continue;
        };

        let unique: HashSet<u32> = group.iter().map(|ev| ev.fragment_id).collect();
        let mut first_arrivals: HashMap<u32, Timestamp> = HashMap::new();
        let mut span: Option<(Timestamp, Timestamp)> = None;
        for ev in &group {
            let Some(ts) = ev.timestamp else { continue };
            first_arrivals
                .entry(ev.fragment_id)
                .and_modify(|first| *first = (*first).min(ts))
                .or_insert(ts);
            span = Some(span.map_or((ts, ts), |(lo, hi)| (lo.min(ts), hi.max(ts))));
        }
        let mut order: Vec<Timestamp> = first_arrivals.into_values().collect();
        order.sort_unstable();

        let required = required_fragments(set_size).max(1);
        let ready_at = order.get(required - 1).copied();
        if let Some(ts) = ready_at {
            report.ready.insert(fec_set_id, ts);
        }
        if let Some((lo, hi)) = span {
            durations.push(hi.micros_since(lo));
        }

        let stats = &mut report.stats;
        stats.evaluable_sets += 1;
        stats.total_events += group.len();
        stats.unique_fragments += unique.len();
        stats.repair_events += group.iter().filter(|ev| ev.channel.is_repair()).count();

        report.batches.push(BatchSummary {
            fec_set_id,
            set_size,
            required,
            unique_received: unique.len(),
            total_received: group.len(),
            ready_at,
        });
    }

    let stats = &mut report.stats;
    stats.duplicates = stats.total_events - stats.unique_fragments;
    stats.batch_duration = summarize(&durations);
    report
}

fn summarize(durations: &[i64]) -> Option<DurationSummary> {
    let min_micros = *durations.iter().min()?;
    let max_micros = *durations.iter().max()?;
    let total: i128 = durations.iter().map(|d| *d as i128).sum();
    Some(DurationSummary {
        mean_micros: total as f64 / durations.len() as f64,
        min_micros,
        max_micros,
    })
}

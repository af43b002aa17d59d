//! Per-FEC-set accumulation of unique shreds over time.
//!
//! Each FEC set's events are sorted by timestamp (stable, so ties keep log
//! order) and consumed one timestamp bucket at a time. A bucket adds the
//! number of shred ids it introduces to the running count and yields exactly
//! one [`TimelinePoint`], however many events landed in it. Every arrival of
//! an already seen shred id is recorded as a [`DuplicateArrival`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::event::{group_by_fec_set, Channel, ReceiptEvent, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub timestamp: Timestamp,
    /// Unique shreds of the set received up to and including this bucket.
    pub cumulative: usize,
}

/// Strictly increasing in timestamp, non-decreasing in count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FecSetTimeline {
    points: Vec<TimelinePoint>,
}

impl FecSetTimeline {
    pub fn points(&self) -> &[TimelinePoint] {
        &self.points
    }

    /// Cumulative count recorded for exactly this bucket, if any.
    pub fn count_at(&self, timestamp: Timestamp) -> Option<usize> {
        self.points
            .binary_search_by_key(&timestamp, |p| p.timestamp)
            .ok()
            .map(|i| self.points[i].cumulative)
    }

    pub fn unique_fragments(&self) -> usize {
        self.points.last().map_or(0, |p| p.cumulative)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Identifies one shred within a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentKey {
    pub fec_set_id: u32,
    pub fragment_id: u32,
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.fec_set_id, self.fragment_id)
    }
}

// Serialized as a string so it can key a JSON object.
impl Serialize for FragmentKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateArrival {
    pub timestamp: Timestamp,
    /// The set's cumulative unique count after this arrival's bucket.
    pub cumulative: usize,
    pub channel: Channel,
}

/// Every arrival of a shred after its first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    /// Channel the shred first arrived on.
    pub first_channel: Channel,
    pub arrivals: Vec<DuplicateArrival>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub timelines: BTreeMap<u32, FecSetTimeline>,
    pub duplicates: BTreeMap<FragmentKey, DuplicateRecord>,
}

impl Progress {
    /// Total duplicate arrivals across all shreds.
    pub fn duplicate_arrivals(&self) -> usize {
        self.duplicates.values().map(|d| d.arrivals.len()).sum()
    }
}

/// Build unique-shred timelines and duplicate records for one block's events.
/// Events without a usable timestamp are ignored.
pub fn track(events: &[ReceiptEvent]) -> Progress {
    let mut progress = Progress::default();
    for (fec_set_id, group) in group_by_fec_set(events) {
        let timeline = track_fec_set(fec_set_id, &group, &mut progress.duplicates);
        if !timeline.is_empty() {
            progress.timelines.insert(fec_set_id, timeline);
        }
    }
    progress
}

fn track_fec_set(
    fec_set_id: u32,
    group: &[&ReceiptEvent],
    duplicates: &mut BTreeMap<FragmentKey, DuplicateRecord>,
) -> FecSetTimeline {
    let mut timed: Vec<(Timestamp, &ReceiptEvent)> = group
        .iter()
        .filter_map(|ev| ev.timestamp.map(|ts| (ts, *ev)))
        .collect();
    timed.sort_by_key(|(ts, _)| *ts);

    let mut first_channel: HashMap<u32, &Channel> = HashMap::new();
    let mut cumulative = 0usize;
    let mut points = Vec::new();

    for bucket in timed.chunk_by(|a, b| a.0 == b.0) {
        let timestamp = bucket[0].0;
        let mut repeats = Vec::new();
        for (_, ev) in bucket {
            if first_channel.contains_key(&ev.fragment_id) {
                repeats.push(*ev);
            } else {
                first_channel.insert(ev.fragment_id, &ev.channel);
                cumulative += 1;
            }
        }
        points.push(TimelinePoint {
            timestamp,
            cumulative,
        });

        for ev in repeats {
            let key = FragmentKey {
                fec_set_id,
                fragment_id: ev.fragment_id,
            };
            duplicates
                .entry(key)
                .or_insert_with(|| DuplicateRecord {
                    first_channel: Channel::clone(first_channel[&ev.fragment_id]),
                    arrivals: Vec::new(),
                })
                .arrivals
                .push(DuplicateArrival {
                    timestamp,
                    cumulative,
                    channel: ev.channel.clone(),
                });
        }
    }

    FecSetTimeline { points }
}

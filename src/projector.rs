//! Map readiness timestamps onto the unique-shred timelines.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use crate::error::{Result, ShredscopeError};
use crate::event::Timestamp;
use crate::progress::FecSetTimeline;

/// What to do with a ready set whose timeline has no point at the readiness
/// bucket. This only happens when the two were computed with different
/// bucket widths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Abort the projection with [`ShredscopeError::ProjectionMismatch`].
    #[default]
    Fail,
    /// Skip the point and log a warning.
    Drop,
}

impl FromStr for MismatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "drop" => Ok(Self::Drop),
            other => Err(format!("unknown mismatch policy '{other}', expected fail or drop")),
        }
    }
}

impl fmt::Display for MismatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fail => "fail",
            Self::Drop => "drop",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadyPoint {
    pub fec_set_id: u32,
    pub timestamp: Timestamp,
    pub cumulative: usize,
}

/// Pair each readiness timestamp with the cumulative count its set's timeline
/// holds for that exact bucket. Output is ordered by FEC set id.
pub fn project(
    ready: &BTreeMap<u32, Timestamp>,
    timelines: &BTreeMap<u32, FecSetTimeline>,
    policy: MismatchPolicy,
) -> Result<Vec<ReadyPoint>> {
    let mut points = Vec::with_capacity(ready.len());
    for (&fec_set_id, &timestamp) in ready {
        let count = timelines.get(&fec_set_id).and_then(|t| t.count_at(timestamp));
        match (count, policy) {
            (Some(cumulative), _) => points.push(ReadyPoint {
                fec_set_id,
                timestamp,
                cumulative,
            }),
            (None, MismatchPolicy::Fail) => {
                return Err(ShredscopeError::ProjectionMismatch {
                    fec_set_id,
                    timestamp,
                })
            }
            (None, MismatchPolicy::Drop) => {
                warn!(fec_set_id, %timestamp, "no timeline point at readiness bucket, dropping");
            }
        }
    }
    Ok(points)
}

//! Typed representation of one shred receipt log line.
//!
//! Lines are colon-delimited, one receipt per line:
//!
//! ```text
//! type:block_id:fragment_id:fec_set_id:data_fragments:set_size:timestamp_us
//! ```
//!
//! The trailing timestamp may be missing or non-numeric; such rows still parse
//! but carry no usable [`Timestamp`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShredscopeError};

/// Field separator of the receipt log.
pub const FIELD_DELIMITER: char = ':';
/// Channel tag written for shreds received through normal propagation.
pub const PROPAGATION_TAG: &str = "SHRED_RX";
/// Channel tag written for shreds received through repair.
pub const REPAIR_TAG: &str = "REPAIR_RX";

const MIN_FIELDS: usize = 6;
const MAX_FIELDS: usize = 7;

/// How a shred arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Propagation,
    Repair,
    /// Any tag this tool does not know about, kept verbatim.
    Other(String),
}

impl Channel {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            PROPAGATION_TAG => Channel::Propagation,
            REPAIR_TAG => Channel::Repair,
            other => Channel::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Channel::Propagation => PROPAGATION_TAG,
            Channel::Repair => REPAIR_TAG,
            Channel::Other(tag) => tag,
        }
    }

    pub fn is_repair(&self) -> bool {
        matches!(self, Channel::Repair)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Round to the nearest multiple of `bucket`. Exact halves go to the even
    /// multiple.
    pub fn round_to(self, bucket: BucketWidth) -> Self {
        let width = bucket.as_micros() as i128;
        let t = self.0 as i128;
        let quotient = t.div_euclid(width);
        let floor = quotient * width;
        let rounded = match (2 * t.rem_euclid(width)).cmp(&width) {
            Ordering::Less => floor,
            Ordering::Greater => floor + width,
            Ordering::Equal if quotient.rem_euclid(2) == 0 => floor,
            Ordering::Equal => floor + width,
        };
        Self(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Signed distance in microseconds from `earlier` to `self`.
    pub fn micros_since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6fZ")),
            None => write!(f, "{}us", self.0),
        }
    }
}

/// Width of the time bucket receipt timestamps are rounded to. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketWidth(NonZeroU64);

impl BucketWidth {
    pub const MICROSECOND: BucketWidth = BucketWidth(NonZeroU64::MIN);

    pub fn from_micros(micros: u64) -> Result<Self> {
        NonZeroU64::new(micros)
            .map(Self)
            .ok_or_else(|| ShredscopeError::Config("time bucket width must be non-zero".into()))
    }

    pub fn as_micros(self) -> u64 {
        self.0.get()
    }
}

/// One observed shred arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEvent {
    pub channel: Channel,
    pub block_id: u64,
    pub fragment_id: u32,
    pub fec_set_id: u32,
    /// Non-zero only on rows that also carry an authoritative set size.
    pub declared_data_fragments: u32,
    /// Data plus coding shreds in the FEC set. Meaningful only when
    /// `declared_data_fragments != 0`.
    pub declared_set_size: u32,
    /// `None` when the timestamp column was missing or non-numeric.
    pub timestamp: Option<Timestamp>,
}

impl ReceiptEvent {
    /// Parse one log line. Returns `None` for malformed rows: wrong field
    /// count or a non-integer in any of the integer columns before the
    /// timestamp.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        if fields.len() < MIN_FIELDS || fields.len() > MAX_FIELDS {
            return None;
        }
        Some(Self {
            channel: Channel::from_tag(fields[0].trim()),
            block_id: fields[1].trim().parse().ok()?,
            fragment_id: fields[2].trim().parse().ok()?,
            fec_set_id: fields[3].trim().parse().ok()?,
            declared_data_fragments: fields[4].trim().parse().ok()?,
            declared_set_size: fields[5].trim().parse().ok()?,
            timestamp: fields
                .get(6)
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .map(Timestamp::from_micros),
        })
    }

    /// The declared FEC set size, if this row is authoritative for it.
    pub fn set_size(&self) -> Option<u32> {
        (self.declared_data_fragments != 0).then_some(self.declared_set_size)
    }

    /// Round the timestamp (if any) to `bucket`.
    pub fn bucketed(mut self, bucket: BucketWidth) -> Self {
        self.timestamp = self.timestamp.map(|t| t.round_to(bucket));
        self
    }
}

/// Events of one block partitioned by FEC set, each group in log order.
pub type FecSetGroups<'a> = BTreeMap<u32, Vec<&'a ReceiptEvent>>;

/// Partition `events` by `fec_set_id`, keeping log order inside each group.
pub fn group_by_fec_set(events: &[ReceiptEvent]) -> FecSetGroups<'_> {
    let mut groups: FecSetGroups<'_> = BTreeMap::new();
    for ev in events {
        groups.entry(ev.fec_set_id).or_default().push(ev);
    }
    groups
}

/// Extract only the block id (second field) from a raw line.
pub fn parse_block_id(line: &[u8]) -> Option<u64> {
    let field = line.split(|b| *b == FIELD_DELIMITER as u8).nth(1)?;
    std::str::from_utf8(field).ok()?.trim().parse().ok()
}

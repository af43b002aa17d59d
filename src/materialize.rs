//! Decode the receipt events of one block from an indexed byte range.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::block_indexer::ByteRange;
use crate::error::Result;
use crate::event::{BucketWidth, ReceiptEvent};

/// Read exactly `range` from `reader` and return the events of `block_id`
/// found there, in log order, with timestamps rounded to `bucket`.
///
/// The range may contain lines of other blocks; those are filtered out.
/// Invalid UTF-8 is replaced rather than rejected and malformed lines are
/// dropped. Rows with an unusable timestamp are kept with `timestamp: None`.
pub fn load_block<R: Read + Seek>(
    mut reader: R,
    range: ByteRange,
    block_id: u64,
    bucket: BucketWidth,
) -> Result<Vec<ReceiptEvent>> {
    reader.seek(SeekFrom::Start(range.start))?;
    let mut raw = vec![0u8; range.len() as usize];
    reader.read_exact(&mut raw)?;

    let text = String::from_utf8_lossy(&raw);
    let mut lines = 0usize;
    let events: Vec<ReceiptEvent> = text
        .lines()
        .inspect(|_| lines += 1)
        .filter_map(ReceiptEvent::parse_line)
        .filter(|ev| ev.block_id == block_id)
        .map(|ev| ev.bucketed(bucket))
        .collect();

    debug!(
        block_id,
        start = range.start,
        end = range.end,
        lines,
        events = events.len(),
        "materialized block"
    );
    Ok(events)
}

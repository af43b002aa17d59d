//! Byte-range index from block id to the region of the log holding its lines.
//!
//! Built with one forward scan. Blocks need not be contiguous in the log, so a
//! range is only a containment superset: it starts at the first line seen for
//! the block and grows forward to the end of the latest line seen for it,
//! swallowing any interleaved lines of other blocks on the way.

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::event::parse_block_id;

/// Half-open byte range `[start, end)` in the source log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Half-open range of line numbers (0-based) taken into account while
/// indexing. Lines outside the window are read past but never indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineWindow {
    pub start: usize,
    pub end: Option<usize>,
}

impl LineWindow {
    pub const fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Every line of the file, header included.
    pub const fn all() -> Self {
        Self::new(0, None)
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && self.end.map_or(true, |end| line < end)
    }

    fn exhausted(&self, line: usize) -> bool {
        self.end.is_some_and(|end| line >= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockIndex {
    entries: BTreeMap<u64, ByteRange>,
    lines_indexed: usize,
    lines_skipped: usize,
}

impl BlockIndex {
    pub fn get(&self, block_id: u64) -> Option<ByteRange> {
        self.entries.get(&block_id).copied()
    }

    /// Block ids in ascending order.
    pub fn block_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, ByteRange)> + '_ {
        self.entries.iter().map(|(id, range)| (*id, *range))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lines inside the window whose block id parsed.
    pub fn lines_indexed(&self) -> usize {
        self.lines_indexed
    }

    /// Number of lines inside the window dropped as malformed.
    pub fn lines_skipped(&self) -> usize {
        self.lines_skipped
    }
}

/// Scan `reader` once and record, per block id, the byte range covering all
/// of its lines within `window`.
///
/// Only the block id column is parsed. Lines where it is missing or
/// non-numeric are skipped. An empty input yields an empty index.
pub fn build_index<R: BufRead>(mut reader: R, window: LineWindow) -> Result<BlockIndex> {
    let mut index = BlockIndex::default();
    let mut line = Vec::new();
    let mut pos = 0u64;
    let mut line_no = 0usize;

    while !window.exhausted(line_no) {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        let before = pos;
        pos += read as u64;
        let current = line_no;
        line_no += 1;

        if !window.contains(current) {
            continue;
        }
        let Some(block_id) = parse_block_id(&line) else {
            index.lines_skipped += 1;
            continue;
        };
        index.lines_indexed += 1;
        index
            .entries
            .entry(block_id)
            .and_modify(|range| range.end = pos)
            .or_insert(ByteRange { start: before, end: pos });
    }

    debug!(
        blocks = index.len(),
        lines_indexed = index.lines_indexed,
        lines_skipped = index.lines_skipped,
        bytes = pos,
        "built block index"
    );
    Ok(index)
}

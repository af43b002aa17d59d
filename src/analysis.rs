//! Query facade: index a receipt log once, then analyze blocks on demand.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::block_indexer::{build_index, BlockIndex};
use crate::config::AnalysisConfig;
use crate::error::{Result, ShredscopeError};
use crate::event::{BucketWidth, ReceiptEvent};
use crate::materialize::load_block;
use crate::progress::{track, DuplicateRecord, FecSetTimeline, FragmentKey};
use crate::projector::{project, MismatchPolicy, ReadyPoint};
use crate::readiness::{detect_readiness, BatchSummary, BlockStats};

/// Everything the presentation layer needs to draw one block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockAnalysis {
    pub block_id: u64,
    pub bucket_micros: u64,
    /// Rows of this block, including ones with unusable timestamps.
    pub events: usize,
    pub timelines: BTreeMap<u32, FecSetTimeline>,
    pub duplicates: BTreeMap<FragmentKey, DuplicateRecord>,
    pub ready_points: Vec<ReadyPoint>,
    pub batches: Vec<BatchSummary>,
    pub stats: BlockStats,
}

/// Run tracking, readiness detection and projection over the events of one
/// block. `events` must already be rounded to `bucket`.
pub fn analyze_events(
    block_id: u64,
    bucket: BucketWidth,
    events: &[ReceiptEvent],
    policy: MismatchPolicy,
) -> Result<BlockAnalysis> {
    let progress = track(events);
    let readiness = detect_readiness(events);
    let ready_points = project(&readiness.ready, &progress.timelines, policy)?;
    Ok(BlockAnalysis {
        block_id,
        bucket_micros: bucket.as_micros(),
        events: events.len(),
        timelines: progress.timelines,
        duplicates: progress.duplicates,
        ready_points,
        batches: readiness.batches,
        stats: readiness.stats,
    })
}

/// A receipt log with its block index.
///
/// The index is immutable once built and every query opens its own file
/// handle, so a shared `SlotLog` can serve blocks from several threads.
#[derive(Debug, Clone)]
pub struct SlotLog {
    path: PathBuf,
    index: BlockIndex,
    config: AnalysisConfig,
}

impl SlotLog {
    /// Open `path` and index it within `config.window`.
    pub fn open<P: AsRef<Path>>(path: P, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let file = File::open(path.as_ref())?;
        let index = build_index(BufReader::new(file), config.window)?;
        Ok(Self::with_index(path, index, config))
    }

    /// Wrap an index the caller built from the file at `path`.
    pub fn with_index<P: AsRef<Path>>(path: P, index: BlockIndex, config: AnalysisConfig) -> Self {
        info!(path = %path.as_ref().display(), blocks = index.len(), "receipt log indexed");
        Self {
            path: path.as_ref().to_path_buf(),
            index,
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> &BlockIndex {
        &self.index
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Events of `block_id`, timestamps rounded to `bucket`.
    pub fn load_block(&self, block_id: u64, bucket: BucketWidth) -> Result<Vec<ReceiptEvent>> {
        let range = self
            .index
            .get(block_id)
            .ok_or(ShredscopeError::UnknownBlock(block_id))?;
        let file = File::open(&self.path)?;
        load_block(file, range, block_id, bucket)
    }

    /// Analyze `block_id` with the configured bucket width and policy.
    pub fn analyze(&self, block_id: u64) -> Result<BlockAnalysis> {
        self.analyze_with(block_id, self.config.bucket, self.config.on_mismatch)
    }

    pub fn analyze_with(
        &self,
        block_id: u64,
        bucket: BucketWidth,
        policy: MismatchPolicy,
    ) -> Result<BlockAnalysis> {
        let events = self.load_block(block_id, bucket)?;
        analyze_events(block_id, bucket, &events, policy)
    }
}

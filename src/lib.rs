//! Shred receipt log analysis.
//!
//! Indexes a colon-delimited receipt log by block, then turns one block's
//! receipts into per-FEC-set unique-shred timelines, duplicate arrivals,
//! readiness timestamps and batch statistics.

pub mod analysis;
pub mod block_indexer;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod io_utils;
pub mod materialize;
pub mod progress;
pub mod projector;
pub mod readiness;

pub use analysis::{analyze_events, BlockAnalysis, SlotLog};
pub use block_indexer::{build_index, BlockIndex, ByteRange, LineWindow};
pub use config::AnalysisConfig;
pub use error::{Result, ShredscopeError};
pub use event::{
    group_by_fec_set, parse_block_id, BucketWidth, Channel, ReceiptEvent, Timestamp,
    PROPAGATION_TAG, REPAIR_TAG,
};
pub use export::{write_csv, write_json};
pub use materialize::load_block;
pub use progress::{
    track, DuplicateArrival, DuplicateRecord, FecSetTimeline, FragmentKey, Progress,
    TimelinePoint,
};
pub use projector::{project, MismatchPolicy, ReadyPoint};
pub use readiness::{
    detect_readiness, required_fragments, BatchSummary, BlockStats, DurationSummary,
    ReadinessReport,
};

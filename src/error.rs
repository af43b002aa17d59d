use thiserror::Error;

use crate::event::Timestamp;

#[derive(Error, Debug)]
pub enum ShredscopeError {
    /// Invalid runtime configuration (zero bucket width, empty line window).
    #[error("config error: {0}")]
    Config(String),

    /// Requested block id was never seen while building the index.
    #[error("block {0} is not present in the index")]
    UnknownBlock(u64),

    /// A ready FEC set has no timeline point at its readiness bucket.
    #[error("FEC set {fec_set_id} is ready at {timestamp} but its timeline has no point there")]
    ProjectionMismatch { fec_set_id: u32, timestamp: Timestamp },

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure writing an export file.
    #[error("export error: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, ShredscopeError>;

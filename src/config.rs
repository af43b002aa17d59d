use crate::block_indexer::LineWindow;
use crate::error::{Result, ShredscopeError};
use crate::event::BucketWidth;
use crate::projector::MismatchPolicy;

/// Runtime parameters for indexing and per-block analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Lines of the log taken into account. Line 0 is the header.
    pub window: LineWindow,
    /// Width receipt timestamps are rounded to.
    pub bucket: BucketWidth,
    /// Projection behaviour when readiness and timelines disagree.
    pub on_mismatch: MismatchPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: LineWindow::new(1, None),
            bucket: BucketWidth::MICROSECOND,
            on_mismatch: MismatchPolicy::Fail,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(end) = self.window.end {
            if end <= self.window.start {
                return Err(ShredscopeError::Config(format!(
                    "line window [{}, {}) is empty",
                    self.window.start, end
                )));
            }
        }
        Ok(())
    }
}

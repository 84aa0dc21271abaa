use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::pipeline::composite_executor::{CompositeExecutor, CompositeJob};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::{PipelineError, Stage};

/// Composites frames one at a time, in index order, on the calling thread.
pub struct SequentialCompositeExecutor;

impl SequentialCompositeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialCompositeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeExecutor for SequentialCompositeExecutor {
    fn execute(
        &self,
        job: &CompositeJob<'_>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, PipelineError> {
        let total = job.frames.len();
        for index in job.frames.indices() {
            if job.cancelled.load(Ordering::Relaxed) {
                return Err(PipelineError::Cancelled);
            }
            let started = Instant::now();
            job.composite_one(index)?;
            logger.timing("composite_frame", started.elapsed().as_secs_f64() * 1000.0);
            logger.progress(Stage::Compositing, index + 1, total);
        }
        Ok(total)
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::pipeline::composite_executor::{CompositeExecutor, CompositeJob};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::{PipelineError, Stage};

const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// Outcome of one frame: its index, the result and how long it took (ms).
type FrameOutcome = (usize, Result<(), PipelineError>, f64);

/// Composites frames on a pool of scoped worker threads.
///
/// Layout: `feeder → [index queue] → N workers → [outcomes] → calling thread`
///
/// The feeder hands out indices over a bounded channel so at most a few
/// frames per worker are in flight. A failing worker raises a shared stop
/// flag so no new frames are started. Outcomes are gathered on the calling
/// thread, which owns the logger. Completion order is arbitrary; each
/// frame is written back under its own index, so assembly order is not
/// affected.
pub struct ThreadedCompositeExecutor {
    workers: usize,
}

impl ThreadedCompositeExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ThreadedCompositeExecutor {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }
}

impl CompositeExecutor for ThreadedCompositeExecutor {
    fn execute(
        &self,
        job: &CompositeJob<'_>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, PipelineError> {
        let total = job.frames.len();
        let workers = self.workers.min(total.max(1));
        logger.metric("composite_workers", workers as f64);

        let stop = AtomicBool::new(false);

        let (completed, first_error) = std::thread::scope(|s| {
            let (index_tx, index_rx) =
                crossbeam_channel::bounded::<usize>(workers * QUEUE_DEPTH_PER_WORKER);
            let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded::<FrameOutcome>();

            let feeder = s.spawn(|| {
                for index in job.frames.indices() {
                    if stop.load(Ordering::Relaxed) || job.cancelled.load(Ordering::Relaxed) {
                        break;
                    }
                    if index_tx.send(index).is_err() {
                        break;
                    }
                }
                drop(index_tx);
            });

            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let index_rx = index_rx.clone();
                    let outcome_tx = outcome_tx.clone();
                    let stop = &stop;
                    s.spawn(move || {
                        for index in index_rx {
                            if stop.load(Ordering::Relaxed)
                                || job.cancelled.load(Ordering::Relaxed)
                            {
                                break;
                            }
                            let started = Instant::now();
                            let result = job.composite_one(index);
                            let ms = started.elapsed().as_secs_f64() * 1000.0;
                            if result.is_err() {
                                stop.store(true, Ordering::Relaxed);
                            }
                            if outcome_tx.send((index, result, ms)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(index_rx);
            drop(outcome_tx);

            let (completed, mut first_error) = collect_outcomes(outcome_rx, total, logger);

            if feeder.join().is_err() && first_error.is_none() {
                first_error = Some(PipelineError::Io("frame feeder thread panicked".into()));
            }
            for handle in handles {
                if handle.join().is_err() && first_error.is_none() {
                    first_error = Some(PipelineError::Io("compositing worker panicked".into()));
                }
            }
            (completed, first_error)
        });

        if let Some(e) = first_error {
            return Err(e);
        }
        if job.cancelled.load(Ordering::Relaxed) || completed < total {
            return Err(PipelineError::Cancelled);
        }
        Ok(completed)
    }
}

/// Drains worker outcomes until every worker has exited, keeping the first
/// error received.
fn collect_outcomes(
    outcome_rx: crossbeam_channel::Receiver<FrameOutcome>,
    total: usize,
    logger: &mut dyn PipelineLogger,
) -> (usize, Option<PipelineError>) {
    let mut completed = 0;
    let mut first_error = None;

    for (index, result, ms) in outcome_rx {
        match result {
            Ok(()) => {
                completed += 1;
                logger.timing("composite_frame", ms);
                logger.progress(Stage::Compositing, completed, total);
            }
            Err(e) => {
                if first_error.is_none() {
                    log::debug!("Compositing frame {index} failed: {e}");
                    first_error = Some(e);
                }
            }
        }
    }

    (completed, first_error)
}

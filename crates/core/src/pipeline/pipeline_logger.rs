use std::collections::HashMap;
use std::time::Instant;

use crate::shared::error::Stage;

/// Injected sink for pipeline orchestration events.
///
/// Each stage reports through the logger it is handed instead of touching
/// process-wide state, so the CLI, an embedding service and tests can each
/// observe a run in their own way.
pub trait PipelineLogger: Send {
    /// Report that `current` of `total` frames of `stage` are done.
    fn progress(&mut self, stage: Stage, current: usize, total: usize);

    /// Record how long one unit of `stage` took (a frame, or the whole stage).
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. frame count, worker count).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event. Used when embedding the pipeline and in tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _stage: Stage, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger: throttled progress lines per stage, plus a timing and metric
/// summary when the run ends.
///
/// Progress is printed every `throttle_frames` frames and on the last one.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames_per_stage: HashMap<Stage, usize>,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_per_stage: HashMap::new(),
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_processed();
        let mut lines = vec![format!(
            "Run summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:7.1}ms  total {total_ms:8.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let last = values.last().copied().unwrap_or_default();
            lines.push(format!("  {name}: {last}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} frames/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    /// Frames that went through compositing, the per-frame stage every run
    /// has. Falls back to extraction when compositing never started.
    fn frames_processed(&self) -> usize {
        self.frames_per_stage
            .get(&Stage::Compositing)
            .or_else(|| self.frames_per_stage.get(&Stage::Extracting))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(24)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, stage: Stage, current: usize, total: usize) {
        self.frames_per_stage.insert(stage, current);
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("{stage}: {current}/{total} frames ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(Stage::Compositing, 1, 10);
        logger.timing("composite", 5.0);
        logger.metric("workers", 4.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("composite", 20.0);
        logger.timing("composite", 30.0);
        logger.timing("extract", 5.0);

        let composite = logger.timings_for("composite").unwrap();
        assert_eq!(composite.len(), 2);
        assert_relative_eq!(composite[0], 20.0);
        assert_relative_eq!(composite[1], 30.0);
        assert_eq!(logger.timings_for("extract").unwrap().len(), 1);
        assert!(logger.timings_for("transcode").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(Stage::Compositing, 10, 10);
        logger.timing("composite", 20.0);
        logger.timing("transcode", 300.0);
        logger.metric("frames", 10.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Run summary (10 frames"));
        assert!(summary.contains("composite"));
        assert!(summary.contains("transcode"));
        assert!(summary.contains("frames: 10"));
        assert!(summary.contains("frames/s"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_latest_count_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=20 {
            logger.progress(Stage::Extracting, i, 20);
        }
        assert_eq!(logger.frames_processed(), 20);

        logger.progress(Stage::Compositing, 3, 20);
        assert_eq!(logger.frames_processed(), 3);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.info("hello world");
        assert_eq!(logger.messages, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_default_throttle_is_one_second_of_video() {
        let logger = StdoutPipelineLogger::default();
        assert_eq!(logger.throttle_frames, 24);
    }

    #[test]
    fn test_zero_throttle_clamped() {
        let logger = StdoutPipelineLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
    }
}

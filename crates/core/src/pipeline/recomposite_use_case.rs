use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::compositing::infrastructure::alpha_compositor::AlphaCompositor;
use crate::pipeline::assemble_video_use_case::AssembleVideoUseCase;
use crate::pipeline::composite_executor::CompositeExecutor;
use crate::pipeline::composite_frames_use_case::CompositeFramesUseCase;
use crate::pipeline::extract_frames_use_case::ExtractFramesUseCase;
use crate::pipeline::infrastructure::sequential_composite_executor::SequentialCompositeExecutor;
use crate::pipeline::infrastructure::threaded_composite_executor::ThreadedCompositeExecutor;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::pipeline_state::PipelineState;
use crate::shared::constants::{
    ASSEMBLED_VIDEO_NAME, DEFAULT_BITRATE, DEFAULT_FPS, WORK_DIR_PREFIX,
};
use crate::shared::error::{PipelineError, Stage, StageFailure};
use crate::shared::product_image::ProductImage;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::encode_settings::{EncodeSettings, VideoCodec};
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::transcoder::Transcoder;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_transcoder::FfmpegTranscoder;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use crate::video::infrastructure::image_file_reader::ImageFileReader;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;

/// Settings for one recomposite run.
#[derive(Clone, Debug)]
pub struct RecomposeConfig {
    pub fps: u32,
    /// Delivery bitrate in bits/s.
    pub bitrate: usize,
    pub delivery_codec: VideoCodec,
    pub intermediate_codec: VideoCodec,
    /// Compositing workers; 1 composites on the calling thread.
    pub workers: usize,
    /// Single-threaded delivery encoding for byte-identical reruns.
    pub deterministic: bool,
    /// Parent of the per-run intermediate directory; system temp if `None`.
    pub work_root: Option<PathBuf>,
    /// Raised by the caller to abort; the run still cleans up.
    pub cancelled: Arc<AtomicBool>,
}

impl RecomposeConfig {
    pub fn delivery_settings(&self) -> EncodeSettings {
        EncodeSettings {
            codec: self.delivery_codec,
            bitrate: Some(self.bitrate),
            deterministic: self.deterministic,
        }
    }

    pub fn intermediate_settings(&self) -> EncodeSettings {
        EncodeSettings {
            codec: self.intermediate_codec,
            ..EncodeSettings::intermediate()
        }
    }
}

impl Default for RecomposeConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            bitrate: DEFAULT_BITRATE,
            delivery_codec: VideoCodec::H264,
            intermediate_codec: VideoCodec::Mpeg4,
            workers: 1,
            deterministic: false,
            work_root: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Working state of one run. Owns its intermediate directory exclusively;
/// the directory and everything in it are removed when the run is finished
/// or dropped.
pub struct PipelineRun {
    pub video: PathBuf,
    pub product: PathBuf,
    pub output: PathBuf,
    pub fps: f64,
    work_dir: tempfile::TempDir,
}

impl PipelineRun {
    /// Creates a fresh, uniquely named intermediate directory.
    pub fn start(
        video: &Path,
        product: &Path,
        output: &Path,
        fps: f64,
        work_root: Option<&Path>,
    ) -> Result<Self, PipelineError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORK_DIR_PREFIX);
        let work_dir = match work_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| PipelineError::io("cannot create intermediate directory", e))?;
        log::debug!("Intermediate directory {}", work_dir.path().display());

        Ok(Self {
            video: video.to_path_buf(),
            product: product.to_path_buf(),
            output: output.to_path_buf(),
            fps,
            work_dir,
        })
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.work_dir.path().join("frames")
    }

    pub fn assembled_path(&self) -> PathBuf {
        self.work_dir.path().join(ASSEMBLED_VIDEO_NAME)
    }

    /// Removes the intermediate directory, reporting any failure.
    pub fn finish(self) -> std::io::Result<()> {
        self.work_dir.close()
    }
}

/// What a successful run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub frames: usize,
    pub output: VideoMetadata,
}

/// Orchestrates extract → composite → assemble → transcode.
///
/// Every run gets its own intermediate directory, which is removed before
/// `execute` returns on every path, including failure and cancellation.
/// Failures carry the originating error unchanged, tagged with the stage.
pub struct RecompositeUseCase {
    extract: ExtractFramesUseCase,
    composite: CompositeFramesUseCase,
    assemble: AssembleVideoUseCase,
    transcoder: Box<dyn Transcoder>,
    product_reader: Box<dyn ImageReader>,
    config: RecomposeConfig,
    state: PipelineState,
}

impl RecompositeUseCase {
    pub fn new(
        extract: ExtractFramesUseCase,
        composite: CompositeFramesUseCase,
        assemble: AssembleVideoUseCase,
        transcoder: Box<dyn Transcoder>,
        product_reader: Box<dyn ImageReader>,
        config: RecomposeConfig,
    ) -> Self {
        Self {
            extract,
            composite,
            assemble,
            transcoder,
            product_reader,
            config,
            state: PipelineState::Idle,
        }
    }

    /// Wires the ffmpeg and image-file adapters with the CPU compositor.
    pub fn with_default_adapters(config: RecomposeConfig) -> Self {
        let executor: Box<dyn CompositeExecutor> = if config.workers > 1 {
            Box::new(ThreadedCompositeExecutor::new(config.workers))
        } else {
            Box::new(SequentialCompositeExecutor::new())
        };

        Self::new(
            ExtractFramesUseCase::new(
                Box::new(FfmpegReader::new()),
                Box::new(ImageFileWriter::new()),
            ),
            CompositeFramesUseCase::new(
                Box::new(AlphaCompositor::new()),
                Box::new(ImageFileReader::new()),
                Box::new(ImageFileWriter::new()),
                executor,
            ),
            AssembleVideoUseCase::new(
                Box::new(ImageFileReader::new()),
                Box::new(FfmpegWriter::new(config.intermediate_settings())),
            ),
            Box::new(FfmpegTranscoder::new()),
            Box::new(ImageFileReader::new()),
            config,
        )
    }

    /// State reached by the most recent `execute`.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn execute(
        &mut self,
        video: &Path,
        product: &Path,
        output: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<RunReport, StageFailure> {
        self.state = PipelineState::Idle;
        let started = Instant::now();

        let run = match PipelineRun::start(
            video,
            product,
            output,
            self.config.fps as f64,
            self.config.work_root.as_deref(),
        ) {
            Ok(run) => run,
            Err(e) => {
                self.state = PipelineState::Failed(Stage::Extracting);
                return Err(StageFailure::new(Stage::Extracting, e));
            }
        };

        let result = self.run_stages(&run, logger);

        let work_dir = run.work_dir().to_path_buf();
        if let Err(e) = run.finish() {
            log::warn!("Could not remove {}: {e}", work_dir.display());
        }

        match &result {
            Ok(report) => {
                logger.timing("total", started.elapsed().as_secs_f64() * 1000.0);
                logger.info(&format!(
                    "Wrote {} ({} frames, {:.2}s)",
                    output.display(),
                    report.frames,
                    report.output.duration_secs()
                ));
            }
            Err(failure) if failure.is_cancelled() => {
                logger.info(&format!("Run cancelled during {} stage", failure.stage));
            }
            Err(failure) => log::debug!("Run failed: {failure}"),
        }
        logger.summary();
        result
    }

    fn run_stages(
        &mut self,
        run: &PipelineRun,
        logger: &mut dyn PipelineLogger,
    ) -> Result<RunReport, StageFailure> {
        let cancelled = Arc::clone(&self.config.cancelled);

        self.enter(Stage::Extracting, &cancelled, logger)?;
        let frames = self
            .extract
            .execute(&run.video, &run.frames_dir(), &cancelled, logger)
            .map_err(|e| self.failed(Stage::Extracting, e))?;

        self.enter(Stage::Compositing, &cancelled, logger)?;
        let product = self
            .load_product(&run.product)
            .map_err(|e| self.failed(Stage::Compositing, e))?;
        self.composite
            .execute(&frames, &product, &cancelled, logger)
            .map_err(|e| self.failed(Stage::Compositing, e))?;

        self.enter(Stage::Assembling, &cancelled, logger)?;
        let assembled = run.assembled_path();
        self.assemble
            .execute(frames.dir(), &assembled, run.fps, &cancelled, logger)
            .map_err(|e| self.failed(Stage::Assembling, e))?;

        self.enter(Stage::Transcoding, &cancelled, logger)?;
        let transcode_started = Instant::now();
        let delivered = self
            .transcoder
            .transcode(
                &assembled,
                &run.output,
                run.fps,
                &self.config.delivery_settings(),
                &cancelled,
            )
            .map_err(|e| self.failed(Stage::Transcoding, e))?;
        logger.timing(
            Stage::Transcoding.name(),
            transcode_started.elapsed().as_secs_f64() * 1000.0,
        );

        // Aborted after the last frame was encoded: the delivery file goes too.
        if cancelled.load(Ordering::Relaxed) {
            discard_output(&run.output);
            return Err(self.failed(Stage::Transcoding, PipelineError::Cancelled));
        }

        self.state.advance();
        Ok(RunReport {
            frames: frames.len(),
            output: delivered,
        })
    }

    /// Advances into `stage`, refusing to start it once cancelled.
    fn enter(
        &mut self,
        stage: Stage,
        cancelled: &AtomicBool,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), StageFailure> {
        self.state.advance();
        debug_assert_eq!(self.state.stage(), Some(stage));
        if cancelled.load(Ordering::Relaxed) {
            return Err(self.failed(stage, PipelineError::Cancelled));
        }
        logger.info(&format!("Stage: {stage}"));
        Ok(())
    }

    fn failed(&mut self, stage: Stage, error: PipelineError) -> StageFailure {
        self.state.fail();
        StageFailure::new(stage, error)
    }

    fn load_product(&self, path: &Path) -> Result<ProductImage, PipelineError> {
        let frame = self
            .product_reader
            .read(path)
            .map_err(|e| PipelineError::io(format!("cannot read {}", path.display()), e))?;
        if !frame.has_alpha() {
            log::warn!(
                "{} has no alpha channel; the product will cover every frame",
                path.display()
            );
        }
        ProductImage::from_frame(frame)
    }
}

fn discard_output(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => log::debug!("Discarded {} after cancellation", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove {}: {e}", output.display()),
    }
}

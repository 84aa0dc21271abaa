use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use product_reel_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use product_reel_core::pipeline::recomposite_use_case::{RecomposeConfig, RecompositeUseCase};
use product_reel_core::pipeline::review_checkpoint::{
    AutoApproveGate, CheckpointReviewGate, ReviewCheckpoint, ReviewGate, ReviewStatus,
};
use product_reel_core::shared::constants::{DEFAULT_BITRATE, DEFAULT_FPS, IMAGE_EXTENSIONS};
use product_reel_core::video::domain::encode_settings::VideoCodec;

/// Re-applies original product pixels over a generated marketing video.
#[derive(Parser)]
#[command(name = "product-reel", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Composite the product cut-out onto every frame and encode the result.
    Run(RunArgs),
    /// Record generated artifacts in a pending review checkpoint.
    Checkpoint(CheckpointArgs),
    /// Mark a checkpoint as approved for recompositing.
    Approve(DecisionArgs),
    /// Mark a checkpoint as rejected.
    Reject(DecisionArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Generated video to recomposite.
    #[arg(long, requires = "product", conflicts_with = "checkpoint")]
    video: Option<PathBuf>,

    /// Product cut-out with an alpha channel (PNG, WebP or TIFF).
    #[arg(long, requires = "video", conflicts_with = "checkpoint")]
    product: Option<PathBuf>,

    /// Take video and product from an approved review checkpoint.
    #[arg(long, required_unless_present = "video")]
    checkpoint: Option<PathBuf>,

    /// Proceed from a checkpoint that is still pending review. Rejected
    /// checkpoints are still refused.
    #[arg(long, requires = "checkpoint")]
    auto_approve: bool,

    /// Output video file.
    #[arg(short, long)]
    output: PathBuf,

    /// Output frame rate.
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// Delivery bitrate in bits per second.
    #[arg(long, default_value_t = DEFAULT_BITRATE)]
    bitrate: usize,

    /// Delivery codec: h264 or mpeg4.
    #[arg(long, default_value = "h264", value_parser = parse_codec)]
    codec: VideoCodec,

    /// Compositing worker threads (1 = sequential).
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Single-threaded delivery encoding so reruns produce identical files.
    #[arg(long)]
    deterministic: bool,

    /// Directory to hold intermediate frames (default: system temp).
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

#[derive(Args)]
struct CheckpointArgs {
    /// Generated video awaiting review.
    #[arg(long)]
    video: PathBuf,

    /// Product cut-out with an alpha channel.
    #[arg(long)]
    product: PathBuf,

    /// Background-replaced still the video was generated from.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Checkpoint file to create.
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct DecisionArgs {
    /// Checkpoint file to update.
    checkpoint: PathBuf,

    /// Reviewer note stored with the decision.
    #[arg(long)]
    note: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Run(args) => run_recomposite(args),
        Command::Checkpoint(args) => create_checkpoint(args),
        Command::Approve(args) => record_decision(args, ReviewStatus::Approved),
        Command::Reject(args) => record_decision(args, ReviewStatus::Rejected),
    }
}

fn run_recomposite(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (video, product) = resolve_inputs(&args)?;
    validate(&args, &video, &product)?;

    let config = RecomposeConfig {
        fps: args.fps,
        bitrate: args.bitrate,
        delivery_codec: args.codec,
        workers: args.workers,
        deterministic: args.deterministic,
        work_root: args.work_dir.clone(),
        ..RecomposeConfig::default()
    };
    let mut use_case = RecompositeUseCase::with_default_adapters(config);
    let mut logger = StdoutPipelineLogger::new(args.fps as usize);

    let report = use_case.execute(&video, &product, &args.output, &mut logger)?;
    log::info!(
        "Output written to {} ({} frames)",
        args.output.display(),
        report.frames
    );
    Ok(())
}

/// Explicit inputs skip review; a checkpoint must have been approved.
fn resolve_inputs(args: &RunArgs) -> Result<(PathBuf, PathBuf), Box<dyn std::error::Error>> {
    if let (Some(video), Some(product)) = (&args.video, &args.product) {
        return Ok((video.clone(), product.clone()));
    }
    let path = args
        .checkpoint
        .as_deref()
        .ok_or("Either --checkpoint or both --video and --product are required")?;
    let checkpoint = ReviewCheckpoint::load(path)?;
    let gate: &dyn ReviewGate = if args.auto_approve {
        &AutoApproveGate
    } else {
        &CheckpointReviewGate
    };
    match gate.review(&checkpoint) {
        ReviewStatus::Approved => Ok((checkpoint.video, checkpoint.product)),
        ReviewStatus::Pending => Err(format!(
            "Checkpoint {} has not been reviewed yet; run `product-reel approve` first",
            path.display()
        )
        .into()),
        ReviewStatus::Rejected => Err(format!(
            "Checkpoint {} was rejected{}",
            path.display(),
            checkpoint
                .note
                .map(|n| format!(": {n}"))
                .unwrap_or_default()
        )
        .into()),
    }
}

fn create_checkpoint(args: CheckpointArgs) -> Result<(), Box<dyn std::error::Error>> {
    require_file(&args.video, "Video")?;
    require_image(&args.product)?;
    let mut checkpoint = ReviewCheckpoint::pending(&args.video, &args.product);
    if let Some(background) = args.background {
        require_file(&background, "Background")?;
        checkpoint = checkpoint.with_background(background);
    }
    checkpoint.save(&args.output)?;
    log::info!("Pending checkpoint written to {}", args.output.display());
    Ok(())
}

fn record_decision(
    args: DecisionArgs,
    status: ReviewStatus,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut checkpoint = ReviewCheckpoint::load(&args.checkpoint)?;
    match status {
        ReviewStatus::Approved => checkpoint.approve(args.note),
        ReviewStatus::Rejected => checkpoint.reject(args.note),
        ReviewStatus::Pending => {}
    }
    checkpoint.save(&args.checkpoint)?;
    log::info!("{} marked {status:?}", args.checkpoint.display());
    Ok(())
}

fn validate(
    args: &RunArgs,
    video: &Path,
    product: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    require_file(video, "Video")?;
    require_image(product)?;
    if args.fps == 0 {
        return Err("Frame rate must be positive".into());
    }
    if args.bitrate == 0 {
        return Err("Bitrate must be positive".into());
    }
    if args.workers == 0 {
        return Err("Workers must be at least 1".into());
    }
    if args.output == video {
        return Err("Output must not overwrite the input video".into());
    }
    if let Some(dir) = &args.work_dir {
        if !dir.is_dir() {
            return Err(format!("Work directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("{what} file not found: {}", path.display()).into());
    }
    Ok(())
}

fn require_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    require_file(path, "Product")?;
    if !is_alpha_image(path) {
        return Err(format!(
            "Product must be one of {} to carry transparency, got {}",
            IMAGE_EXTENSIONS.join(", "),
            path.display()
        )
        .into());
    }
    Ok(())
}

fn is_alpha_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn parse_codec(name: &str) -> Result<VideoCodec, String> {
    VideoCodec::parse(name).ok_or_else(|| format!("unsupported codec '{name}' (use h264 or mpeg4)"))
}

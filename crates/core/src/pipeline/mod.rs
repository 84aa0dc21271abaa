pub mod assemble_video_use_case;
pub mod composite_executor;
pub mod composite_frames_use_case;
pub mod extract_frames_use_case;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod pipeline_state;
pub mod recomposite_use_case;
pub mod review_checkpoint;

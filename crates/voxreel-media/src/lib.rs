#![deny(unreachable_patterns)]
//! FFmpeg command building and subprocess execution.
//!
//! This crate provides:
//! - Pure command descriptors for ffmpeg, ffprobe and whisper
//! - A runner with timeout, cancellation and separate stdout/stderr capture
//! - The duration-fill planner used to render clips to a target length
//! - WAV concat, audio blend, stream merge and subtitle burn builders

pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod probe;
pub mod runner;
pub mod subtitle;

pub use command::{check_tool, CommandDescriptor};
pub use concat::{
    effective_duration, fill_within_limit, plan_fill, write_concat_list, MediaSegment,
    MAX_FILL_SEGMENTS,
};
pub use error::{MediaError, MediaResult, RunError, RunErrorKind};
pub use filters::FrameSpec;
pub use pipeline::MediaPipelineBuilder;
pub use probe::{DurationProbe, FfprobeDurationProbe};
pub use runner::CommandRunner;
pub use subtitle::WhisperSubtitler;

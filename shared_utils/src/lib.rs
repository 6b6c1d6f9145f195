//! Shared Utilities for the AV1 batch encoder
//!
//! - Probe text parsing (`key=value` ffprobe output)
//! - Encode parameter resolution: color metadata with height-based fallback,
//!   keyframe interval from frame rate, audio copy/transcode plan
//! - ffprobe / ffmpeg process wrappers with progress parsing
//! - Batch collection, output naming and summary reporting
//! - tracing-based logging

pub mod probe_text;
pub mod color_params;
pub mod gop;
pub mod audio_plan;
pub mod encode_params;
pub mod crf_constants;
pub mod errors;

pub mod ffprobe;
pub mod ffmpeg_process;
pub mod logging;

pub mod batch;
pub mod report;
pub mod progress;
pub mod path_validator;
pub mod file_times;
pub mod conversion_types;
pub mod cli_runner;

pub use probe_text::{extract_field, ProbeRecord};
pub use color_params::{ColorAttribute, HeightBand, ResolvedColorParams};
pub use audio_plan::AudioPlan;
pub use encode_params::{EncodeParameterSet, EncodeSettings};
pub use errors::{EncodeError, Result};

pub use ffprobe::{
    get_duration, is_ffmpeg_available, is_ffprobe_available, probe_record, probe_stream,
    FFprobeError, StreamKind,
};
pub use ffmpeg_process::{format_ffmpeg_error, FfmpegProcess, FfmpegProgressParser};
pub use logging::{init_logging, log_external_tool, LogConfig};

pub use batch::{collect_files, BatchResult, SUPPORTED_VIDEO_EXTENSIONS};
pub use report::print_summary_report;
pub use progress::{format_bytes, format_duration};
pub use path_validator::{check_input_output_conflict, output_path_for, PathValidationError};
pub use conversion_types::{ConversionOutput, EncodeConfig};
pub use cli_runner::{run_auto_command, CliProcessingResult, CliRunnerConfig};

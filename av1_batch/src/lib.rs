//! av1-batch - metadata-driven AV1 (SVT-AV1) + Opus transcoding
//!
//! Every file is probed with ffprobe, and the probe text is turned into an
//! [`EncodeParameterSet`]: color metadata (probed, or a height-based
//! fallback), a ten-second keyframe interval, and an audio copy/transcode
//! plan. The parameter set is rendered to ffmpeg flags and encoded to MKV.
//!
//! ```rust,ignore
//! use av1_batch::{convert_file, EncodeConfig};
//! use std::path::Path;
//!
//! let output = convert_file(Path::new("clip.mp4"), &EncodeConfig::default())?;
//! println!("{} -> {}", output.input_path, output.output_path);
//! ```

pub mod conversion_api;

pub use conversion_api::{
    build_ffmpeg_args, convert_file, plan_file, resolve_parameters, EncodePlan,
};
pub use shared_utils::conversion_types::{ConversionOutput, EncodeConfig};
pub use shared_utils::encode_params::{EncodeParameterSet, EncodeSettings};
pub use shared_utils::errors::{EncodeError, Result};

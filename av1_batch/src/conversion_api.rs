//! Video Conversion API Module
//!
//! Per-file pipeline: name the output, probe, resolve the parameter set,
//! encode to a partial file, then promote it and carry over timestamps.

use shared_utils::conversion_types::{ConversionOutput, EncodeConfig};
use shared_utils::encode_params::{EncodeParameterSet, EncodeSettings};
use shared_utils::errors::{EncodeError, Result};
use shared_utils::ffmpeg_process::{describe_failure, FfmpegProcess, FfmpegProgressParser};
use shared_utils::ffprobe::{self, StreamKind};
use shared_utils::file_times::{
    apply_file_timestamps, discard_partial, promote_partial, safe_delete_original,
};
use shared_utils::logging::log_external_tool;
use shared_utils::path_validator::{
    check_input_output_conflict, output_path_for, partial_path, safe_path_arg,
};
use shared_utils::progress::{create_encode_bar, set_fraction};
use serde::Serialize;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything `plan` prints for one file.
#[derive(Debug, Clone, Serialize)]
pub struct EncodePlan {
    pub input_path: String,
    pub output_path: String,
    pub parameters: EncodeParameterSet,
    pub ffmpeg_args: Vec<String>,
}

/// Probe the first video and audio stream and resolve the parameter set.
///
/// A file without audio probes to empty text, which plans as passthrough.
pub fn resolve_parameters(input: &Path, settings: &EncodeSettings) -> Result<EncodeParameterSet> {
    let video = ffprobe::probe_record(input, StreamKind::Video)?;
    if video.is_empty() {
        return Err(EncodeError::FFprobeError(format!(
            "no video stream in {}",
            input.display()
        )));
    }
    let audio = ffprobe::probe_record(input, StreamKind::Audio)?;
    debug!(
        video_fields = video.len(),
        audio_fields = audio.len(),
        "Probe records parsed"
    );

    EncodeParameterSet::resolve(&video, &audio, settings)
}

/// Full ffmpeg argument list, `ffmpeg` itself excluded.
pub fn build_ffmpeg_args(input: &Path, output: &Path, params: &EncodeParameterSet) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-i".to_string(),
        safe_path_arg(input).into_owned(),
    ];
    args.extend(params.to_ffmpeg_args());
    args.extend([
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        safe_path_arg(output).into_owned(),
    ]);
    args
}

/// Resolve without encoding.
pub fn plan_file(input: &Path, config: &EncodeConfig) -> Result<EncodePlan> {
    let output = output_path_for(
        input,
        config.output_dir.as_deref(),
        config.base_dir.as_deref(),
    )?;
    let parameters = resolve_parameters(input, &config.encode_settings())?;
    let ffmpeg_args = build_ffmpeg_args(input, &output, &parameters);

    Ok(EncodePlan {
        input_path: input.display().to_string(),
        output_path: output.display().to_string(),
        parameters,
        ffmpeg_args,
    })
}

pub fn convert_file(input: &Path, config: &EncodeConfig) -> Result<ConversionOutput> {
    let input_size = std::fs::metadata(input)?.len();
    let output_path = output_path_for(
        input,
        config.output_dir.as_deref(),
        config.base_dir.as_deref(),
    )?;

    check_input_output_conflict(input, &output_path)?;

    if output_path.exists() && !config.force {
        info!("⏭️ Output exists, skipping: {}", output_path.display());
        return Ok(ConversionOutput::skipped(
            input.display().to_string(),
            input_size,
            format!("output exists ({})", output_path.display()),
        ));
    }

    let params = resolve_parameters(input, &config.encode_settings())?;
    info!("🎬 {} → {}", input.display(), output_path.display());
    info!("   {}", params.summary());

    if config.dry_run {
        let args = build_ffmpeg_args(input, &output_path, &params);
        info!("🧪 Dry run: ffmpeg {}", args.join(" "));
        let mut out = ConversionOutput::skipped(input.display().to_string(), input_size, "dry run");
        out.parameters = Some(params);
        return Ok(out);
    }

    if !ffprobe::is_ffmpeg_available() {
        return Err(EncodeError::ToolNotFound(
            "ffmpeg not found. Install with: brew install ffmpeg".to_string(),
        ));
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let partial = partial_path(&output_path);
    if let Err(e) = run_encode(input, &partial, &params) {
        discard_partial(&partial);
        return Err(e);
    }

    if let Err(e) = promote_partial(&partial, &output_path) {
        discard_partial(&partial);
        return Err(EncodeError::ConversionError(format!(
            "encoded output unusable: {}",
            e
        )));
    }

    apply_file_timestamps(input, &output_path);

    let output_size = std::fs::metadata(&output_path)?.len();
    let size_ratio = if input_size > 0 {
        output_size as f64 / input_size as f64
    } else {
        0.0
    };

    if config.should_delete_original() {
        match safe_delete_original(input, &output_path, 1) {
            Ok(()) => info!("   🗑️  Original deleted (integrity verified)"),
            Err(e) => warn!("   ⚠️  Safe delete failed: {}", e),
        }
    }

    info!("   ✅ Complete: {:.1}% of original", size_ratio * 100.0);

    Ok(ConversionOutput {
        input_path: input.display().to_string(),
        output_path: output_path.display().to_string(),
        input_size,
        output_size,
        size_ratio,
        success: true,
        skipped: false,
        message: format!("{:.1}% of original, {}", size_ratio * 100.0, params.audio.describe()),
        parameters: Some(params),
    })
}

/// Run ffmpeg into `partial`, driving a progress bar from `-progress` output.
fn run_encode(input: &Path, partial: &Path, params: &EncodeParameterSet) -> Result<()> {
    let args = build_ffmpeg_args(input, partial, params);
    let duration = ffprobe::get_duration(input);
    let label = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut cmd = Command::new("ffmpeg");
    cmd.args(&args);

    let start = Instant::now();
    let mut process = FfmpegProcess::spawn(&mut cmd)
        .map_err(|e| EncodeError::FFmpegError(format!("{:#}", e)))?;

    let bar = create_encode_bar(duration.is_some(), &label);
    let mut parser = match duration {
        Some(secs) => FfmpegProgressParser::with_duration(secs),
        None => FfmpegProgressParser::new(),
    };

    if let Some(stdout) = process.take_stdout() {
        for line in BufReader::new(stdout).lines().map_while(std::result::Result::ok) {
            if let Some(fraction) = parser.parse_line(&line) {
                set_fraction(&bar, fraction);
            }
            if line.starts_with("speed=") {
                bar.set_message(format!("{:.2}x", parser.current_speed()));
            }
        }
    }

    let (status, stderr) = process
        .wait_with_output()
        .map_err(|e| EncodeError::FFmpegError(format!("{:#}", e)))?;
    bar.finish_and_clear();

    log_external_tool("ffmpeg", &args, &stderr, status.code(), start.elapsed());

    if !status.success() {
        return Err(EncodeError::FFmpegError(describe_failure(status, &stderr)));
    }

    Ok(())
}

/// Where a directory run should root relative output paths.
pub fn base_dir_for(input: &Path) -> Option<PathBuf> {
    input.is_dir().then(|| input.to_path_buf())
}

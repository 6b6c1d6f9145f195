//! FFprobe wrapper module
//!
//! Runs ffprobe against the first video or audio stream and returns the
//! `key=value` text the resolvers consume.

use crate::logging::log_external_tool;
use crate::probe_text::ProbeRecord;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FFprobeError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("FFprobe failed: {0}")]
    ExecutionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

static FFPROBE_AVAILABLE: OnceLock<bool> = OnceLock::new();
static FFMPEG_AVAILABLE: OnceLock<bool> = OnceLock::new();

pub fn is_ffprobe_available() -> bool {
    *FFPROBE_AVAILABLE.get_or_init(|| which::which("ffprobe").is_ok())
}

pub fn is_ffmpeg_available() -> bool {
    *FFMPEG_AVAILABLE.get_or_init(|| which::which("ffmpeg").is_ok())
}

/// Which stream `probe_stream` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn selector(&self) -> &'static str {
        match self {
            StreamKind::Video => "v:0",
            StreamKind::Audio => "a:0",
        }
    }

    /// Fields requested from ffprobe for this stream.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            StreamKind::Video => &[
                "codec_name",
                "width",
                "height",
                "pix_fmt",
                "color_range",
                "color_space",
                "color_transfer",
                "color_primaries",
                "r_frame_rate",
                "avg_frame_rate",
            ],
            StreamKind::Audio => &["codec_name", "channels", "channel_layout", "bit_rate"],
        }
    }

    pub fn show_entries(&self) -> String {
        format!("stream={}", self.fields().join(","))
    }
}

impl std::str::FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" | "v" => Ok(StreamKind::Video),
            "audio" | "a" => Ok(StreamKind::Audio),
            other => Err(format!("unknown stream kind '{}'", other)),
        }
    }
}

/// Arguments for one stream probe, path last after `--`.
pub fn probe_args(path: &Path, kind: StreamKind) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        kind.selector().to_string(),
        "-show_entries".to_string(),
        kind.show_entries(),
        "-of".to_string(),
        "default=noprint_wrappers=1".to_string(),
        "--".to_string(),
        path.to_string_lossy().into_owned(),
    ]
}

/// Raw probe text for the first stream of `kind`.
///
/// A file without such a stream yields empty text, not an error.
pub fn probe_stream(path: &Path, kind: StreamKind) -> Result<String, FFprobeError> {
    if !is_ffprobe_available() {
        return Err(FFprobeError::ToolNotFound(
            "ffprobe not found. Install with: brew install ffmpeg".to_string(),
        ));
    }

    if !path.is_file() {
        return Err(FFprobeError::ExecutionFailed(format!(
            "Not a file: {}",
            path.display()
        )));
    }

    let args = probe_args(path, kind);
    let start = Instant::now();
    let output = Command::new("ffprobe").args(&args).output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = String::from_utf8_lossy(&output.stdout).into_owned();

    log_external_tool(
        "ffprobe",
        &args,
        if output.status.success() {
            text.as_str()
        } else {
            &*stderr
        },
        output.status.code(),
        start.elapsed(),
    );

    if !output.status.success() {
        let error_msg = if stderr.trim().is_empty() {
            format!(
                "ffprobe failed to analyze file: {} (exit code: {:?})",
                path.display(),
                output.status.code()
            )
        } else {
            format!("ffprobe error for '{}': {}", path.display(), stderr.trim())
        };
        return Err(FFprobeError::ExecutionFailed(error_msg));
    }

    Ok(text)
}

/// Probe and parse in one step.
pub fn probe_record(path: &Path, kind: StreamKind) -> Result<ProbeRecord, FFprobeError> {
    probe_stream(path, kind).map(|text| ProbeRecord::parse(&text))
}

/// Container duration in seconds, used only for progress display.
pub fn get_duration(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            "--",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_args_video() {
        let args = probe_args(Path::new("/tmp/-weird name.mp4"), StreamKind::Video);
        assert_eq!(args[2..4], ["-select_streams", "v:0"]);
        assert!(args[5].starts_with("stream=codec_name,"));
        assert!(args[5].contains("color_primaries"));
        assert!(args[5].contains("avg_frame_rate"));
        assert_eq!(args[7], "default=noprint_wrappers=1");
        // path after `--` so a leading dash is never read as an option
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "/tmp/-weird name.mp4");
    }

    #[test]
    fn test_probe_args_audio() {
        let args = probe_args(Path::new("a.mkv"), StreamKind::Audio);
        assert_eq!(args[3], "a:0");
        assert_eq!(args[5], "stream=codec_name,channels,channel_layout,bit_rate");
    }

    #[test]
    fn test_stream_kind_from_str() {
        assert_eq!("video".parse::<StreamKind>().unwrap(), StreamKind::Video);
        assert_eq!("A".parse::<StreamKind>().unwrap(), StreamKind::Audio);
        assert!("subtitle".parse::<StreamKind>().is_err());
    }

    #[test]
    fn test_probe_missing_file_fails() {
        if !is_ffprobe_available() {
            return;
        }
        let err = probe_stream(Path::new("/nonexistent/clip.mp4"), StreamKind::Video).unwrap_err();
        assert!(matches!(err, FFprobeError::ExecutionFailed(_)));
    }

    #[test]
    fn test_probe_record_missing_file_fails() {
        if !is_ffprobe_available() {
            return;
        }
        let err = probe_record(Path::new("/nonexistent/clip.mp4"), StreamKind::Audio).unwrap_err();
        assert!(matches!(err, FFprobeError::ExecutionFailed(_)));
    }

    #[test]
    fn test_tool_not_found_message() {
        let e = FFprobeError::ToolNotFound("ffprobe".to_string());
        assert_eq!(e.to_string(), "Tool not found: ffprobe");
    }
}

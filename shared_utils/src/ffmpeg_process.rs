//! FFmpeg process management
//!
//! ffmpeg is run with `-progress pipe:1 -nostats`, so stdout carries
//! `key=value` progress blocks while stderr carries the log. Both pipes are
//! read concurrently: if stderr fills its buffer (about 64KB) while we block
//! on stdout, ffmpeg stalls and so do we.
//!
//! ```ignore
//! use shared_utils::ffmpeg_process::{FfmpegProcess, FfmpegProgressParser};
//! use std::io::{BufRead, BufReader};
//!
//! let mut process = FfmpegProcess::spawn(&mut cmd)?;
//! let mut parser = FfmpegProgressParser::with_duration(duration);
//! if let Some(stdout) = process.take_stdout() {
//!     for line in BufReader::new(stdout).lines().map_while(Result::ok) {
//!         if let Some(p) = parser.parse_line(&line) { bar.set_position((p * 100.0) as u64); }
//!     }
//! }
//! let (status, stderr) = process.wait_with_output()?;
//! ```

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

// ═══════════════════════════════════════════════════════════════
// FfmpegProcess
// ═══════════════════════════════════════════════════════════════

/// Child ffmpeg with stderr drained on a background thread.
pub struct FfmpegProcess {
    child: Child,
    stderr_thread: Option<JoinHandle<String>>,
}

impl FfmpegProcess {
    /// Spawn `cmd` with both pipes captured.
    pub fn spawn(cmd: &mut Command) -> Result<Self> {
        let command_str = format!("{:?}", cmd);
        info!(command = %command_str, "Executing FFmpeg command");

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn().context("Failed to spawn FFmpeg process")?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture FFmpeg stderr"))?;

        let stderr_thread = thread::spawn(move || {
            let mut buf = String::new();
            for line in BufReader::new(stderr).lines().map_while(std::result::Result::ok) {
                buf.push_str(&line);
                buf.push('\n');
            }
            buf
        });

        Ok(Self {
            child,
            stderr_thread: Some(stderr_thread),
        })
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Wait for exit and collect everything written to stderr.
    pub fn wait_with_output(mut self) -> Result<(ExitStatus, String)> {
        let status = self.child.wait().context("Failed to wait for FFmpeg")?;
        let stderr = self
            .stderr_thread
            .take()
            .map(|t| t.join().unwrap_or_default())
            .unwrap_or_default();

        if status.success() {
            info!(exit_code = status.code(), "FFmpeg process completed successfully");
            debug!(stderr_output = %stderr, "FFmpeg stderr output");
        } else {
            error!(
                exit_code = status.code(),
                stderr_output = %stderr,
                "FFmpeg process failed"
            );
        }

        Ok((status, stderr))
    }
}

// ═══════════════════════════════════════════════════════════════
// FfmpegProgressParser
// ═══════════════════════════════════════════════════════════════

/// Parser for `-progress` output.
///
/// Understands `out_time_us=`, `out_time_ms=` (also microseconds, despite
/// the name), `out_time=HH:MM:SS.micro`, `speed=1.5x` and
/// `progress=continue|end`. A fraction is only reported when the source
/// duration is known; `progress=end` always reports 1.0.
#[derive(Debug, Clone, Default)]
pub struct FfmpegProgressParser {
    total_duration: Option<f64>,
    current_time: f64,
    current_speed: f64,
    finished: bool,
}

impl FfmpegProgressParser {
    /// Parser for a source of unknown duration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(total_duration: f64) -> Self {
        Self {
            total_duration: Some(total_duration),
            ..Self::default()
        }
    }

    /// Feed one line; returns the fraction done (0.0 - 1.0) when computable.
    pub fn parse_line(&mut self, line: &str) -> Option<f64> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key.trim() {
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    if us >= 0 {
                        self.current_time = us as f64 / 1_000_000.0;
                    }
                }
            }
            "out_time" | "time" => {
                if let Some(time) = Self::parse_time(value) {
                    self.current_time = time;
                }
            }
            "speed" => {
                if let Ok(speed) = value.trim_end_matches('x').trim().parse::<f64>() {
                    self.current_speed = speed;
                }
            }
            "progress" => {
                if value == "end" {
                    self.finished = true;
                    return Some(1.0);
                }
            }
            _ => {}
        }

        self.calculate_progress()
    }

    /// `HH:MM:SS.fraction` to seconds.
    fn parse_time(time_str: &str) -> Option<f64> {
        let parts: Vec<&str> = time_str.split(':').collect();
        if parts.len() != 3 {
            return None;
        }

        let hours: f64 = parts[0].parse().ok()?;
        let minutes: f64 = parts[1].parse().ok()?;
        let seconds: f64 = parts[2].parse().ok()?;

        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    }

    fn calculate_progress(&self) -> Option<f64> {
        if let Some(total) = self.total_duration {
            if total > 0.0 && self.current_time > 0.0 {
                return Some((self.current_time / total).min(1.0));
            }
        }

        None
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

// ═══════════════════════════════════════════════════════════════
// Error formatting
// ═══════════════════════════════════════════════════════════════

/// Most useful line of ffmpeg's stderr.
///
/// The last line mentioning an error wins; otherwise the last non-empty,
/// non-progress line; otherwise "Unknown FFmpeg error".
pub fn format_ffmpeg_error(stderr: &str) -> String {
    if let Some(error_line) = stderr
        .lines()
        .rev()
        .find(|line| line.contains("Error") || line.contains("error"))
    {
        return error_line.trim().to_string();
    }

    stderr
        .lines()
        .rev()
        .find(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty()
                && !trimmed.starts_with("frame=")
                && !trimmed.starts_with("fps=")
                && !trimmed.starts_with("size=")
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "Unknown FFmpeg error".to_string())
}

/// Actionable hint for common failures.
pub fn get_error_suggestion(stderr: &str) -> Option<&'static str> {
    const PATTERNS: &[(&str, &str)] = &[
        ("Unknown encoder 'libsvtav1'", "install an ffmpeg build with SVT-AV1 (libsvtav1)"),
        ("Unknown encoder 'libopus'", "install an ffmpeg build with libopus, or pick --audio-codec aac"),
        ("No such file or directory", "check the input path"),
        ("Invalid data found", "the input file may be damaged"),
        ("Permission denied", "check read/write permissions on input and output"),
        ("moov atom not found", "the MP4 is incomplete (interrupted download or recording)"),
        ("Too many packets buffered", "add -max_muxing_queue_size to the ffmpeg arguments"),
    ];

    PATTERNS
        .iter()
        .find(|(pattern, _)| stderr.contains(pattern))
        .map(|(_, suggestion)| *suggestion)
}

/// One-line failure description including a suggestion when one applies.
pub fn describe_failure(status: ExitStatus, stderr: &str) -> String {
    let mut msg = format!(
        "exit code {:?}: {}",
        status.code(),
        format_ffmpeg_error(stderr)
    );
    if let Some(hint) = get_error_suggestion(stderr) {
        msg.push_str(&format!(" (💡 {})", hint));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ffmpeg_error_with_error_line() {
        let stderr = r#"
frame=  100 fps=25.0 q=28.0 size=    1024kB time=00:00:04.00 bitrate=2097.2kbits/s
[libsvtav1 @ 0x7f8b8c000000] Error: invalid parameter
"#;
        let error = format_ffmpeg_error(stderr);
        assert!(error.contains("Error"));
        assert!(error.contains("invalid parameter"));
    }

    #[test]
    fn test_format_ffmpeg_error_no_error_line() {
        let stderr = "\nframe=  100 fps=25.0 q=28.0 size=    1024kB time=00:00:04.00\nConversion failed!\n";
        assert_eq!(format_ffmpeg_error(stderr), "Conversion failed!");
    }

    #[test]
    fn test_format_ffmpeg_error_empty() {
        assert_eq!(format_ffmpeg_error(""), "Unknown FFmpeg error");
    }

    #[test]
    fn test_suggestion_for_missing_encoder() {
        let hint = get_error_suggestion("Unknown encoder 'libsvtav1'").unwrap();
        assert!(hint.contains("SVT-AV1"));
        assert!(get_error_suggestion("all good").is_none());
    }

    #[test]
    fn test_progress_block_without_duration() {
        let mut parser = FfmpegProgressParser::new();
        assert_eq!(parser.parse_line("frame=500"), None);
        assert_eq!(parser.parse_line("out_time_us=20000000"), None);
        assert!((parser.current_time() - 20.0).abs() < 0.001);
        parser.parse_line("speed=1.52x");
        assert!((parser.current_speed() - 1.52).abs() < 0.001);
    }

    #[test]
    fn test_progress_by_out_time_us() {
        let mut parser = FfmpegProgressParser::with_duration(120.0);
        assert_eq!(parser.parse_line("out_time_us=60000000"), Some(0.5));
        assert_eq!(parser.parse_line("out_time_ms=30000000"), Some(0.25));
        assert!((parser.current_time() - 30.0).abs() < 0.001);
    }

    #[test]
    fn test_progress_by_out_time() {
        let mut parser = FfmpegProgressParser::with_duration(120.0);
        assert_eq!(parser.parse_line("out_time=00:01:00.000000"), Some(0.5));
    }

    #[test]
    fn test_negative_out_time_ignored() {
        let mut parser = FfmpegProgressParser::with_duration(10.0);
        assert_eq!(parser.parse_line("out_time_us=-9223372036854775807"), None);
        assert_eq!(parser.current_time(), 0.0);
    }

    #[test]
    fn test_progress_end() {
        let mut parser = FfmpegProgressParser::new();
        assert_eq!(parser.parse_line("progress=continue"), None);
        assert!(!parser.is_finished());
        assert_eq!(parser.parse_line("progress=end"), Some(1.0));
        assert!(parser.is_finished());
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        let mut parser = FfmpegProgressParser::with_duration(10.0);
        assert_eq!(parser.parse_line("bitrate=N/A"), None);
        assert_eq!(parser.parse_line("no equals sign"), None);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_progress_never_exceeds_one(
            us in 0i64..1_000_000_000_000,
            total_duration in 1.0f64..86400.0
        ) {
            let mut parser = FfmpegProgressParser::with_duration(total_duration);
            if let Some(p) = parser.parse_line(&format!("out_time_us={}", us)) {
                prop_assert!((0.0..=1.0).contains(&p));
            }
        }

        #[test]
        fn prop_format_error_non_empty(content in "[a-zA-Z0-9 ]{1,100}") {
            prop_assert!(!format_ffmpeg_error(&content).is_empty());
        }
    }
}

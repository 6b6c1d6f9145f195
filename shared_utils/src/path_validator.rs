//! Path Validation Module
//!
//! Output naming for encoded files and the input/output conflict check.
//! 输出路径命名与输入输出冲突检查。

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Container every encode is written to.
pub const OUTPUT_EXTENSION: &str = "mkv";

/// Token written into output stems.
pub const OUTPUT_TAG: &str = "AV1";

/// Suffix used when the source stem carries no codec tag to replace.
pub const OUTPUT_SUFFIX: &str = "_av1";

/// Marker inserted before the extension while an encode is in flight.
pub const PARTIAL_MARKER: &str = "partial";

/// Codec tags (lowercase) replaced by [`OUTPUT_TAG`] in output stems.
pub const CODEC_TAGS: &[&str] = &[
    "x264", "x265", "h264", "h.264", "h265", "h.265", "hevc", "avc", "xvid", "divx",
];

const TOKEN_SEPARATORS: &[char] = &['.', ' ', '_', '-'];

/// Path validation error
/// 路径验证错误
#[derive(Debug, Clone)]
pub enum PathValidationError {
    /// 路径为空
    EmptyPath,
    /// Input and output paths are the same
    /// 输入和输出路径相同
    InputOutputConflict { path: String },
    /// Input has no usable file name
    NoFileName(String),
}

impl fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValidationError::EmptyPath => {
                write!(f, "❌ PATH ERROR: Empty path provided")
            }
            PathValidationError::InputOutputConflict { path } => {
                write!(
                    f,
                    "❌ PATH CONFLICT ERROR: Input and output paths are identical: {}",
                    path
                )
            }
            PathValidationError::NoFileName(path) => {
                write!(f, "❌ PATH ERROR: No file name in path: {}", path)
            }
        }
    }
}

impl std::error::Error for PathValidationError {}

// ═══════════════════════════════════════════════════════════════
// Output naming
// ═══════════════════════════════════════════════════════════════

/// Split `stem` into tokens and separators, keeping both.
///
/// `h.264` and `h.265` contain the `.` separator, so they are matched on the
/// joined token pair before single tokens.
fn split_tokens(stem: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in stem.char_indices() {
        if TOKEN_SEPARATORS.contains(&c) {
            if start < i {
                parts.push(&stem[start..i]);
            }
            parts.push(&stem[i..i + c.len_utf8()]);
            start = i + c.len_utf8();
        }
    }
    if start < stem.len() {
        parts.push(&stem[start..]);
    }
    parts
}

fn is_separator(part: &str) -> bool {
    part.len() == 1 && part.chars().all(|c| TOKEN_SEPARATORS.contains(&c))
}

/// Rewrite a source stem for the AV1 output.
///
/// Codec tags that stand as whole tokens become `AV1`; a stem with no tag
/// gets `_av1` appended.
///
/// ```
/// use shared_utils::path_validator::rewrite_stem;
/// assert_eq!(rewrite_stem("Show.S01E01.1080p.x264-GRP"), "Show.S01E01.1080p.AV1-GRP");
/// assert_eq!(rewrite_stem("holiday"), "holiday_av1");
/// ```
pub fn rewrite_stem(stem: &str) -> String {
    let parts = split_tokens(stem);
    let mut out = String::with_capacity(stem.len() + OUTPUT_SUFFIX.len());
    let mut replaced = false;
    let mut i = 0;

    while i < parts.len() {
        // h.264 / h.265 span token, '.', token
        if i + 2 < parts.len() && parts[i + 1] == "." && !is_separator(parts[i]) {
            let joined = format!("{}.{}", parts[i], parts[i + 2]).to_ascii_lowercase();
            if CODEC_TAGS.contains(&joined.as_str()) {
                out.push_str(OUTPUT_TAG);
                replaced = true;
                i += 3;
                continue;
            }
        }

        let part = parts[i];
        if !is_separator(part) && CODEC_TAGS.contains(&part.to_ascii_lowercase().as_str()) {
            out.push_str(OUTPUT_TAG);
            replaced = true;
        } else {
            out.push_str(part);
        }
        i += 1;
    }

    if !replaced {
        out.push_str(OUTPUT_SUFFIX);
    }
    out
}

/// Whether `path` looks like something this tool wrote: an in-flight
/// partial file, or a stem carrying the AV1 tag as a whole token.
pub fn is_produced_output(path: &Path) -> bool {
    let Some(stem) = path.file_stem().map(|s| s.to_string_lossy()) else {
        return false;
    };
    if stem.ends_with(&format!(".{}", PARTIAL_MARKER)) {
        return true;
    }
    split_tokens(&stem)
        .iter()
        .any(|part| part.eq_ignore_ascii_case(OUTPUT_TAG))
}

/// Where the encode of `input` lands.
///
/// Without `output_dir` the file goes next to its input. With one, the path
/// below `base_dir` (the directory being walked) is preserved.
pub fn output_path_for(
    input: &Path,
    output_dir: Option<&Path>,
    base_dir: Option<&Path>,
) -> Result<PathBuf, PathValidationError> {
    if input.as_os_str().is_empty() {
        return Err(PathValidationError::EmptyPath);
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PathValidationError::NoFileName(input.display().to_string()))?;

    let file_name = format!("{}.{}", rewrite_stem(&stem), OUTPUT_EXTENSION);
    let parent = input.parent().unwrap_or_else(|| Path::new(""));

    let dir = match output_dir {
        None => parent.to_path_buf(),
        Some(out) => {
            let relative = base_dir
                .and_then(|base| parent.strip_prefix(base).ok())
                .unwrap_or_else(|| Path::new(""));
            out.join(relative)
        }
    };

    Ok(dir.join(file_name))
}

/// Temporary path the encoder writes to: `name.partial.mkv`.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{}.{}.{}", stem, PARTIAL_MARKER, OUTPUT_EXTENSION))
}

/// Path as an ffmpeg argument; a leading `-` would be read as an option.
pub fn safe_path_arg(path: &Path) -> Cow<'_, str> {
    let s = path.to_string_lossy();
    if s.starts_with('-') {
        Cow::Owned(format!("./{}", s))
    } else {
        s
    }
}

/// Check if input and output paths conflict (are the same file)
/// 检查输入和输出路径是否冲突（是否为同一文件）
pub fn check_input_output_conflict(input: &Path, output: &Path) -> Result<(), PathValidationError> {
    let input_canonical = input.canonicalize().unwrap_or_else(|_| input.to_path_buf());

    let output_canonical = if output.exists() {
        output
            .canonicalize()
            .unwrap_or_else(|_| output.to_path_buf())
    } else if output.is_relative() {
        std::env::current_dir().unwrap_or_default().join(output)
    } else {
        output.to_path_buf()
    };

    if input_canonical == output_canonical {
        return Err(PathValidationError::InputOutputConflict {
            path: input.display().to_string(),
        });
    }

    Ok(())
}

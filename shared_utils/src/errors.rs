use thiserror::Error;

/// Errors raised while resolving encode parameters or running the encode.
///
/// A field missing from probe text is not an error: the probe parser returns
/// `None` and the resolvers fall back or default.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// No fallback can be derived because a prerequisite field (`height`) is
    /// missing or malformed.
    #[error("Metadata error for color {attribute}: {reason}")]
    MetadataError {
        attribute: &'static str,
        reason: String,
    },

    /// An attribute name outside {range, space, transfer, primaries}.
    #[error("Invalid color attribute: {0}")]
    InvalidAttribute(String),

    #[error("FFprobe failed: {0}")]
    FFprobeError(String),

    #[error("FFmpeg failed: {0}")]
    FFmpegError(String),

    #[error("Conversion failed: {0}")]
    ConversionError(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Path conflict: {0}")]
    PathConflict(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EncodeError {
    /// Whether the batch should carry on with the next file after this error.
    pub fn is_per_file(&self) -> bool {
        !matches!(self, EncodeError::ToolNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, EncodeError>;

impl From<crate::ffprobe::FFprobeError> for EncodeError {
    fn from(e: crate::ffprobe::FFprobeError) -> Self {
        match e {
            crate::ffprobe::FFprobeError::ToolNotFound(s) => EncodeError::ToolNotFound(s),
            other => EncodeError::FFprobeError(other.to_string()),
        }
    }
}

impl From<crate::path_validator::PathValidationError> for EncodeError {
    fn from(e: crate::path_validator::PathValidationError) -> Self {
        EncodeError::PathConflict(e.to_string())
    }
}

//! Output finalization
//!
//! Partial-file promotion, timestamp carry-over and guarded deletion of the
//! source. Timestamps are applied after the rename since the rename itself
//! leaves them alone but any later write would not.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Copy access and modification times from `src` onto `dst`.
///
/// Failure is logged, never fatal.
pub fn apply_file_timestamps(src: &Path, dst: &Path) {
    let Ok(m) = fs::metadata(src) else {
        return;
    };
    let atime = filetime::FileTime::from_last_access_time(&m);
    let mtime = filetime::FileTime::from_last_modification_time(&m);
    match filetime::set_file_times(dst, atime, mtime) {
        Ok(()) => debug!(dst = %dst.display(), "Copied file timestamps"),
        Err(e) => warn!(dst = %dst.display(), error = %e, "⚠️ Failed to set file times"),
    }
}

/// Output exists, is at least `min_size` (and never empty), and can be read.
pub fn verify_output_integrity(output: &Path, min_size: u64) -> Result<(), String> {
    if !output.exists() {
        return Err("Output file does not exist".to_string());
    }

    let metadata =
        fs::metadata(output).map_err(|e| format!("Cannot read output metadata: {}", e))?;

    if metadata.len() == 0 {
        return Err("Output file is empty (0 bytes)".to_string());
    }

    if metadata.len() < min_size {
        return Err(format!(
            "Output file too small: {} < {} bytes",
            metadata.len(),
            min_size
        ));
    }

    let mut file = File::open(output).map_err(|e| format!("Cannot open output file: {}", e))?;
    let mut buffer = [0u8; 16];
    let read = file
        .read(&mut buffer)
        .map_err(|e| format!("Cannot read output file: {}", e))?;
    if read == 0 {
        return Err("Output file returned no data".to_string());
    }

    Ok(())
}

/// Move a finished partial file into place, refusing empty or missing ones.
pub fn promote_partial(partial: &Path, output: &Path) -> io::Result<()> {
    if let Err(reason) = verify_output_integrity(partial, 1) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, reason));
    }
    fs::rename(partial, output)
}

/// Remove a leftover partial file; a missing file is fine.
pub fn discard_partial(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => debug!(path = %partial.display(), "Removed partial output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %partial.display(), error = %e, "⚠️ Failed to remove partial output"),
    }
}

/// Delete `input` only if `output` passes [`verify_output_integrity`].
pub fn safe_delete_original(input: &Path, output: &Path, min_output_size: u64) -> io::Result<()> {
    if let Err(reason) = verify_output_integrity(output, min_output_size) {
        warn!(
            input = %input.display(),
            reason = %reason,
            "🛡️ Output integrity check failed, original kept"
        );
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Output integrity check failed: {}", reason),
        ));
    }

    fs::remove_file(input)
}

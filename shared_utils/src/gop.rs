//! Keyframe interval (GOP) estimation from probed frame rate.
//!
//! Target is ten seconds of frames. `r_frame_rate` is preferred and
//! `avg_frame_rate` is only consulted when it is absent or a sentinel
//! (`0/0`, `N/A`, `unknown`). A present rate that is malformed or not
//! positive gives the fixed default.

use crate::probe_text::ProbeRecord;
use tracing::debug;

/// GOP used when no frame rate can be determined.
pub const DEFAULT_GOP: u32 = 240;

/// Seconds of video between keyframes.
pub const GOP_SECONDS: f64 = 10.0;

/// Frame-rate values ffprobe prints when the rate is unknown.
pub const FRAME_RATE_SENTINELS: &[&str] = &["0/0", "N/A", "unknown"];

/// Parse `"N/D"` (D > 0) or a bare decimal into frames per second.
///
/// Returns `None` for any other shape, a zero denominator, or a non-finite
/// result. Zero and negative rates are returned as parsed; callers decide.
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let s = s.trim();
    let rate = match s.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den <= 0.0 {
                return None;
            }
            num / den
        }
        None => s.parse::<f64>().ok()?,
    };
    rate.is_finite().then_some(rate)
}

fn usable_rate<'a>(record: &'a ProbeRecord, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .filter(|raw| !FRAME_RATE_SENTINELS.contains(raw))
}

/// Strictly positive frame rate, or `None` when the default GOP applies.
pub fn detect_fps(record: &ProbeRecord) -> Option<f64> {
    let raw = usable_rate(record, "r_frame_rate")
        .or_else(|| usable_rate(record, "avg_frame_rate"))?;
    parse_frame_rate(raw).filter(|fps| *fps > 0.0)
}

/// GOP for an already known frame rate.
pub fn gop_for_fps(fps: f64) -> u32 {
    if !fps.is_finite() || fps <= 0.0 {
        return DEFAULT_GOP;
    }
    // f64 -> u32 casts saturate
    ((fps * GOP_SECONDS).round() as u32).max(1)
}

/// Never fails; degrades to [`DEFAULT_GOP`].
pub fn estimate_gop(record: &ProbeRecord) -> u32 {
    match detect_fps(record) {
        Some(fps) => gop_for_fps(fps),
        None => {
            debug!(
                default_gop = DEFAULT_GOP,
                "Frame rate undeterminable, using default GOP"
            );
            DEFAULT_GOP
        }
    }
}

/// [`estimate_gop`] over raw probe text.
pub fn estimate(probe_text: &str) -> u32 {
    estimate_gop(&ProbeRecord::parse(probe_text))
}

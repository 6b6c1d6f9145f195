//! Audio plan: copy the source track, or re-encode it to the target codec.

use crate::probe_text::ProbeRecord;
use serde::{Deserialize, Serialize};

/// Channel count assumed when the probe does not report one.
pub const DEFAULT_CHANNELS: u32 = 2;
/// Target bitrate for mono/stereo sources.
pub const STEREO_BITRATE_KBPS: u32 = 256;
/// Per-channel budget for multichannel sources.
pub const PER_CHANNEL_BITRATE_KBPS: u32 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AudioPlan {
    /// Copy the source audio stream verbatim.
    Passthrough,
    Transcode {
        codec: String,
        bitrate_kbps: u32,
        channel_layout: Option<String>,
    },
}

impl AudioPlan {
    pub fn is_passthrough(&self) -> bool {
        matches!(self, AudioPlan::Passthrough)
    }

    pub fn describe(&self) -> String {
        match self {
            AudioPlan::Passthrough => "copy".to_string(),
            AudioPlan::Transcode {
                codec,
                bitrate_kbps,
                channel_layout: Some(layout),
            } => format!("{} {}k ({})", codec, bitrate_kbps, layout),
            AudioPlan::Transcode {
                codec,
                bitrate_kbps,
                channel_layout: None,
            } => format!("{} {}k", codec, bitrate_kbps),
        }
    }
}

/// Bitrate before the source cap is applied.
pub fn base_bitrate_kbps(channels: u32) -> u32 {
    if channels <= 2 {
        STEREO_BITRATE_KBPS
    } else {
        channels.saturating_mul(PER_CHANNEL_BITRATE_KBPS)
    }
}

/// Explicit layout for the channel counts encoders tend to misread.
pub fn channel_layout_hint(channels: u32) -> Option<&'static str> {
    match channels {
        6 => Some("5.1"),
        8 => Some("7.1"),
        _ => None,
    }
}

/// Decide the plan for one audio stream's probe record.
pub fn resolve_plan(record: &ProbeRecord, target_codec: &str) -> AudioPlan {
    if record.is_empty() {
        return AudioPlan::Passthrough;
    }

    let source_codec = match record.get("codec_name") {
        Some(codec) if !codec.eq_ignore_ascii_case(target_codec) => codec,
        _ => return AudioPlan::Passthrough,
    };

    let channels = record
        .get_parsed::<u32>("channels")
        .unwrap_or(DEFAULT_CHANNELS);
    let mut bitrate_kbps = base_bitrate_kbps(channels);

    // never upscale a low-bitrate lossy source
    if let Some(source_kbps) = record.get_parsed::<u64>("bit_rate").map(|bps| bps / 1000) {
        if source_kbps > 0 && source_kbps < u64::from(bitrate_kbps) {
            bitrate_kbps = source_kbps as u32;
        }
    }

    tracing::debug!(
        source_codec,
        target_codec,
        channels,
        bitrate_kbps,
        "Audio will be transcoded"
    );

    AudioPlan::Transcode {
        codec: target_codec.to_string(),
        bitrate_kbps,
        channel_layout: channel_layout_hint(channels).map(str::to_string),
    }
}

/// [`resolve_plan`] over raw probe text.
pub fn resolve(probe_text: &str, target_codec: &str) -> AudioPlan {
    resolve_plan(&ProbeRecord::parse(probe_text), target_codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcode(bitrate_kbps: u32, layout: Option<&str>) -> AudioPlan {
        AudioPlan::Transcode {
            codec: "opus".to_string(),
            bitrate_kbps,
            channel_layout: layout.map(str::to_string),
        }
    }

    #[test]
    fn test_no_audio_is_passthrough() {
        assert_eq!(resolve("", "opus"), AudioPlan::Passthrough);
    }

    #[test]
    fn test_already_target_codec_is_passthrough() {
        assert_eq!(resolve("codec_name=opus\nchannels=2", "opus"), AudioPlan::Passthrough);
        assert_eq!(resolve("codec_name=OPUS", "opus"), AudioPlan::Passthrough);
    }

    #[test]
    fn test_unknown_codec_is_passthrough() {
        assert_eq!(resolve("channels=6\nbit_rate=640000", "opus"), AudioPlan::Passthrough);
        assert_eq!(resolve("codec_name=\nchannels=2", "opus"), AudioPlan::Passthrough);
    }

    #[test]
    fn test_surround_clamped_to_source() {
        let plan = resolve("codec_name=aac\nchannels=6\nbit_rate=384000", "opus");
        assert_eq!(plan, transcode(384, Some("5.1")));
    }

    #[test]
    fn test_stereo_not_clamped_when_source_higher() {
        let plan = resolve("codec_name=eac3\nchannels=2\nbit_rate=640000", "opus");
        assert_eq!(plan, transcode(256, None));
    }

    #[test]
    fn test_seven_one_layout_and_budget() {
        let plan = resolve("codec_name=truehd\nchannels=8\nbit_rate=N/A", "opus");
        assert_eq!(plan, transcode(640, Some("7.1")));
    }

    #[test]
    fn test_missing_channels_defaults_to_stereo() {
        assert_eq!(resolve("codec_name=mp3", "opus"), transcode(256, None));
        assert_eq!(resolve("codec_name=mp3\nchannels=x", "opus"), transcode(256, None));
    }

    #[test]
    fn test_low_bitrate_stereo_clamped() {
        let plan = resolve("codec_name=aac\nchannels=2\nbit_rate=128000", "opus");
        assert_eq!(plan, transcode(128, None));
    }

    #[test]
    fn test_zero_source_bitrate_ignored() {
        let plan = resolve("codec_name=aac\nchannels=2\nbit_rate=999", "opus");
        assert_eq!(plan, transcode(256, None));
    }

    #[test]
    fn test_odd_channel_count_has_no_layout() {
        assert_eq!(resolve("codec_name=dts\nchannels=3", "opus"), transcode(240, None));
        assert_eq!(resolve("codec_name=dts\nchannels=1", "opus"), transcode(256, None));
    }

    #[test]
    fn test_describe() {
        assert_eq!(AudioPlan::Passthrough.describe(), "copy");
        assert_eq!(transcode(384, Some("5.1")).describe(), "opus 384k (5.1)");
        assert_eq!(transcode(256, None).describe(), "opus 256k");
    }

    #[test]
    fn test_plan_serializes_with_mode_tag() {
        let json = serde_json::to_value(transcode(384, Some("5.1"))).unwrap();
        assert_eq!(json["mode"], "transcode");
        assert_eq!(json["bitrate_kbps"], 384);
        let json = serde_json::to_value(AudioPlan::Passthrough).unwrap();
        assert_eq!(json["mode"], "passthrough");
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_bitrate_never_exceeds_positive_source(
            channels in 1u32..16,
            source_bps in 1000u64..2_000_000
        ) {
            let text = format!("codec_name=ac3\nchannels={}\nbit_rate={}", channels, source_bps);
            match resolve(&text, "opus") {
                AudioPlan::Transcode { bitrate_kbps, .. } => {
                    prop_assert!(u64::from(bitrate_kbps) <= source_bps / 1000);
                    prop_assert!(bitrate_kbps <= base_bitrate_kbps(channels));
                }
                AudioPlan::Passthrough => prop_assert!(false, "expected transcode"),
            }
        }
    }
}

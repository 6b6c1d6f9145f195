//! Encode Parameter Set
//!
//! Composes the color, GOP and audio resolvers with the caller's CRF/preset
//! into the complete description of one file's encode, and renders it as
//! ffmpeg flags.

use crate::audio_plan::{self, AudioPlan};
use crate::color_params::ResolvedColorParams;
use crate::crf_constants::{
    crf_in_range, film_grain_in_range, preset_in_range, AV1_CRF_DEFAULT, AV1_CRF_MAX,
    FILM_GRAIN_DEFAULT, FILM_GRAIN_MAX, SVT_PRESET_DEFAULT, SVT_PRESET_MAX,
};
use crate::errors::{EncodeError, Result};
use crate::gop;
use crate::probe_text::ProbeRecord;
use serde::{Deserialize, Serialize};

pub const VIDEO_ENCODER: &str = "libsvtav1";
/// 10-bit output avoids banding even for 8-bit sources.
pub const PIXEL_FORMAT: &str = "yuv420p10le";
pub const DEFAULT_AUDIO_CODEC: &str = "opus";

/// Caller-supplied knobs; everything else is derived from the probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeSettings {
    pub crf: u8,
    pub preset: u8,
    /// SVT-AV1 film-grain synthesis strength, 0 = off
    pub film_grain: u8,
    /// Target audio codec name as ffprobe reports it (`opus`, `aac`, ...)
    pub audio_codec: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            crf: AV1_CRF_DEFAULT,
            preset: SVT_PRESET_DEFAULT,
            film_grain: FILM_GRAIN_DEFAULT,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
        }
    }
}

impl EncodeSettings {
    pub fn validate(&self) -> Result<()> {
        if !crf_in_range(self.crf) {
            return Err(EncodeError::ConversionError(format!(
                "CRF {} out of range 0..={}",
                self.crf, AV1_CRF_MAX
            )));
        }
        if !preset_in_range(self.preset) {
            return Err(EncodeError::ConversionError(format!(
                "preset {} out of range 0..={}",
                self.preset, SVT_PRESET_MAX
            )));
        }
        if !film_grain_in_range(self.film_grain) {
            return Err(EncodeError::ConversionError(format!(
                "film grain {} out of range 0..={}",
                self.film_grain, FILM_GRAIN_MAX
            )));
        }
        if self.audio_codec.trim().is_empty() {
            return Err(EncodeError::ConversionError(
                "audio codec must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// ffmpeg encoder implementing a codec name.
pub fn audio_encoder_name(codec: &str) -> &str {
    match codec {
        "opus" => "libopus",
        "vorbis" => "libvorbis",
        "mp3" => "libmp3lame",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParameterSet {
    pub color: ResolvedColorParams,
    pub gop: u32,
    pub audio: AudioPlan,
    pub crf: u8,
    pub preset: u8,
    pub film_grain: u8,
}

impl EncodeParameterSet {
    /// Resolve from the first video stream's record and, if present, the
    /// first audio stream's record. Fails only when color fallback is
    /// impossible.
    pub fn resolve(
        video: &ProbeRecord,
        audio: &ProbeRecord,
        settings: &EncodeSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let color = ResolvedColorParams::resolve(video)?;
        let gop = gop::estimate_gop(video);
        let audio = audio_plan::resolve_plan(audio, &settings.audio_codec);

        Ok(Self {
            color,
            gop,
            audio,
            crf: settings.crf,
            preset: settings.preset,
            film_grain: settings.film_grain,
        })
    }

    /// Same as [`resolve`](Self::resolve), from raw probe text.
    pub fn from_probe_text(
        video_text: &str,
        audio_text: &str,
        settings: &EncodeSettings,
    ) -> Result<Self> {
        Self::resolve(
            &ProbeRecord::parse(video_text),
            &ProbeRecord::parse(audio_text),
            settings,
        )
    }

    /// Stream mapping, video, color and audio flags. Input and output
    /// arguments are left to the caller.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-map", "0:v:0", "-map", "0:a:0?", "-c:v", VIDEO_ENCODER,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend([
            "-crf".to_string(),
            self.crf.to_string(),
            "-preset".to_string(),
            self.preset.to_string(),
            "-g".to_string(),
            self.gop.to_string(),
            "-pix_fmt".to_string(),
            PIXEL_FORMAT.to_string(),
        ]);

        if self.film_grain > 0 {
            args.push("-svtav1-params".to_string());
            args.push(format!("film-grain={}", self.film_grain));
        }

        args.extend([
            "-color_range".to_string(),
            self.color.range.clone(),
            "-colorspace".to_string(),
            self.color.space.clone(),
            "-color_trc".to_string(),
            self.color.transfer.clone(),
            "-color_primaries".to_string(),
            self.color.primaries.clone(),
        ]);

        match &self.audio {
            AudioPlan::Passthrough => {
                args.push("-c:a".to_string());
                args.push("copy".to_string());
            }
            AudioPlan::Transcode {
                codec,
                bitrate_kbps,
                channel_layout,
            } => {
                args.push("-c:a".to_string());
                args.push(audio_encoder_name(codec).to_string());
                args.push("-b:a".to_string());
                args.push(format!("{}k", bitrate_kbps));
                if let Some(layout) = channel_layout {
                    args.push("-af".to_string());
                    args.push(format!("aformat=channel_layouts={}", layout));
                }
            }
        }

        args
    }

    pub fn summary(&self) -> String {
        format!(
            "CRF {} • preset {} • GOP {} • color {}/{}/{}/{} • audio {}",
            self.crf,
            self.preset,
            self.gop,
            self.color.range,
            self.color.space,
            self.color.transfer,
            self.color.primaries,
            self.audio.describe()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD_VIDEO: &str = "color_range=tv\ncolor_space=bt709\ncolor_transfer=bt709\n\
                            color_primaries=bt709\nheight=1080\nr_frame_rate=24000/1001";

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_resolve_composes_all_resolvers() {
        let params = EncodeParameterSet::from_probe_text(
            "height=2160\nr_frame_rate=0/0\navg_frame_rate=30/1",
            "codec_name=aac\nchannels=6\nbit_rate=384000",
            &EncodeSettings::default(),
        )
        .unwrap();

        assert_eq!(params.color.space, "bt2020nc");
        assert_eq!(params.color.transfer, "smpte2084");
        assert_eq!(params.gop, 300);
        assert_eq!(
            params.audio,
            AudioPlan::Transcode {
                codec: "opus".to_string(),
                bitrate_kbps: 384,
                channel_layout: Some("5.1".to_string()),
            }
        );
        assert_eq!(params.crf, AV1_CRF_DEFAULT);
        assert_eq!(params.preset, SVT_PRESET_DEFAULT);
    }

    #[test]
    fn test_missing_height_fails_whole_set() {
        let err = EncodeParameterSet::from_probe_text(
            "r_frame_rate=30/1",
            "",
            &EncodeSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::MetadataError { .. }));
    }

    #[test]
    fn test_complete_probe_needs_no_height() {
        let params = EncodeParameterSet::from_probe_text(
            "color_range=tv\ncolor_space=bt709\ncolor_transfer=bt709\ncolor_primaries=bt709",
            "",
            &EncodeSettings::default(),
        )
        .unwrap();
        assert_eq!(params.gop, gop::DEFAULT_GOP);
        assert!(params.audio.is_passthrough());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = EncodeSettings {
            crf: 70,
            ..EncodeSettings::default()
        };
        assert!(matches!(
            EncodeParameterSet::from_probe_text(HD_VIDEO, "", &settings),
            Err(EncodeError::ConversionError(_))
        ));

        let settings = EncodeSettings {
            audio_codec: " ".to_string(),
            ..EncodeSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_args_for_passthrough() {
        let settings = EncodeSettings {
            crf: 28,
            preset: 4,
            ..EncodeSettings::default()
        };
        let params =
            EncodeParameterSet::from_probe_text(HD_VIDEO, "codec_name=opus", &settings).unwrap();
        let args = params.to_ffmpeg_args();

        assert_eq!(flag_value(&args, "-c:v"), Some("libsvtav1"));
        assert_eq!(flag_value(&args, "-crf"), Some("28"));
        assert_eq!(flag_value(&args, "-preset"), Some("4"));
        assert_eq!(flag_value(&args, "-g"), Some("240"));
        assert_eq!(flag_value(&args, "-pix_fmt"), Some(PIXEL_FORMAT));
        assert_eq!(flag_value(&args, "-color_range"), Some("tv"));
        assert_eq!(flag_value(&args, "-colorspace"), Some("bt709"));
        assert_eq!(flag_value(&args, "-color_trc"), Some("bt709"));
        assert_eq!(flag_value(&args, "-color_primaries"), Some("bt709"));
        assert_eq!(flag_value(&args, "-c:a"), Some("copy"));
        assert!(!args.iter().any(|a| a == "-b:a"));
        assert!(!args.iter().any(|a| a == "-svtav1-params"));
    }

    #[test]
    fn test_args_for_surround_transcode() {
        let settings = EncodeSettings {
            film_grain: 8,
            ..EncodeSettings::default()
        };
        let params = EncodeParameterSet::from_probe_text(
            HD_VIDEO,
            "codec_name=dts\nchannels=8\nbit_rate=1509000",
            &settings,
        )
        .unwrap();
        let args = params.to_ffmpeg_args();

        assert_eq!(flag_value(&args, "-svtav1-params"), Some("film-grain=8"));
        assert_eq!(flag_value(&args, "-c:a"), Some("libopus"));
        assert_eq!(flag_value(&args, "-b:a"), Some("640k"));
        assert_eq!(flag_value(&args, "-af"), Some("aformat=channel_layouts=7.1"));
    }

    #[test]
    fn test_args_start_with_stream_mapping() {
        let params =
            EncodeParameterSet::from_probe_text(HD_VIDEO, "", &EncodeSettings::default()).unwrap();
        let args = params.to_ffmpeg_args();
        assert_eq!(&args[..4], &["-map", "0:v:0", "-map", "0:a:0?"]);
    }

    #[test]
    fn test_audio_encoder_names() {
        assert_eq!(audio_encoder_name("opus"), "libopus");
        assert_eq!(audio_encoder_name("vorbis"), "libvorbis");
        assert_eq!(audio_encoder_name("aac"), "aac");
        assert_eq!(audio_encoder_name("flac"), "flac");
    }

    #[test]
    fn test_summary_mentions_every_part() {
        let params =
            EncodeParameterSet::from_probe_text(HD_VIDEO, "", &EncodeSettings::default()).unwrap();
        let summary = params.summary();
        assert!(summary.contains("GOP 240"));
        assert!(summary.contains("tv/bt709/bt709/bt709"));
        assert!(summary.contains("audio copy"));
    }

    #[test]
    fn test_parameter_set_json_round_trip() {
        let params =
            EncodeParameterSet::from_probe_text(HD_VIDEO, "", &EncodeSettings::default()).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        let back: EncodeParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}

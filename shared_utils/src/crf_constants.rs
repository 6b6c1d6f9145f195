//! Encoder Bounds Module
//!
//! CRF, preset and film-grain ranges for SVT-AV1, shared by the CLI
//! validators and [`EncodeSettings`](crate::encode_params::EncodeSettings).

// ============================================================================
// AV1 CRF
// ============================================================================

/// AV1 minimum CRF (highest quality)
pub const AV1_CRF_MIN: u8 = 0;

/// AV1 maximum CRF (lowest quality)
pub const AV1_CRF_MAX: u8 = 63;

/// AV1 default CRF (good quality)
pub const AV1_CRF_DEFAULT: u8 = 30;

// ============================================================================
// SVT-AV1 preset
// ============================================================================

/// Slowest, best compression
pub const SVT_PRESET_MIN: u8 = 0;

/// Fastest
pub const SVT_PRESET_MAX: u8 = 13;

pub const SVT_PRESET_DEFAULT: u8 = 6;

// ============================================================================
// Film grain synthesis
// ============================================================================

/// 0 disables grain synthesis
pub const FILM_GRAIN_MIN: u8 = 0;

pub const FILM_GRAIN_MAX: u8 = 50;

pub const FILM_GRAIN_DEFAULT: u8 = 0;

pub fn crf_in_range(crf: u8) -> bool {
    (AV1_CRF_MIN..=AV1_CRF_MAX).contains(&crf)
}

pub fn preset_in_range(preset: u8) -> bool {
    (SVT_PRESET_MIN..=SVT_PRESET_MAX).contains(&preset)
}

pub fn film_grain_in_range(grain: u8) -> bool {
    (FILM_GRAIN_MIN..=FILM_GRAIN_MAX).contains(&grain)
}

//! Color Parameter Resolver
//!
//! Probed color metadata always wins. When a value is missing, `unknown` or
//! `N/A`, a fallback is picked from the stream height using a fixed table.

use crate::errors::{EncodeError, Result};
use crate::probe_text::ProbeRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Probe values that mean "the container did not say".
pub const UNSET_SENTINELS: &[&str] = &["unknown", "N/A"];

/// Lower bound (inclusive) of the UHD band.
pub const UHD_HEIGHT_THRESHOLD: u32 = 2160;
/// Lower bound (inclusive) of the HD band.
pub const HD_HEIGHT_THRESHOLD: u32 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorAttribute {
    Range,
    Space,
    Transfer,
    Primaries,
}

impl ColorAttribute {
    pub const ALL: [ColorAttribute; 4] = [
        ColorAttribute::Range,
        ColorAttribute::Space,
        ColorAttribute::Transfer,
        ColorAttribute::Primaries,
    ];

    /// ffprobe field name carrying this attribute.
    pub fn probe_key(&self) -> &'static str {
        match self {
            ColorAttribute::Range => "color_range",
            ColorAttribute::Space => "color_space",
            ColorAttribute::Transfer => "color_transfer",
            ColorAttribute::Primaries => "color_primaries",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorAttribute::Range => "range",
            ColorAttribute::Space => "space",
            ColorAttribute::Transfer => "transfer",
            ColorAttribute::Primaries => "primaries",
        }
    }
}

impl fmt::Display for ColorAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorAttribute {
    type Err = EncodeError;

    /// Accepts the short name (`space`) or the probe key (`color_space`).
    fn from_str(s: &str) -> Result<Self> {
        ColorAttribute::ALL
            .into_iter()
            .find(|a| s == a.as_str() || s == a.probe_key())
            .ok_or_else(|| EncodeError::InvalidAttribute(s.to_string()))
    }
}

/// Height band used to index the fallback table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightBand {
    Uhd,
    Hd,
    Sd,
}

impl HeightBand {
    pub fn from_height(height: u32) -> Self {
        if height >= UHD_HEIGHT_THRESHOLD {
            HeightBand::Uhd
        } else if height >= HD_HEIGHT_THRESHOLD {
            HeightBand::Hd
        } else {
            HeightBand::Sd
        }
    }

    fn index(&self) -> usize {
        match self {
            HeightBand::Uhd => 0,
            HeightBand::Hd => 1,
            HeightBand::Sd => 2,
        }
    }
}

/// Fallback values per attribute, columns ordered [UHD, HD, SD].
const FALLBACK_TABLE: [(ColorAttribute, [&str; 3]); 4] = [
    (ColorAttribute::Range, ["tv", "tv", "tv"]),
    (ColorAttribute::Space, ["bt2020nc", "bt709", "smpte170m"]),
    (ColorAttribute::Transfer, ["smpte2084", "bt709", "bt709"]),
    (ColorAttribute::Primaries, ["bt2020", "bt709", "smpte170m"]),
];

/// Table lookup only; no probing involved.
pub fn fallback_for(attribute: ColorAttribute, band: HeightBand) -> &'static str {
    FALLBACK_TABLE
        .iter()
        .find(|(a, _)| *a == attribute)
        .map(|(_, row)| row[band.index()])
        // every variant has a row
        .unwrap_or("bt709")
}

fn is_usable(value: &str) -> bool {
    !value.is_empty() && !UNSET_SENTINELS.contains(&value)
}

/// Resolve one attribute from a parsed record.
pub fn resolve_attribute(record: &ProbeRecord, attribute: ColorAttribute) -> Result<String> {
    if let Some(value) = record.get(attribute.probe_key()) {
        if is_usable(value) {
            return Ok(value.to_string());
        }
    }

    let height_text = record.get("height").ok_or_else(|| EncodeError::MetadataError {
        attribute: attribute.as_str(),
        reason: "height is missing from probe output".to_string(),
    })?;
    let height = height_text
        .parse::<u32>()
        .map_err(|_| EncodeError::MetadataError {
            attribute: attribute.as_str(),
            reason: format!("height '{}' is not a non-negative integer", height_text),
        })?;

    let band = HeightBand::from_height(height);
    let value = fallback_for(attribute, band);
    debug!(
        attribute = attribute.as_str(),
        height,
        band = ?band,
        fallback = value,
        "Color metadata not probed, using height-based fallback"
    );
    Ok(value.to_string())
}

/// Resolve one attribute straight from probe text.
pub fn resolve(probe_text: &str, attribute: ColorAttribute) -> Result<String> {
    resolve_attribute(&ProbeRecord::parse(probe_text), attribute)
}

/// Resolve an attribute given by name; unknown names fail with `InvalidAttribute`.
pub fn resolve_named(probe_text: &str, attribute: &str) -> Result<String> {
    resolve(probe_text, attribute.parse()?)
}

/// All four color values handed to the encoder. Never holds a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColorParams {
    pub range: String,
    pub space: String,
    pub transfer: String,
    pub primaries: String,
}

impl ResolvedColorParams {
    pub fn resolve(record: &ProbeRecord) -> Result<Self> {
        Ok(Self {
            range: resolve_attribute(record, ColorAttribute::Range)?,
            space: resolve_attribute(record, ColorAttribute::Space)?,
            transfer: resolve_attribute(record, ColorAttribute::Transfer)?,
            primaries: resolve_attribute(record, ColorAttribute::Primaries)?,
        })
    }

    pub fn get(&self, attribute: ColorAttribute) -> &str {
        match attribute {
            ColorAttribute::Range => &self.range,
            ColorAttribute::Space => &self.space,
            ColorAttribute::Transfer => &self.transfer,
            ColorAttribute::Primaries => &self.primaries,
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_probed_value_is_returned_verbatim(
            value in "[a-z0-9-]{1,16}",
            attr_idx in 0usize..4
        ) {
            prop_assume!(!UNSET_SENTINELS.contains(&value.as_str()));
            let attr = ColorAttribute::ALL[attr_idx];
            let text = format!("{}={}", attr.probe_key(), value);
            prop_assert_eq!(resolve(&text, attr).unwrap(), value);
        }

        #[test]
        fn prop_resolved_params_never_hold_sentinels(
            height in 0u32..10000,
            sentinel_idx in 0usize..2
        ) {
            let s = UNSET_SENTINELS[sentinel_idx];
            let text = format!(
                "color_range={s}\ncolor_space={s}\ncolor_transfer={s}\ncolor_primaries={s}\nheight={height}"
            );
            let params = ResolvedColorParams::resolve(&ProbeRecord::parse(&text)).unwrap();
            for attr in ColorAttribute::ALL {
                prop_assert!(!UNSET_SENTINELS.contains(&params.get(attr)));
                prop_assert!(!params.get(attr).is_empty());
            }
        }
    }
}

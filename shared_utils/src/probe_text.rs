//! Probe Text Module
//!
//! Parses the line-oriented `key=value` output that ffprobe prints with
//! `-of default=noprint_wrappers=1` (or `-of flat`) into a [`ProbeRecord`].
//!
//! Lookup is by substring on the key, so callers may pass a bare field name
//! (`color_space`) and still hit flat-format keys such as
//! `streams.stream.0.color_space`. A key whose last dotted segment equals the
//! requested name exactly is preferred over a plain substring hit.

use serde::Serialize;
use std::str::FromStr;

/// One stream's probe output, in line order. Immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeRecord {
    fields: Vec<(String, String)>,
}

impl ProbeRecord {
    /// Parse probe text. Lines without `=` or with an empty key are ignored;
    /// quote characters are stripped from values.
    pub fn parse(text: &str) -> Self {
        let fields = text
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_string(), strip_quotes(value)))
            })
            .collect();
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Value of the first field whose key matches `field_key`.
    ///
    /// Returns `None` when nothing matches, when the matched value is empty,
    /// or when `field_key` itself is empty.
    pub fn get(&self, field_key: &str) -> Option<&str> {
        if field_key.is_empty() {
            return None;
        }

        let hit = self
            .fields
            .iter()
            .find(|(key, _)| last_segment(key) == field_key)
            .or_else(|| self.fields.iter().find(|(key, _)| key.contains(field_key)))?;

        let value = hit.1.as_str();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// [`get`](Self::get) followed by `FromStr`; unparseable values read as absent.
    pub fn get_parsed<T: FromStr>(&self, field_key: &str) -> Option<T> {
        self.get(field_key).and_then(|v| v.parse::<T>().ok())
    }
}

/// Extract one field from raw probe text. `None` is the uniform "not found".
pub fn extract_field(probe_text: &str, field_key: &str) -> Option<String> {
    ProbeRecord::parse(probe_text)
        .get(field_key)
        .map(str::to_string)
}

fn strip_quotes(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect::<String>()
        .trim()
        .to_string()
}

fn last_segment(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_present_value_round_trips(
            key in "[a-z_]{3,16}",
            value in "[A-Za-z0-9/._-]{1,20}"
        ) {
            let text = format!("{}={}", key, value);
            prop_assert_eq!(extract_field(&text, &key), Some(value));
        }

        #[test]
        fn prop_parse_never_panics(s in ".*") {
            let record = ProbeRecord::parse(&s);
            let _ = record.get("height");
        }
    }
}

use crate::crf_constants::{AV1_CRF_DEFAULT, FILM_GRAIN_DEFAULT, SVT_PRESET_DEFAULT};
use crate::encode_params::{EncodeParameterSet, EncodeSettings, DEFAULT_AUDIO_CODEC};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Run configuration built from the command line.
#[derive(Debug, Clone)]
pub struct EncodeConfig {
    pub output_dir: Option<PathBuf>,
    /// Root of a directory run, for preserving sub-paths under `output_dir`
    pub base_dir: Option<PathBuf>,
    pub crf: u8,
    pub preset: u8,
    pub film_grain: u8,
    pub audio_codec: String,
    /// Overwrite existing outputs
    pub force: bool,
    /// Resolve and log the command without encoding
    pub dry_run: bool,
    pub delete_original: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            base_dir: None,
            crf: AV1_CRF_DEFAULT,
            preset: SVT_PRESET_DEFAULT,
            film_grain: FILM_GRAIN_DEFAULT,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            force: false,
            dry_run: false,
            delete_original: false,
        }
    }
}

impl EncodeConfig {
    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            crf: self.crf,
            preset: self.preset,
            film_grain: self.film_grain,
            audio_codec: self.audio_codec.clone(),
        }
    }

    /// Originals are never deleted on a dry run.
    pub fn should_delete_original(&self) -> bool {
        self.delete_original && !self.dry_run
    }
}

/// Outcome of one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub input_path: String,
    pub output_path: String,
    pub input_size: u64,
    pub output_size: u64,
    pub size_ratio: f64,
    pub success: bool,
    pub skipped: bool,
    pub message: String,
    pub parameters: Option<EncodeParameterSet>,
}

impl ConversionOutput {
    pub fn skipped(input_path: String, input_size: u64, reason: impl Into<String>) -> Self {
        Self {
            input_path,
            output_path: String::new(),
            input_size,
            output_size: 0,
            size_ratio: 0.0,
            success: false,
            skipped: true,
            message: reason.into(),
            parameters: None,
        }
    }
}

impl crate::cli_runner::CliProcessingResult for ConversionOutput {
    fn is_skipped(&self) -> bool {
        self.skipped
    }

    fn is_success(&self) -> bool {
        self.success && !self.skipped
    }

    fn skip_reason(&self) -> Option<&str> {
        if self.skipped {
            Some(&self.message)
        } else {
            None
        }
    }

    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> Option<&str> {
        if self.output_path.is_empty() {
            None
        } else {
            Some(&self.output_path)
        }
    }

    fn input_size(&self) -> u64 {
        self.input_size
    }

    fn output_size(&self) -> Option<u64> {
        if self.output_size == 0 {
            None
        } else {
            Some(self.output_size)
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

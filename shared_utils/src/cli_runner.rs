//! Single-file / directory driver shared by the CLI.
//!
//! A directory run collects supported videos smallest first and converts
//! them one at a time. Per-file failures are tallied and reported; only
//! errors that would fail every file (a missing tool) stop the batch.

use crate::batch::{collect_files, BatchResult, SUPPORTED_VIDEO_EXTENSIONS};
use crate::errors::EncodeError;
use crate::report::print_summary_report;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

pub trait CliProcessingResult {
    fn is_skipped(&self) -> bool;
    fn is_success(&self) -> bool;
    fn skip_reason(&self) -> Option<&str>;
    fn input_path(&self) -> &str;
    fn output_path(&self) -> Option<&str>;
    fn input_size(&self) -> u64;
    fn output_size(&self) -> Option<u64>;
    fn message(&self) -> &str;
}

pub struct CliRunnerConfig {
    pub input: PathBuf,
    pub recursive: bool,
    pub label: String,
}

pub fn run_auto_command<F, R>(config: CliRunnerConfig, converter: F) -> Result<()>
where
    F: Fn(&Path) -> std::result::Result<R, EncodeError>,
    R: CliProcessingResult,
{
    if config.input.is_dir() {
        process_directory(&config, converter)
    } else {
        process_single_file(&config, converter)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn process_directory<F, R>(config: &CliRunnerConfig, converter: F) -> Result<()>
where
    F: Fn(&Path) -> std::result::Result<R, EncodeError>,
    R: CliProcessingResult,
{
    let input = &config.input;
    let files = collect_files(input, SUPPORTED_VIDEO_EXTENSIONS, config.recursive);

    if files.is_empty() {
        anyhow::bail!(
            "❌ No video files found in directory: {}\n\
             💡 Supported video formats: {}",
            input.display(),
            SUPPORTED_VIDEO_EXTENSIONS.join(", ")
        );
    }

    info!("📂 Found {} video files to process", files.len());

    let start_time = Instant::now();
    let mut batch_result = BatchResult::new();
    let mut total_input_bytes: u64 = 0;
    let mut total_output_bytes: u64 = 0;

    for (index, file) in files.iter().enumerate() {
        info!("🎬 [{}/{}] {}", index + 1, files.len(), display_name(file));

        match converter(file) {
            Ok(result) if result.is_skipped() => {
                info!(
                    "⏭️ {} → SKIP ({})",
                    display_name(file),
                    result.skip_reason().unwrap_or("unknown")
                );
                batch_result.skip();
            }
            Ok(result) if result.is_success() => {
                info!(
                    "✅ {} → {} ({})",
                    display_name(file),
                    result.output_path().unwrap_or("?"),
                    result.message()
                );
                batch_result.success();
                total_input_bytes += result.input_size();
                total_output_bytes += result.output_size().unwrap_or(result.input_size());
            }
            Ok(result) => {
                warn!("❌ {} → FAILED ({})", display_name(file), result.message());
                batch_result.fail(file.clone(), result.message().to_string());
            }
            Err(e) if !e.is_per_file() => {
                error!("❌ {} failed: {}", file.display(), e);
                batch_result.fail(file.clone(), e.to_string());
                print_summary_report(
                    &batch_result,
                    start_time.elapsed(),
                    total_input_bytes,
                    total_output_bytes,
                    &config.label,
                );
                return Err(e.into());
            }
            Err(e) => {
                warn!("❌ {} failed: {}", file.display(), e);
                batch_result.fail(file.clone(), e.to_string());
            }
        }
    }

    print_summary_report(
        &batch_result,
        start_time.elapsed(),
        total_input_bytes,
        total_output_bytes,
        &config.label,
    );

    Ok(())
}

fn process_single_file<F, R>(config: &CliRunnerConfig, converter: F) -> Result<()>
where
    F: Fn(&Path) -> std::result::Result<R, EncodeError>,
    R: CliProcessingResult,
{
    let input = &config.input;

    if !input.exists() {
        anyhow::bail!("❌ Input not found: {}", input.display());
    }

    if !crate::batch::has_extension(input, SUPPORTED_VIDEO_EXTENSIONS) {
        anyhow::bail!(
            "❌ Not a supported video file: {}\n\
             💡 Supported video formats: {}",
            input.display(),
            SUPPORTED_VIDEO_EXTENSIONS.join(", ")
        );
    }

    let result = converter(input)?;

    info!("");
    info!("📊 Conversion Summary:");
    info!(
        "   Input:  {} ({} bytes)",
        result.input_path(),
        result.input_size()
    );
    if let Some(out_path) = result.output_path() {
        info!(
            "   Output: {} ({} bytes)",
            out_path,
            result.output_size().unwrap_or(0)
        );
    }
    info!("   Result: {}", result.message());

    if !result.is_success() && !result.is_skipped() {
        anyhow::bail!("❌ Conversion failed: {}", result.message());
    }

    Ok(())
}

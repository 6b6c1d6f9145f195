//! Report Module
//!
//! End-of-batch summary box and failure list.

use crate::batch::BatchResult;
use crate::progress::{format_bytes, format_duration};
use console::style;
use std::time::Duration;

/// Percentage saved; negative when the output grew.
pub fn size_reduction_percent(input_bytes: u64, output_bytes: u64) -> f64 {
    if input_bytes > 0 {
        (1.0 - output_bytes as f64 / input_bytes as f64) * 100.0
    } else {
        0.0
    }
}

pub fn print_summary_report(
    result: &BatchResult,
    duration: Duration,
    input_bytes: u64,
    output_bytes: u64,
    operation_name: &str,
) {
    let reduction = size_reduction_percent(input_bytes, output_bytes);

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  📊 {:<56} ║", format!("{} Summary Report", operation_name));
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  📁 Files Processed:    {:>10}                           ║", result.total);
    println!(
        "║  ✅ Succeeded:          {:>10}                           ║",
        style(result.succeeded).green()
    );
    println!(
        "║  ❌ Failed:             {:>10}                           ║",
        style(result.failed).red()
    );
    println!("║  ⏭️  Skipped:            {:>10}                           ║", result.skipped);
    println!(
        "║  📈 Success Rate:       {:>9.1}%                           ║",
        result.success_rate()
    );
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!(
        "║  💾 Input Size:         {:>10}                           ║",
        format_bytes(input_bytes)
    );
    println!(
        "║  💾 Output Size:        {:>10}                           ║",
        format_bytes(output_bytes)
    );
    println!("║  📉 Size Reduction:     {:>9.1}%                           ║", reduction);
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!(
        "║  ⏱️  Total Time:         {:>10}                           ║",
        format_duration(duration)
    );
    if result.total > 0 {
        let avg_time = duration.as_secs_f64() / result.total as f64;
        println!("║  ⏱️  Avg Time/File:      {:>9.2}s                           ║", avg_time);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");

    if !result.errors.is_empty() {
        println!();
        println!("{}", style("❌ Errors encountered:").red().bold());
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for (path, error) in &result.errors {
            println!("   {} → {}", path.display(), error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_print_summary_report_no_panic() {
        let mut result = BatchResult::new();
        result.success();
        result.fail(PathBuf::from("clip.mp4"), "Metadata error".to_string());
        print_summary_report(&result, Duration::from_secs(10), 1000, 500, "AV1");
    }

    #[test]
    fn test_print_summary_report_empty() {
        print_summary_report(&BatchResult::new(), Duration::from_secs(1), 0, 0, "AV1");
    }

    #[test]
    fn test_size_reduction() {
        assert!((size_reduction_percent(1000, 500) - 50.0).abs() < 0.01);
        assert!((size_reduction_percent(1000, 250) - 75.0).abs() < 0.01);
        assert!((size_reduction_percent(500, 1000) + 100.0).abs() < 0.01);
        assert_eq!(size_reduction_percent(0, 10), 0.0);
    }
}

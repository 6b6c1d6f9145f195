//! Progress display
//!
//! indicatif bar for a single encode, plus the byte and duration
//! formatters used in reports. Bars are hidden when stderr is not a
//! terminal so piped runs only get log lines.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

pub mod progress_style {
    /// (filled, current, empty)
    pub const PROGRESS_CHARS: &str = "█▓░";

    /// Braille spinner
    pub const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

    /// Encode bar: position is per-mille of the duration
    pub const ENCODE_TEMPLATE: &str = "{spinner:.green} {prefix:.cyan.bold} ▕{bar:35.green/black}▏ {percent:>3}% • ⏱️ {elapsed_precise} (ETA: {eta}) • {msg}";

    pub const SPINNER_TEMPLATE: &str = "{spinner:.green} {prefix:.cyan.bold} {msg}";
}

/// Resolution of the encode bar.
pub const ENCODE_BAR_STEPS: u64 = 1000;

fn draw_enabled() -> bool {
    console::Term::stderr().is_term()
}

fn styled(pb: ProgressBar, template: &str, prefix: &str) -> ProgressBar {
    if !draw_enabled() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        return pb;
    }
    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(progress_style::PROGRESS_CHARS)
        .tick_chars(progress_style::SPINNER_CHARS);
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Encode bar driven by a 0.0 - 1.0 fraction via [`set_fraction`].
/// Without a known duration a spinner is shown instead.
pub fn create_encode_bar(has_duration: bool, prefix: &str) -> ProgressBar {
    if has_duration {
        styled(
            ProgressBar::new(ENCODE_BAR_STEPS),
            progress_style::ENCODE_TEMPLATE,
            prefix,
        )
    } else {
        styled(
            ProgressBar::new_spinner(),
            progress_style::SPINNER_TEMPLATE,
            prefix,
        )
    }
}

pub fn set_fraction(pb: &ProgressBar, fraction: f64) {
    pb.set_position(fraction_to_position(fraction));
}

fn fraction_to_position(fraction: f64) -> u64 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * ENCODE_BAR_STEPS as f64).round() as u64
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

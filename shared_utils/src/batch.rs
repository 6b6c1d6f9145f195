//! Batch Processing Module
//!
//! File collection for directory runs and the per-batch tally.
//! Smallest files are processed first so quick wins show up early.

use crate::path_validator::is_produced_output;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Inputs picked up from a directory walk.
pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "webm", "m4v", "wmv", "flv", "ts", "m2ts",
];

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .map(|ext| extensions.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    // depth 0 is the root itself, which may be "." or a dot-directory
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Regular, non-hidden files with a matching extension that this tool did not
/// produce, smallest first.
pub fn collect_files(dir: &Path, extensions: &[&str], recursive: bool) -> Vec<PathBuf> {
    let walker = if recursive {
        WalkDir::new(dir).follow_links(true)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_extension(e.path(), extensions))
        .filter(|e| !is_produced_output(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();

    sort_by_size_ascending(files)
}

/// Ties (and unreadable sizes) fall back to path order for a stable run.
pub fn sort_by_size_ascending(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut sized: Vec<(u64, PathBuf)> = files
        .into_iter()
        .map(|p| (std::fs::metadata(&p).map(|m| m.len()).unwrap_or(u64::MAX), p))
        .collect();
    sized.sort();
    sized.into_iter().map(|(_, p)| p).collect()
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, size: usize) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    #[test]
    fn test_collect_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let big = write(tmp.path(), "big.mp4", 300);
        let small = write(tmp.path(), "small.MOV", 10);
        let mid = write(tmp.path(), "mid.ts", 100);
        write(tmp.path(), "notes.txt", 5);
        write(tmp.path(), ".hidden.mp4", 1);
        write(tmp.path(), "small_av1.mkv", 1);
        write(tmp.path(), "ep.AV1.partial.mkv", 1);

        let files = collect_files(tmp.path(), SUPPORTED_VIDEO_EXTENSIONS, false);
        assert_eq!(files, vec![small, mid, big]);
    }

    #[test]
    fn test_collect_recursive_skips_hidden_dirs() {
        let tmp = TempDir::new().unwrap();
        let top = write(tmp.path(), "a.mkv", 10);
        let nested = write(tmp.path(), "season1/b.m2ts", 20);
        write(tmp.path(), ".cache/c.mp4", 1);

        let flat = collect_files(tmp.path(), SUPPORTED_VIDEO_EXTENSIONS, false);
        assert_eq!(flat, vec![top.clone()]);

        let deep = collect_files(tmp.path(), SUPPORTED_VIDEO_EXTENSIONS, true);
        assert_eq!(deep, vec![top, nested]);
    }

    #[test]
    fn test_has_extension_case_insensitive() {
        assert!(has_extension(Path::new("x.MKV"), SUPPORTED_VIDEO_EXTENSIONS));
        assert!(!has_extension(Path::new("x"), SUPPORTED_VIDEO_EXTENSIONS));
        assert!(!has_extension(Path::new("x.srt"), SUPPORTED_VIDEO_EXTENSIONS));
    }

    #[test]
    fn test_batch_result_mixed() {
        let mut result = BatchResult::new();
        result.success();
        result.success();
        result.fail(PathBuf::from("test.mp4"), "Error".to_string());
        result.skip();

        assert_eq!(result.total, 4);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors[0].1, "Error");
        assert_eq!(result.total, result.succeeded + result.failed + result.skipped);
    }

    #[test]
    fn test_success_rate() {
        let cases = [(10, 0, 0, 100.0), (5, 5, 0, 50.0), (3, 1, 0, 75.0), (7, 2, 1, 70.0)];
        for (success, fail, skip, expected) in cases {
            let mut result = BatchResult::new();
            (0..success).for_each(|_| result.success());
            (0..fail).for_each(|i| result.fail(PathBuf::from(format!("f{}.mp4", i)), "E".into()));
            (0..skip).for_each(|_| result.skip());
            assert!((result.success_rate() - expected).abs() < 0.001);
        }
        assert!((BatchResult::new().success_rate() - 100.0).abs() < 0.01);
    }
}

//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations,
//! such as naming and creating report files and resolving configured paths.
//!
//! 此模块提供文件系统操作的实用功能，
//! 如命名和创建报告文件以及解析配置中的路径。

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Returns the deterministic report file name for a run started at `at`,
/// e.g. `test-report-20240501_100000.txt`.
pub fn report_file_name(at: &DateTime<Local>) -> String {
    format!("test-report-{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Creates a new report file inside `dir` (creating `dir` if needed).
/// If a report with the same timestamp already exists, a `-1`, `-2`, ...
/// suffix is appended instead of overwriting it.
///
/// # Arguments
/// * `dir` - Directory that receives the report
/// * `at` - Start time of the run, used to name the file
///
/// # Returns
/// The open file and its path
pub fn create_report_file(dir: &Path, at: &DateTime<Local>) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let base = report_file_name(at);
    let stem = base.trim_end_matches(".txt");

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{stem}-{attempt}.txt")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < 1000 => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Resolves a configured path: expands `~` and environment variables, then
/// anchors relative results at `base_dir`.
///
/// # Arguments
/// * `base_dir` - Directory relative paths are resolved against
/// * `raw` - The path as written in the configuration
///
/// # Returns
/// The resolved path, or an error if an environment variable is undefined
pub fn resolve_path(base_dir: &Path, raw: &Path) -> Result<PathBuf> {
    let raw_str = raw.to_string_lossy();
    let expanded = shellexpand::full(&raw_str)
        .with_context(|| format!("Failed to expand path: {raw_str}"))?;
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base_dir.join(path))
    }
}

/// Directory containing `config_path`, or `.` for a bare file name.
pub fn config_base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_file_name_uses_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 10, 4, 9).unwrap();
        assert_eq!(report_file_name(&at), "test-report-20240501_100409.txt");
    }

    #[test]
    fn test_report_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let at = Local.with_ymd_and_hms(2024, 5, 1, 10, 4, 9).unwrap();

        let (_, first) = create_report_file(dir.path(), &at).unwrap();
        let (_, second) = create_report_file(dir.path(), &at).unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("test-report-20240501_100409-1.txt"));
    }

    #[test]
    fn test_relative_paths_are_anchored() {
        let base = Path::new("/srv/harness");
        assert_eq!(
            resolve_path(base, Path::new("data/issues.csv")).unwrap(),
            PathBuf::from("/srv/harness/data/issues.csv")
        );
        assert_eq!(
            resolve_path(base, Path::new("/abs/issues.csv")).unwrap(),
            PathBuf::from("/abs/issues.csv")
        );
    }
}

//! # Data Sources Module / 数据源模块
//!
//! Adapters that turn one physical tabular source into one `TestCaseMatrix`.
//! Every adapter strips the header row, enforces a single row width, and
//! either returns the whole matrix or fails before yielding any row.
//!
//! 将一个物理表格数据源转换为一个 `TestCaseMatrix` 的适配器。
//! 每个适配器都会去除表头行、强制统一行宽，并且要么返回完整矩阵，
//! 要么在产生任何行之前失败。

pub mod delimited;
pub mod literal;
pub mod workbook;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::matrix::TestCaseMatrix;
use crate::infra::fs::resolve_path;

pub use delimited::{read_delimited, read_delimited_with, DelimitedOptions};
pub use literal::LiteralCell;
pub use workbook::read_tabular;

/// Failures of a data-source expansion. All of them surface before any test
/// case of the affected source runs.
///
/// 数据源展开失败。所有错误都会在受影响数据源的任何测试用例运行之前暴露。
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data source not found: {origin}")]
    SourceNotFound { origin: String },

    #[error("table '{table}' not found in {origin} (available: {})", available.join(", "))]
    TableNotFound {
        origin: String,
        table: String,
        available: Vec<String>,
    },

    #[error("malformed source {origin}: record {line} has {found} fields, expected {expected}")]
    MalformedSource {
        origin: String,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("data source {origin} has no header row")]
    EmptySource { origin: String },

    #[error("delimiter '{delimiter}' is not a single-byte character")]
    InvalidDelimiter { delimiter: char },

    #[error("failed to read delimited source {origin}")]
    Delimited {
        origin: String,
        #[source]
        cause: csv::Error,
    },

    #[error("failed to read workbook {origin}")]
    Workbook {
        origin: String,
        #[source]
        cause: calamine::Error,
    },
}

/// A data source declaration as it appears in `Harness.toml`.
///
/// ```toml
/// source = { kind = "delimited", path = "data/issues.csv" }
/// source = { kind = "workbook", path = "data/issues.xlsx", sheet = "IssueData" }
/// source = { kind = "inline", columns = ["priority"], rows = [["Critical"], ["Major"]] }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Delimited {
        path: PathBuf,
        #[serde(default)]
        delimiter: Option<char>,
    },
    Workbook {
        path: PathBuf,
        sheet: String,
    },
    Inline {
        columns: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<LiteralCell>>,
    },
}

impl DataSource {
    /// Loads the source into a matrix. Relative paths are resolved against
    /// `base_dir` (normally the directory of the config file).
    pub fn load(&self, base_dir: &Path) -> Result<TestCaseMatrix, SourceError> {
        match self {
            DataSource::Delimited { path, delimiter } => {
                let path = resolve_source_path(base_dir, path)?;
                let options = match delimiter {
                    Some(c) => DelimitedOptions::with_delimiter(*c)
                        .ok_or(SourceError::InvalidDelimiter { delimiter: *c })?,
                    None => DelimitedOptions::default(),
                };
                read_delimited_with(&path, &options)
            }
            DataSource::Workbook { path, sheet } => {
                let path = resolve_source_path(base_dir, path)?;
                read_tabular(&path, sheet)
            }
            DataSource::Inline { columns, rows } => TestCaseMatrix::from_literals(
                columns.iter().cloned(),
                rows.iter()
                    .map(|r| r.iter().cloned().map(Into::into).collect::<Vec<_>>()),
            ),
        }
    }

    /// A short human-readable description, used in console output.
    pub fn describe(&self) -> String {
        match self {
            DataSource::Delimited { path, .. } => path.display().to_string(),
            DataSource::Workbook { path, sheet } => format!("{}#{}", path.display(), sheet),
            DataSource::Inline { rows, .. } => format!("inline ({} rows)", rows.len()),
        }
    }
}

fn resolve_source_path(base_dir: &Path, path: &Path) -> Result<PathBuf, SourceError> {
    resolve_path(base_dir, path).map_err(|_| SourceError::SourceNotFound {
        origin: path.display().to_string(),
    })
}

/// Fails with `SourceNotFound` unless `path` names an existing file.
pub(crate) fn ensure_exists(path: &Path) -> Result<(), SourceError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SourceError::SourceNotFound {
            origin: path.display().to_string(),
        })
    }
}

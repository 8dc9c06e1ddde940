//! # Delimited Text Adapter / 分隔文本适配器
//!
//! Reads CSV-style files. The first record is always the header; every
//! following record must have exactly as many fields as the header.
//! Column drift is a hard error rather than a skipped row.
//!
//! 读取 CSV 风格的文件。第一条记录始终是表头；之后的每条记录的字段数
//! 必须与表头完全一致。列漂移是硬错误，而不是跳过该行。

use csv::{ErrorKind, ReaderBuilder, StringRecord};
use std::path::Path;

use crate::core::cell::{CanonicalCell, CellValue, RawText};
use crate::core::matrix::{Row, TestCaseMatrix};
use crate::sources::{ensure_exists, SourceError};

/// Parsing options for delimited files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedOptions {
    pub delimiter: u8,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl DelimitedOptions {
    /// Returns `None` for characters that do not fit in one byte.
    pub fn with_delimiter(delimiter: char) -> Option<Self> {
        u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .map(|delimiter| Self { delimiter })
    }
}

/// Reads a comma-delimited file into a matrix.
///
/// # Errors
/// - `SourceNotFound` if `path` is not an existing file
/// - `EmptySource` if there is no header record
/// - `MalformedSource` if any record's width differs from the header's
///
/// 将逗号分隔的文件读取为矩阵。
pub fn read_delimited(path: &Path) -> Result<TestCaseMatrix, SourceError> {
    read_delimited_with(path, &DelimitedOptions::default())
}

/// Like [`read_delimited`], with explicit parsing options.
pub fn read_delimited_with(
    path: &Path,
    options: &DelimitedOptions,
) -> Result<TestCaseMatrix, SourceError> {
    ensure_exists(path)?;
    let origin = path.display().to_string();
    let wrap = |cause: csv::Error| map_csv_error(&origin, cause);

    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(wrap)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(wrap)?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        return Err(SourceError::EmptySource {
            origin: origin.clone(),
        });
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(wrap)?;
        rows.push(Row::new(i + 1, normalize_record(&record)));
    }

    Ok(TestCaseMatrix::from_checked_rows(columns, rows))
}

fn normalize_record(record: &StringRecord) -> Vec<CellValue> {
    record.iter().map(|field| RawText(field).into_cell()).collect()
}

/// Width mismatches reported by the csv reader become `MalformedSource`;
/// everything else is passed through as the underlying cause.
fn map_csv_error(origin: &str, cause: csv::Error) -> SourceError {
    if let ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = cause.kind()
    {
        return SourceError::MalformedSource {
            origin: origin.to_string(),
            line: pos.as_ref().map(|p| p.line()).unwrap_or_default(),
            expected: *expected_len as usize,
            found: *len as usize,
        };
    }
    SourceError::Delimited {
        origin: origin.to_string(),
        cause,
    }
}

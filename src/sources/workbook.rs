//! # Workbook Adapter / 工作簿适配器
//!
//! Reads one named sheet from a spreadsheet workbook (xlsx, xlsm, xls, ods).
//! Unlike delimited text, workbook cells carry native types, which are
//! coerced into canonical cells here:
//!
//! - date-formatted numbers become `Date`
//! - other numbers become the text of their 32-bit integer part (truncated,
//!   saturating at the `i32` bounds)
//! - booleans become `Bool`
//! - formulas become their formula text, never the cached result
//! - error and absent cells become `Empty`
//!
//! 从电子表格工作簿中读取一个指定名称的工作表。与分隔文本不同，工作簿单元格
//! 带有原生类型，这里将它们强制转换为规范单元格。

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use std::path::Path;

use crate::core::cell::{
    clamped_integer_text, truncated_integer_text, CanonicalCell, CellValue, RawText,
};
use crate::core::matrix::{Row, TestCaseMatrix};
use crate::sources::{ensure_exists, SourceError};

/// A typed workbook cell together with its formula text, if it has one.
#[derive(Debug, Clone, Copy)]
pub struct TypedCell<'a> {
    pub value: &'a Data,
    pub formula: Option<&'a str>,
}

impl CanonicalCell for TypedCell<'_> {
    fn into_cell(self) -> CellValue {
        if let Some(formula) = self.formula.filter(|f| !f.is_empty()) {
            return CellValue::Text(formula.to_string());
        }
        match self.value {
            Data::Int(i) => CellValue::Text(clamped_integer_text(*i)),
            Data::Float(f) => CellValue::Text(truncated_integer_text(*f)),
            Data::String(s) => RawText(s).into_cell(),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match self.value.as_datetime() {
                Some(date) => CellValue::Date(date),
                None => CellValue::Text(truncated_integer_text(dt.as_f64())),
            },
            Data::DateTimeIso(s) => match self.value.as_datetime() {
                Some(date) => CellValue::Date(date),
                None => RawText(s).into_cell(),
            },
            Data::DurationIso(s) => RawText(s).into_cell(),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

/// Reads the sheet `table` of the workbook at `path` into a matrix.
///
/// The first row of the sheet's used range is the header. Rows whose cells
/// are all empty are skipped, so trailing or interior blank rows never
/// produce test cases. Row indices keep their position in the sheet
/// (counted from the header), so a skipped row leaves a gap.
///
/// 读取 `path` 处工作簿中的 `table` 工作表。已用区域的第一行是表头；
/// 全空的行会被跳过。
///
/// # Errors
/// - `SourceNotFound` if `path` is not an existing file
/// - `TableNotFound` if the workbook has no sheet named `table`
/// - `EmptySource` if the sheet has no content at all
pub fn read_tabular(path: &Path, table: &str) -> Result<TestCaseMatrix, SourceError> {
    ensure_exists(path)?;
    let origin = path.display().to_string();
    let workbook_error = |cause: calamine::Error| SourceError::Workbook {
        origin: origin.clone(),
        cause,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == table) {
        return Err(SourceError::TableNotFound {
            origin: origin.clone(),
            table: table.to_string(),
            available,
        });
    }

    let values = workbook.worksheet_range(table).map_err(workbook_error)?;
    // Not every container exposes formulas; without them cells keep their values.
    let formulas = workbook.worksheet_formula(table).ok();

    normalize_range(&origin, &values, formulas.as_ref())
}

/// Turns a sheet's used range into a matrix. The header is the first row of
/// the used range, not physical row 0: leading blank rows above it are
/// ignored and never become data rows. Row indices stay relative to the
/// header, so an interior blank row leaves a gap.
fn normalize_range(
    origin: &str,
    values: &Range<Data>,
    formulas: Option<&Range<String>>,
) -> Result<TestCaseMatrix, SourceError> {
    let Some((first_row, first_col)) = values.start() else {
        return Err(SourceError::EmptySource {
            origin: origin.to_string(),
        });
    };

    let normalize_row = |offset: usize, cells: &[Data]| -> Vec<CellValue> {
        let abs_row = first_row + offset as u32;
        cells
            .iter()
            .enumerate()
            .map(|(col, value)| {
                let formula = formulas
                    .and_then(|f| f.get_value((abs_row, first_col + col as u32)))
                    .map(String::as_str);
                TypedCell { value, formula }.into_cell()
            })
            .collect()
    };

    let mut sheet_rows = values.rows().enumerate();
    let columns: Vec<String> = match sheet_rows.next() {
        Some((offset, header)) => normalize_row(offset, header)
            .iter()
            .map(|cell| cell.as_text().into_owned())
            .collect(),
        None => {
            return Err(SourceError::EmptySource {
                origin: origin.to_string(),
            });
        }
    };

    let mut rows = Vec::new();
    for (offset, cells) in sheet_rows {
        let normalized = normalize_row(offset, cells);
        if normalized.iter().all(CellValue::is_empty) {
            continue;
        }
        rows.push(Row::new(offset, normalized));
    }

    Ok(TestCaseMatrix::from_checked_rows(columns, rows))
}

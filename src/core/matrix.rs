//! # Test Case Matrix Module / 测试用例矩阵模块
//!
//! The format-agnostic result of reading a data source: an ordered list of
//! fixed-width rows plus the declared column names. A matrix is built once
//! and never mutated; drivers consume it sequentially, split it into
//! disjoint slices for concurrent workers, or convert each row into a
//! positional-argument tuple.
//!
//! 读取数据源后与格式无关的结果：一组有序的定宽行以及声明的列名。
//! 矩阵只构建一次且不可变；驱动程序可以顺序消费它、将其拆分为互不相交的切片
//! 供并发工作者使用，或将每一行转换为位置参数元组。

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::core::cell::{CanonicalCell, CellValue};
use crate::sources::SourceError;

/// Origin label used in errors for matrices built from in-code literals.
pub const INLINE_ORIGIN: &str = "<inline>";

/// Errors raised when a row is converted into typed arguments.
/// 将行转换为类型化参数时产生的错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("row {row} has {found} cells but {expected} arguments were requested")]
    Arity {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}, column {column}: expected {expected}, found {found} cell '{value}'")]
    Conversion {
        row: usize,
        column: usize,
        expected: &'static str,
        found: &'static str,
        value: String,
    },
    #[error("row {row} has no column {column}")]
    MissingColumn { row: usize, column: usize },
}

/// One data row. `index` is the 1-based position of the row among the data
/// rows of its source (the header is not counted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    index: usize,
    cells: Vec<CellValue>,
}

impl Row {
    pub fn new(index: usize, cells: Vec<CellValue>) -> Self {
        Self { index, cells }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn get(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Text of the cell at `column`; out-of-range columns read as `""`.
    pub fn text(&self, column: usize) -> String {
        self.cells
            .get(column)
            .map(|c| c.as_text().into_owned())
            .unwrap_or_default()
    }

    /// Converts the cell at `column` into `T`.
    pub fn parse<T: FromCell>(&self, column: usize) -> Result<T, RowError> {
        let cell = self.cells.get(column).ok_or(RowError::MissingColumn {
            row: self.index,
            column,
        })?;
        T::from_cell(cell).ok_or_else(|| RowError::Conversion {
            row: self.index,
            column,
            expected: T::EXPECTED,
            found: cell.kind(),
            value: cell.as_text().into_owned(),
        })
    }
}

/// An immutable, rectangular set of test-case rows.
/// 一个不可变的矩形测试用例行集合。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseMatrix {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl TestCaseMatrix {
    /// Assembles a matrix from rows that an adapter has already checked for
    /// width; used by the adapters in `crate::sources`.
    pub(crate) fn from_checked_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.width() == columns.len()));
        Self { columns, rows }
    }

    /// Builds a matrix from in-code literal rows, enforcing the same width
    /// invariant as the file adapters.
    ///
    /// 从代码内的字面量行构建矩阵，并执行与文件适配器相同的宽度约束。
    ///
    /// # Errors
    /// `SourceError::MalformedSource` if a row's width differs from the
    /// number of columns.
    pub fn from_literals<C, R>(columns: C, rows: R) -> Result<Self, SourceError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = Vec<CellValue>>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut out = Vec::new();
        for (i, raw) in rows.into_iter().enumerate() {
            if raw.len() != columns.len() {
                return Err(SourceError::MalformedSource {
                    origin: INLINE_ORIGIN.to_string(),
                    line: (i + 1) as u64,
                    expected: columns.len(),
                    found: raw.len(),
                });
            }
            let cells = raw.into_iter().map(CanonicalCell::into_cell).collect();
            out.push(Row::new(i + 1, cells));
        }
        Ok(Self {
            columns,
            rows: out,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width shared by every row (the number of declared columns).
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Presents each row as a positional-argument tuple.
    ///
    /// ```
    /// use api_harness::core::matrix::TestCaseMatrix;
    ///
    /// let matrix = TestCaseMatrix::from_literals(
    ///     ["priority", "weight"],
    ///     vec![vec!["Major".into(), 2i64.into()]],
    /// ).unwrap();
    /// let args: Vec<(String, i64)> = matrix.tuples().collect::<Result<_, _>>().unwrap();
    /// assert_eq!(args, vec![("Major".to_string(), 2)]);
    /// ```
    pub fn tuples<T: FromRow>(&self) -> impl Iterator<Item = Result<T, RowError>> {
        self.rows.iter().map(T::from_row)
    }

    /// Splits the rows into at most `parts` contiguous, disjoint slices that
    /// together cover every row exactly once. Earlier slices take the
    /// remainder, so slice lengths differ by at most one.
    ///
    /// 将行拆分为最多 `parts` 个连续且互不相交的切片，所有切片恰好覆盖每一行一次。
    pub fn partition(&self, parts: usize) -> Vec<&[Row]> {
        let parts = parts.max(1).min(self.rows.len());
        if parts == 0 {
            return Vec::new();
        }
        let base = self.rows.len() / parts;
        let remainder = self.rows.len() % parts;

        let mut slices = Vec::with_capacity(parts);
        let mut start = 0;
        for i in 0..parts {
            let len = base + usize::from(i < remainder);
            slices.push(&self.rows[start..start + len]);
            start += len;
        }
        slices
    }
}

impl<'a> IntoIterator for &'a TestCaseMatrix {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Conversion from a single cell into a test argument.
pub trait FromCell: Sized {
    /// Name of the expected cell kind, for error messages.
    const EXPECTED: &'static str;

    fn from_cell(cell: &CellValue) -> Option<Self>;
}

impl FromCell for CellValue {
    const EXPECTED: &'static str = "any";

    fn from_cell(cell: &CellValue) -> Option<Self> {
        Some(cell.clone())
    }
}

impl FromCell for String {
    const EXPECTED: &'static str = "text";

    fn from_cell(cell: &CellValue) -> Option<Self> {
        Some(cell.as_text().into_owned())
    }
}

impl FromCell for Option<String> {
    const EXPECTED: &'static str = "optional text";

    fn from_cell(cell: &CellValue) -> Option<Self> {
        if cell.is_empty() {
            Some(None)
        } else {
            Some(Some(cell.as_text().into_owned()))
        }
    }
}

impl FromCell for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Integer(i) => Some(*i),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromCell for u16 {
    const EXPECTED: &'static str = "integer in 0..=65535";

    fn from_cell(cell: &CellValue) -> Option<Self> {
        i64::from_cell(cell).and_then(|i| u16::try_from(i).ok())
    }
}

impl FromCell for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Bool(b) => Some(*b),
            CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromCell for NaiveDateTime {
    const EXPECTED: &'static str = "date";

    fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Conversion from a whole row into a positional-argument tuple whose arity
/// must equal the row width.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, RowError>;
}

macro_rules! impl_from_row {
    ($arity:expr => $($idx:tt $ty:ident),+) => {
        impl<$($ty: FromCell),+> FromRow for ($($ty,)+) {
            fn from_row(row: &Row) -> Result<Self, RowError> {
                if row.width() != $arity {
                    return Err(RowError::Arity {
                        row: row.index(),
                        expected: $arity,
                        found: row.width(),
                    });
                }
                Ok(($(row.parse::<$ty>($idx)?,)+))
            }
        }
    };
}

impl_from_row!(1 => 0 A);
impl_from_row!(2 => 0 A, 1 B);
impl_from_row!(3 => 0 A, 1 B, 2 C);
impl_from_row!(4 => 0 A, 1 B, 2 C, 3 D);
impl_from_row!(5 => 0 A, 1 B, 2 C, 3 D, 4 E);
impl_from_row!(6 => 0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_from_row!(7 => 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_from_row!(8 => 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);

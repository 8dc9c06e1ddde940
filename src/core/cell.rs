//! # Cell Model Module / 单元格模型模块
//!
//! This module defines the canonical cell value shared by every data source,
//! and the `CanonicalCell` trait that turns a physical cell (raw delimited
//! text, a typed workbook cell, an inline literal) into that value.
//!
//! 此模块定义所有数据源共享的规范单元格值，以及将物理单元格
//! （分隔文本、带类型的工作簿单元格、内联字面量）转换为该值的 `CanonicalCell` trait。

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Display format used when a date cell is rendered as text.
pub const DATE_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single normalized cell.
/// Downstream code never sees an absent cell: missing content is `Empty`,
/// whose text form is the empty string.
///
/// 单个规范化的单元格。
/// 下游代码永远不会看到缺失的单元格：没有内容时为 `Empty`，其文本形式为空字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Date(NaiveDateTime),
    #[default]
    Empty,
}

impl CellValue {
    /// Returns the text form of the cell. `Empty` yields `""`.
    /// 返回单元格的文本形式。`Empty` 返回 `""`。
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Integer(i) => Cow::Owned(i.to_string()),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Date(d) => Cow::Owned(d.format(DATE_TEXT_FORMAT).to_string()),
            CellValue::Empty => Cow::Borrowed(""),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Short name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Text(_) => "text",
            CellValue::Integer(_) => "integer",
            CellValue::Bool(_) => "boolean",
            CellValue::Date(_) => "date",
            CellValue::Empty => "empty",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        RawText(value).into_cell()
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value)
    }
}

/// Normalizes one physical cell into a `CellValue`.
///
/// Each data source provides its own implementation; after ingestion the rest
/// of the crate never branches on where a cell came from.
///
/// 将一个物理单元格规范化为 `CellValue`。
/// 每个数据源提供自己的实现；导入之后，crate 的其余部分不再区分单元格来源。
pub trait CanonicalCell {
    fn into_cell(self) -> CellValue;
}

/// A field of a delimited text file. Delimited text carries no type
/// information, so it is never coerced beyond empty/non-empty.
#[derive(Debug, Clone, Copy)]
pub struct RawText<'a>(pub &'a str);

impl CanonicalCell for RawText<'_> {
    fn into_cell(self) -> CellValue {
        if self.0.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(self.0.to_string())
        }
    }
}

/// Inline literals are already typed; only zero-length text is folded into
/// `Empty`.
impl CanonicalCell for CellValue {
    fn into_cell(self) -> CellValue {
        match self {
            CellValue::Text(s) if s.is_empty() => CellValue::Empty,
            other => other,
        }
    }
}

/// Renders a numeric cell as a 32-bit integer string, truncating toward
/// zero. `10.7` becomes `"10"` and `-2.5` becomes `"-2"`. Values outside the
/// `i32` range saturate at its bounds and NaN becomes `"0"`.
///
/// 将数值单元格渲染为 32 位整数字符串，向零截断；超出范围时取边界值。
pub fn truncated_integer_text(value: f64) -> String {
    (value as i32).to_string()
}

/// Clamps a whole-number cell into the `i32` range used for numeric text.
pub fn clamped_integer_text(value: i64) -> String {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)).to_string()
}

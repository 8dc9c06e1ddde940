//! Inline literal cells, as written in `Harness.toml` (`rows = [["Critical", 1, true]]`).

use serde::{Deserialize, Serialize};

use crate::core::cell::{CanonicalCell, CellValue};

/// A literal cell value. TOML strings, integers and booleans map onto the
/// matching `CellValue` variants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LiteralCell {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl CanonicalCell for LiteralCell {
    fn into_cell(self) -> CellValue {
        match self {
            LiteralCell::Bool(b) => CellValue::Bool(b),
            LiteralCell::Integer(i) => CellValue::Integer(i),
            LiteralCell::Text(s) => CellValue::from(s),
        }
    }
}

impl From<LiteralCell> for CellValue {
    fn from(cell: LiteralCell) -> Self {
        cell.into_cell()
    }
}

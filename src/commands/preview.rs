// src/commands/preview.rs

use anyhow::{anyhow, Result};
use colored::*;
use std::path::Path;

use crate::{core::matrix::TestCaseMatrix, infra::t, sources::DataSource};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Loads one data source and prints its columns and rows.
pub fn execute(
    source: &Path,
    sheet: Option<&str>,
    delimiter: Option<char>,
    locale: &str,
) -> Result<()> {
    let data_source = infer_source(source, sheet, delimiter, locale)?;
    let matrix = data_source.load(Path::new("."))?;

    println!(
        "{}",
        t!(
            "preview_header",
            locale = locale,
            source = data_source.describe(),
            rows = matrix.len(),
            columns = matrix.width()
        )
        .bold()
    );
    print_matrix(&matrix);
    Ok(())
}

/// Picks the adapter from the file extension. Workbooks need a sheet name;
/// `.tsv` files default to a tab delimiter.
pub fn infer_source(
    path: &Path,
    sheet: Option<&str>,
    delimiter: Option<char>,
    locale: &str,
) -> Result<DataSource> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        let sheet = sheet
            .ok_or_else(|| anyhow!(t!("preview_sheet_required", locale = locale).to_string()))?;
        return Ok(DataSource::Workbook {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }

    let delimiter = delimiter.or_else(|| (extension == "tsv").then_some('\t'));
    Ok(DataSource::Delimited {
        path: path.to_path_buf(),
        delimiter,
    })
}

fn print_matrix(matrix: &TestCaseMatrix) {
    let mut widths: Vec<usize> = matrix.columns().iter().map(|c| c.chars().count()).collect();
    for row in matrix {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.as_text().chars().count());
        }
    }

    let header: Vec<String> = matrix
        .columns()
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c, w = *w))
        .collect();
    println!("  {:>5} | {}", "#", header.join(" | ").cyan());
    println!("  {}", "-".repeat(8 + widths.iter().sum::<usize>() + 3 * widths.len()));

    for row in matrix {
        let cells: Vec<String> = row
            .cells()
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell.as_text(), w = *w))
            .collect();
        println!("  {:>5} | {}", row.index(), cells.join(" | "));
    }
}

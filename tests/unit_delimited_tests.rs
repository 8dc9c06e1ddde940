mod common;

use api_harness::core::cell::CellValue;
use api_harness::sources::{read_delimited, DataSource, SourceError};
use common::write_file;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_header_is_stripped_and_rows_keep_order() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "issues.csv",
        "summary,priority\nLogin crash,Major\nTypo in footer,Minor\n",
    );

    let matrix = read_delimited(&path).unwrap();

    assert_eq!(matrix.columns(), ["summary", "priority"]);
    assert_eq!(matrix.len(), 2);
    assert_eq!(matrix.rows()[0].index(), 1);
    assert_eq!(matrix.rows()[0].text(0), "Login crash");
    assert_eq!(matrix.rows()[1].index(), 2);
    assert_eq!(matrix.rows()[1].text(1), "Minor");
}

#[test]
fn test_header_only_file_yields_no_rows() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "empty_rows.csv", "summary,priority\n");

    let matrix = read_delimited(&path).unwrap();

    assert!(matrix.is_empty());
    assert_eq!(matrix.width(), 2);
}

#[test]
fn test_empty_fields_become_empty_cells() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "gaps.csv", "summary,assignee\nOrphan issue,\n");

    let matrix = read_delimited(&path).unwrap();
    let row = &matrix.rows()[0];

    assert_eq!(row.get(1), Some(&CellValue::Empty));
    assert_eq!(row.text(1), "");
}

#[test]
fn test_quoted_fields_keep_delimiters() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "quoted.csv",
        "summary,tags\n\"Crash, then hang\",\"a,b\"\n",
    );

    let matrix = read_delimited(&path).unwrap();

    assert_eq!(matrix.width(), 2);
    assert_eq!(matrix.rows()[0].text(0), "Crash, then hang");
    assert_eq!(matrix.rows()[0].text(1), "a,b");
}

#[test]
fn test_ragged_row_fails_the_whole_source() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "ragged.csv", "a,b\n1,2\n1,2,3\n");

    let err = read_delimited(&path).unwrap_err();

    match err {
        SourceError::MalformedSource {
            expected, found, ..
        } => {
            assert_eq!(expected, 2);
            assert_eq!(found, 3);
        }
        other => panic!("expected MalformedSource, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_source_not_found() {
    let dir = tempdir().unwrap();
    let err = read_delimited(&dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, SourceError::SourceNotFound { .. }));
}

#[test]
fn test_empty_file_is_empty_source() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "blank.csv", "");
    let err = read_delimited(&path).unwrap_err();
    assert!(matches!(err, SourceError::EmptySource { .. }));
}

#[test]
fn test_custom_delimiter_through_data_source() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "issues.txt", "summary;priority\nCrash;Major\n");

    let source = DataSource::Delimited {
        path: Path::new("issues.txt").to_path_buf(),
        delimiter: Some(';'),
    };
    let matrix = source.load(dir.path()).unwrap();

    assert_eq!(matrix.columns(), ["summary", "priority"]);
    assert_eq!(matrix.rows()[0].text(1), "Major");
}

#[test]
fn test_multibyte_delimiter_is_rejected() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "issues.csv", "a\n1\n");

    let source = DataSource::Delimited {
        path: Path::new("issues.csv").to_path_buf(),
        delimiter: Some('§'),
    };
    let err = source.load(dir.path()).unwrap_err();

    assert!(matches!(err, SourceError::InvalidDelimiter { delimiter: '§' }));
}

#[test]
fn test_rows_convert_to_typed_tuples() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "typed.csv", "summary,estimate,urgent\nCrash,3,true\n");

    let matrix = read_delimited(&path).unwrap();
    let args: Vec<(String, i64, bool)> = matrix.tuples().collect::<Result<_, _>>().unwrap();

    assert_eq!(args, vec![("Crash".to_string(), 3, true)]);
}

use api_harness::core::cell::CellValue;
use api_harness::core::matrix::{RowError, TestCaseMatrix};
use api_harness::sources::SourceError;

fn priorities() -> TestCaseMatrix {
    TestCaseMatrix::from_literals(
        ["priority", "weight"],
        vec![
            vec!["Critical".into(), 1i64.into()],
            vec!["Major".into(), 2i64.into()],
            vec!["Minor".into(), 3i64.into()],
            vec!["Trivial".into(), 4i64.into()],
            vec!["Cosmetic".into(), 5i64.into()],
        ],
    )
    .unwrap()
}

#[test]
fn test_literal_rows_are_numbered_from_one() {
    let matrix = priorities();
    let indices: Vec<usize> = matrix.iter().map(|r| r.index()).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_literal_row_width_is_enforced() {
    let err = TestCaseMatrix::from_literals(
        ["priority", "weight"],
        vec![vec!["Critical".into(), 1i64.into()], vec!["Major".into()]],
    )
    .unwrap_err();

    match err {
        SourceError::MalformedSource {
            line,
            expected,
            found,
            ..
        } => {
            assert_eq!((line, expected, found), (2, 2, 1));
        }
        other => panic!("expected MalformedSource, got {other:?}"),
    }
}

#[test]
fn test_partition_covers_every_row_once() {
    let matrix = priorities();

    let slices = matrix.partition(2);
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].len(), 3);
    assert_eq!(slices[1].len(), 2);

    let flattened: Vec<usize> = slices.iter().flat_map(|s| s.iter().map(|r| r.index())).collect();
    assert_eq!(flattened, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_partition_never_yields_empty_slices() {
    let matrix = priorities();
    let slices = matrix.partition(10);
    assert_eq!(slices.len(), 5);
    assert!(slices.iter().all(|s| s.len() == 1));

    let empty = TestCaseMatrix::from_literals(["a"], Vec::<Vec<CellValue>>::new()).unwrap();
    assert!(empty.partition(4).is_empty());
}

#[test]
fn test_tuples_match_row_arity() {
    let matrix = priorities();
    let args: Vec<(String, i64)> = matrix.tuples().collect::<Result<_, _>>().unwrap();
    assert_eq!(args[4], ("Cosmetic".to_string(), 5));
}

#[test]
fn test_tuple_arity_mismatch_is_reported() {
    let matrix = priorities();
    let first = matrix.tuples::<(String,)>().next().unwrap();
    assert_eq!(
        first,
        Err(RowError::Arity {
            row: 1,
            expected: 1,
            found: 2
        })
    );
}

#[test]
fn test_tuple_conversion_error_names_the_cell() {
    let matrix = priorities();
    let first = matrix.tuples::<(i64, i64)>().next().unwrap();
    match first {
        Err(RowError::Conversion { row, column, value, .. }) => {
            assert_eq!((row, column), (1, 0));
            assert_eq!(value, "Critical");
        }
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

#[test]
fn test_optional_text_reads_empty_cells_as_none() {
    let matrix = TestCaseMatrix::from_literals(
        ["summary", "assignee"],
        vec![vec!["Crash".into(), "".into()]],
    )
    .unwrap();

    let row = &matrix.rows()[0];
    assert_eq!(row.parse::<Option<String>>(1), Ok(None));
    assert_eq!(row.parse::<Option<String>>(0), Ok(Some("Crash".to_string())));
    assert_eq!(row.parse::<String>(7), Err(RowError::MissingColumn { row: 1, column: 7 }));
}

#![cfg(feature = "test-utils")]

use dolt_middleware::prelude::*;
use dolt_middleware::test_utils::parse_csv;

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

#[test]
fn csv_round_trips_awkward_values() {
    let values = [
        "plain",
        "with,comma",
        "with \"quotes\"",
        "multi\nline",
        " leading space",
        "",
        "emoji ✓",
    ];
    let columns = cols(&["id", "note", "flag"]);
    let rows: Vec<Vec<RowValues>> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            vec![
                RowValues::Int(i as i64),
                RowValues::Text((*v).to_string()),
                RowValues::Bool(i % 2 == 0),
            ]
        })
        .collect();
    let rs = ResultSet::from_rows(columns.clone(), rows).unwrap();

    let csv = serialize(&rs, ResultFormat::Csv).unwrap();
    assert!(csv.ends_with('\n'));
    let records = parse_csv(&csv);
    assert_eq!(records.len(), values.len() + 1);
    assert_eq!(records[0], columns);
    for (i, v) in values.iter().enumerate() {
        assert_eq!(records[i + 1][0], i.to_string());
        assert_eq!(records[i + 1][1], *v);
        assert_eq!(records[i + 1][2], (i % 2 == 0).to_string());
    }
}

#[test]
fn null_renders_as_empty_in_both_formats() {
    let rs = ResultSet::from_rows(
        cols(&["name", "email"]),
        vec![vec![RowValues::Text("ann".into()), RowValues::Null]],
    )
    .unwrap();

    assert_eq!(serialize(&rs, ResultFormat::Csv).unwrap(), "name,email\nann,\n");
    assert_eq!(
        serialize(&rs, ResultFormat::Markdown).unwrap(),
        "| name | email |\n| --- | --- |\n| ann |  |\n"
    );
}

#[test]
fn markdown_keeps_rows_on_one_line() {
    let rs = ResultSet::from_rows(
        cols(&["expr"]),
        vec![vec![RowValues::Text("a|b\nc".into())]],
    )
    .unwrap();
    let md = serialize(&rs, ResultFormat::Markdown).unwrap();
    assert_eq!(md.lines().count(), 3);
    assert!(md.contains(r"a\|b<br>c"));
}

#[test]
fn empty_result_keeps_header() {
    let rs = ResultSet::new(cols(&["Database"]));
    assert_eq!(serialize(&rs, ResultFormat::Csv).unwrap(), "Database\n");
    assert_eq!(
        serialize(&rs, ResultFormat::Markdown).unwrap(),
        "| Database |\n| --- |\n"
    );
}

#[test]
fn row_missing_a_declared_column_is_an_error() {
    let mut rs = ResultSet::new(cols(&["a", "b"]));
    let foreign = ResultRow::new(
        std::sync::Arc::new(cols(&["a"])),
        vec![RowValues::Int(1)],
    );
    rs.add_row(foreign);
    for format in [ResultFormat::Csv, ResultFormat::Markdown] {
        let err = serialize(&rs, format).unwrap_err();
        assert!(matches!(err, DoltMiddlewareError::MissingColumn(ref c) if c == "b"));
    }
}

#[test]
fn repeated_column_names_keep_their_own_values() {
    // SELECT a.id, b.id FROM a JOIN b ...
    let rs = ResultSet::from_rows(
        cols(&["id", "id", "name"]),
        vec![
            vec![RowValues::Int(1), RowValues::Int(2), RowValues::Text("x".into())],
            vec![RowValues::Int(3), RowValues::Null, RowValues::Text("y".into())],
        ],
    )
    .unwrap();

    assert_eq!(
        serialize(&rs, ResultFormat::Csv).unwrap(),
        "id,id,name\n1,2,x\n3,,y\n"
    );
    assert_eq!(
        serialize(&rs, ResultFormat::Markdown).unwrap(),
        "| id | id | name |\n| --- | --- | --- |\n| 1 | 2 | x |\n| 3 |  | y |\n"
    );
}

#[test]
fn row_with_reordered_columns_is_rejected() {
    let mut rs = ResultSet::new(cols(&["a", "b"]));
    rs.add_row(ResultRow::new(
        std::sync::Arc::new(cols(&["b", "a"])),
        vec![RowValues::Int(2), RowValues::Int(1)],
    ));
    let err = serialize(&rs, ResultFormat::Csv).unwrap_err();
    assert!(matches!(err, DoltMiddlewareError::MissingColumn(ref c) if c == "a"));
}

#[test]
fn no_columns_renders_empty_in_both_formats() {
    let rs = ResultSet::new(Vec::new());
    assert_eq!(serialize(&rs, ResultFormat::Csv).unwrap(), "");
    assert_eq!(serialize(&rs, ResultFormat::Markdown).unwrap(), "");
}

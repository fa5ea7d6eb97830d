use std::sync::Arc;

use simple_query::{Attribute, QueryError, ReadModel, RecordShape, RowView, Value};

#[derive(Debug, ReadModel)]
struct Account {
    id: i64,
    #[read_model(column = "display_name")]
    name: String,
    nickname: Option<String>,
    #[read_model(skip)]
    cached_label: String,
}

fn shape(columns: &[&str]) -> RecordShape {
    let columns: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
    RecordShape::new(columns)
}

#[test]
fn attributes_list_declared_mapping() {
    assert_eq!(
        Account::attributes(),
        &[
            Attribute {
                name: "id",
                column: "id"
            },
            Attribute {
                name: "name",
                column: "display_name"
            },
            Attribute {
                name: "nickname",
                column: "nickname"
            },
        ]
    );
    assert_eq!(Account::columns(), vec!["id", "display_name", "nickname"]);
    assert_eq!(Account::name(), "Account");
}

#[test]
fn from_row_reads_mapped_columns() {
    let shape = shape(&["id", "display_name", "extra"]);
    let values = vec![Value::Int(3), Value::from("Ann"), Value::from(true)];
    let account = Account::from_row(&RowView::new(&shape, &values)).unwrap();

    assert_eq!(account.id, 3);
    assert_eq!(account.name, "Ann");
    assert_eq!(account.nickname, None);
    assert_eq!(account.cached_label, "");
}

#[test]
fn from_row_reports_type_mismatch() {
    let shape = shape(&["id", "display_name"]);
    let values = vec![Value::from("three"), Value::from("Ann")];
    let err = Account::from_row(&RowView::new(&shape, &values)).unwrap_err();
    assert!(matches!(err, QueryError::Decode { ref column, .. } if column == "id"));
}

#[test]
fn from_row_requires_non_optional_columns() {
    let shape = shape(&["id"]);
    let values = vec![Value::Int(3)];
    let err = Account::from_row(&RowView::new(&shape, &values)).unwrap_err();
    assert!(matches!(err, QueryError::Decode { ref column, .. } if column == "display_name"));
}

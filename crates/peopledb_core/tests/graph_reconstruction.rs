use peopledb_core::{reconstruct_person, Region, RepoError, ResultCursor};
use rusqlite::types::Value;
use std::collections::HashSet;

const PARENT_COLUMNS: [&str; 8] = [
    "PARENT_ID",
    "PARENT_FIRST_NAME",
    "PARENT_LAST_NAME",
    "PARENT_DOB",
    "PARENT_SALARY",
    "PARENT_EMAIL",
    "PARENT_PARENT_ID",
    "SPOUSE",
];
const CHILD_COLUMNS: [&str; 6] = [
    "CHILD_ID",
    "CHILD_FIRST_NAME",
    "CHILD_LAST_NAME",
    "CHILD_DOB",
    "CHILD_SALARY",
    "CHILD_EMAIL",
];
const ADDRESS_FIELDS: [&str; 9] = [
    "ID",
    "STREET_ADDRESS",
    "ADDRESS2",
    "CITY",
    "STATE",
    "POSTCODE",
    "COUNTY",
    "REGION",
    "COUNTRY",
];

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn columns() -> Vec<String> {
    let mut columns: Vec<String> = PARENT_COLUMNS
        .iter()
        .chain(CHILD_COLUMNS.iter())
        .map(|name| name.to_string())
        .collect();
    for prefix in ["HOME_", "BUSINESS_"] {
        columns.extend(ADDRESS_FIELDS.iter().map(|field| format!("{prefix}{field}")));
    }
    columns
}

fn parent_values(spouse: Value) -> Vec<Value> {
    vec![
        Value::Integer(10),
        text("John"),
        text("Smith"),
        text("1980-11-15T06:00:00Z"),
        text("1250.50"),
        text("john@smith.example"),
        Value::Null,
        spouse,
    ]
}

fn child_values(id: Option<i64>, first_name: &str) -> Vec<Value> {
    match id {
        Some(id) => vec![
            Value::Integer(id),
            text(first_name),
            text("Smith"),
            text("2000-11-15T06:00:00Z"),
            Value::Integer(0),
            Value::Null,
        ],
        None => vec![Value::Null; CHILD_COLUMNS.len()],
    }
}

fn address_values(id: i64, state: &str, region: &str) -> Vec<Value> {
    vec![
        Value::Integer(id),
        text("123 Birch Street"),
        Value::Null,
        text("Leeds"),
        text(state),
        text("90210"),
        text("Fulton County"),
        text(region),
        text("United States"),
    ]
}

fn null_address() -> Vec<Value> {
    vec![Value::Null; ADDRESS_FIELDS.len()]
}

fn row(
    spouse: Value,
    child: Vec<Value>,
    home: Vec<Value>,
    business: Vec<Value>,
) -> Vec<Value> {
    let mut values = parent_values(spouse);
    values.extend(child);
    values.extend(home);
    values.extend(business);
    values
}

#[test]
fn rebuilds_parent_with_three_children_and_two_addresses() {
    let rows = vec![
        row(
            Value::Integer(77),
            child_values(Some(11), "Johnny"),
            address_values(1, "WA", "WEST"),
            address_values(2, "OR", "north"),
        ),
        // Address columns after the first row are never read.
        row(
            Value::Integer(77),
            child_values(Some(12), "Bobby"),
            address_values(1, "ignored", "not-a-region"),
            null_address(),
        ),
        row(
            Value::Integer(77),
            child_values(Some(13), "Tommy"),
            null_address(),
            null_address(),
        ),
    ];
    let mut cursor = ResultCursor::new(columns(), rows);

    let parent = reconstruct_person(&mut cursor).unwrap();

    assert_eq!(parent.id(), Some(10));
    assert_eq!(parent.first_name, "John");
    assert_eq!(parent.salary.to_string(), "1250.50");
    assert_eq!(parent.email.as_deref(), Some("john@smith.example"));
    assert_eq!(parent.spouse_id, Some(77));
    assert_eq!(parent.parent_id(), None);

    let home = parent.home_address.as_ref().unwrap();
    assert_eq!(home.id, Some(1));
    assert_eq!(home.state, "WA");
    assert_eq!(home.region, Region::West);
    let business = parent.business_address.as_ref().unwrap();
    assert_eq!(business.id, Some(2));
    assert_eq!(business.state, "OR");
    assert_eq!(business.region, Region::North);

    let names: HashSet<_> = parent
        .children()
        .iter()
        .map(|child| child.first_name.as_str())
        .collect();
    assert_eq!(parent.children().len(), 3);
    assert_eq!(names, HashSet::from(["Johnny", "Bobby", "Tommy"]));
    assert!(parent
        .children()
        .iter()
        .all(|child| child.parent_id() == Some(10)));
    assert!(cursor.is_exhausted());
}

#[test]
fn null_child_rows_add_no_ghost_children() {
    let rows = vec![
        row(
            Value::Null,
            child_values(Some(11), "Johnny"),
            null_address(),
            null_address(),
        ),
        row(
            Value::Null,
            child_values(None, ""),
            null_address(),
            null_address(),
        ),
        row(
            Value::Null,
            child_values(Some(12), "Bobby"),
            null_address(),
            null_address(),
        ),
    ];
    let mut cursor = ResultCursor::new(columns(), rows);

    let parent = reconstruct_person(&mut cursor).unwrap();

    assert_eq!(parent.children().len(), 2);
    assert!(parent.home_address.is_none());
    assert!(parent.business_address.is_none());
    assert_eq!(parent.spouse_id, None);
}

#[test]
fn childless_parent_has_single_row_with_null_children() {
    let rows = vec![row(
        Value::Integer(0),
        child_values(None, ""),
        address_values(5, "WA", "EAST"),
        null_address(),
    )];
    let mut cursor = ResultCursor::new(columns(), rows);

    let parent = reconstruct_person(&mut cursor).unwrap();

    assert!(parent.children().is_empty());
    assert_eq!(parent.spouse_id, None);
    assert_eq!(parent.home_address.unwrap().region, Region::East);
}

#[test]
fn duplicate_child_rows_collapse_by_identity() {
    let rows = vec![
        row(
            Value::Null,
            child_values(Some(11), "Johnny"),
            null_address(),
            null_address(),
        ),
        row(
            Value::Null,
            child_values(Some(11), "Johnny"),
            null_address(),
            null_address(),
        ),
    ];
    let mut cursor = ResultCursor::new(columns(), rows);

    let parent = reconstruct_person(&mut cursor).unwrap();

    assert_eq!(parent.children().len(), 1);
}

#[test]
fn unknown_region_on_first_row_is_invalid_data() {
    let rows = vec![row(
        Value::Null,
        child_values(None, ""),
        address_values(1, "WA", "ATLANTIS"),
        null_address(),
    )];
    let mut cursor = ResultCursor::new(columns(), rows);

    let err = reconstruct_person(&mut cursor).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(ref message) if message.contains("ATLANTIS")));
}

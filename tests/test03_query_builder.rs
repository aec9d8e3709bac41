use dbmaker_middleware::prelude::*;
use dbmaker_middleware::test_utils::{MockDriver, mock_database};

fn database(driver: &MockDriver) -> DbMakerConnection {
    mock_database(driver, &DbMakerConfig::new("TESTDB")).unwrap()
}

fn id_rows(ids: std::ops::RangeInclusive<i64>) -> Vec<CustomDbRow> {
    ids.map(|id| CustomDbRow::from_pairs([("ID", RowValues::Int(id))]))
        .collect()
}

#[test]
fn insert_get_id_reads_the_last_serial() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    driver.on_query(
        "sysconinfo",
        vec![CustomDbRow::from_pairs([("aggregate", RowValues::from("17"))])],
    );
    let mut db = database(&driver);

    let id = db
        .table("users")
        .insert_get_id(record([("email", "a@b.c"), ("name", "Ann")]))?;

    assert_eq!(id, InsertId::Int(17));
    assert_eq!(
        driver.executed_sql(),
        [
            "insert into users(email, name) values (?, ?)",
            "select max(LAST_SERIAL) as \"aggregate\" from sysconinfo",
        ]
    );
    assert_eq!(
        driver.executed()[0].params,
        vec![RowValues::from("a@b.c"), RowValues::from("Ann")]
    );
    Ok(())
}

#[test]
fn multi_row_insert_runs_once_per_row() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let mut db = database(&driver);
    db.table("tags").insert(vec![
        record([("name", "a")]),
        record([("name", "b")]),
        record([("name", "c")]),
    ])?;
    assert_eq!(driver.prepared_sql(), ["insert into tags(name) values (?)"]);
    assert_eq!(driver.executed().len(), 3);
    Ok(())
}

#[test]
fn truncate_is_a_delete() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let mut db = database(&driver);
    db.table("sessions").truncate()?;
    assert_eq!(driver.executed_sql(), ["delete from sessions"]);
    Ok(())
}

#[test]
fn exists_goes_through_sysconinfo() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let mut db = database(&driver);
    assert!(!db.table("users").where_eq("id", 1).exists()?);

    driver.on_query(
        "SYSCONINFO",
        vec![CustomDbRow::from_pairs([("CASE", RowValues::Int(1))])],
    );
    assert!(db.table("users").where_eq("id", 1).exists()?);
    assert!(!db.table("users").where_eq("id", 1).doesnt_exist()?);

    let sql = driver.executed_sql();
    assert_eq!(
        sql[0],
        "select case when CONNECTION_ID is not null then 1 else 0 end from SYSCONINFO where exists (select * from users where id = ?)"
    );
    Ok(())
}

#[test]
fn json_predicates_are_unsupported() {
    let driver = MockDriver::new();
    let mut db = database(&driver);

    let err = db
        .table("docs")
        .where_json_contains("body->tags", "x")
        .get()
        .unwrap_err();
    assert!(matches!(err, DbMakerError::UnsupportedOperation(ref msg) if msg.contains("JSON contains")));

    let err = db
        .table("docs")
        .where_json_length("body->tags", ">", 2)
        .get()
        .unwrap_err();
    assert!(matches!(err, DbMakerError::UnsupportedOperation(ref msg) if msg.contains("JSON length")));
    assert!(driver.executed().is_empty());
}

#[test]
fn pluck_strips_table_qualifiers() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    driver.on_query(
        "from users",
        vec![
            CustomDbRow::from_pairs([("NAME", RowValues::from("Ann")), ("ID", RowValues::Int(1))]),
            CustomDbRow::from_pairs([("NAME", RowValues::from("Bob")), ("ID", RowValues::Int(2))]),
        ],
    );
    let mut db = database(&driver);

    let names = db.table("users").pluck("users.name")?;
    assert_eq!(names, vec![RowValues::from("Ann"), RowValues::from("Bob")]);

    let keyed = db.table("users").pluck_keyed("name", "id")?;
    assert_eq!(keyed[1], (RowValues::Int(2), RowValues::from("Bob")));
    Ok(())
}

#[test]
fn chunk_by_id_pages_until_a_short_page() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let mut db = database(&driver);

    driver.on_query("from items", id_rows(1..=2));
    driver.on_query("ID > ?", id_rows(3..=3));

    let mut seen = Vec::new();
    let completed = db.table("items").chunk_by_id(
        2,
        |rows| {
            seen.extend(rows.iter().filter_map(|r| r.get("ID").and_then(RowValues::as_int).copied()));
            true
        },
        "id",
        None,
    )?;

    assert!(completed);
    assert_eq!(seen, [1, 2, 3]);
    let executed = driver.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[1].params.last(), Some(&RowValues::Int(2)));
    Ok(())
}

#[test]
fn chunk_by_id_stops_when_the_callback_declines() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    driver.on_query("from items", id_rows(1..=2));
    let mut db = database(&driver);
    let completed = db.table("items").chunk_by_id(2, |_| false, "id", None)?;
    assert!(!completed);
    assert_eq!(driver.executed().len(), 1);
    Ok(())
}

#[test]
fn transaction_closure_commits() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    driver.on_statement("update users", 3);
    let mut db = database(&driver);
    let changed = db.transaction(|db| {
        db.table("users")
            .where_null("deleted_at")
            .update(record([("active", 1)]))
    })?;
    assert_eq!(changed, 3);
    assert!(!driver.autocommit());
    Ok(())
}

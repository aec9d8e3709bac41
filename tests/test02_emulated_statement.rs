use dbmaker_middleware::prelude::*;
use dbmaker_middleware::test_utils::MockDriver;

fn open(driver: &MockDriver, options: ConnectOptions) -> EmulatedConnection {
    EmulatedConnection::open(driver, "TESTDB", "SYSADM", "", options).unwrap()
}

#[test]
fn named_parameters_become_positional() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let mut conn = open(&driver, ConnectOptions::default());

    let mut stmt = conn.prepare("select * from users where id = :id and name = ':skip' or nick = :nick")?;
    stmt.bind_value(ParamKey::from(":nick"), RowValues::from("al"));
    stmt.bind_value(ParamKey::from(":id"), RowValues::Int(3));
    stmt.execute()?;

    let executed = driver.executed();
    assert_eq!(
        executed[0].sql,
        "select * from users where id = ? and name = ':skip' or nick = ?"
    );
    assert_eq!(
        executed[0].params,
        vec![RowValues::Int(3), RowValues::from("al")]
    );
    Ok(())
}

#[test]
fn rebinding_between_executions_replaces_values() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let mut conn = open(&driver, ConnectOptions::default());

    let mut stmt = conn.prepare("insert into t(a, b) values (?, ?)")?;
    stmt.bind_positional(&[RowValues::Int(1), RowValues::from("one")]);
    stmt.execute()?;
    stmt.bind_positional(&[RowValues::Int(2), RowValues::from("two")]);
    stmt.execute()?;
    stmt.execute()?;

    let params: Vec<Vec<RowValues>> = driver.executed().into_iter().map(|e| e.params).collect();
    assert_eq!(
        params,
        vec![
            vec![RowValues::Int(1), RowValues::from("one")],
            vec![RowValues::Int(2), RowValues::from("two")],
            vec![],
        ]
    );
    Ok(())
}

#[test]
fn idcap_lowercases_fetched_keys() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    driver.on_query(
        "from users",
        vec![CustomDbRow::from_pairs([
            ("ID", RowValues::Int(1)),
            ("Name", RowValues::from("Ann")),
        ])],
    );

    let mut folded = open(&driver, ConnectOptions::default().with_idcap(true));
    let mut stmt = folded.prepare("select * from users")?;
    stmt.execute()?;
    let rows = stmt.fetch_all()?;
    assert_eq!(rows[0].get("id"), Some(&RowValues::Int(1)));
    assert_eq!(rows[0].get("name").and_then(RowValues::as_text), Some("Ann"));

    let mut plain = open(&driver, ConnectOptions::default());
    let mut stmt = plain.prepare("select * from users")?;
    stmt.execute()?;
    let rows = stmt.fetch_all()?;
    assert_eq!(rows[0].get("ID"), Some(&RowValues::Int(1)));
    assert_eq!(rows[0].get("id"), None);
    Ok(())
}

#[test]
fn empty_result_fetches_nothing() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let mut conn = open(&driver, ConnectOptions::default().with_idcap(true));
    let mut stmt = conn.prepare("select * from empty_table")?;
    stmt.execute()?;
    assert!(stmt.fetch_all()?.is_empty());
    assert!(stmt.fetch()?.is_none());
    Ok(())
}

#[test]
fn driver_failures_surface_as_execution_errors() {
    let driver = MockDriver::new();
    driver.fail_on("broken", "syntax error near broken");
    let mut conn = open(&driver, ConnectOptions::default());
    let err = conn.exec("select broken").unwrap_err();
    assert!(matches!(err, DbMakerError::DriverExecutionError(_)));
}

#[test]
fn fetch_all_fails_when_the_cursor_breaks_mid_stream() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    driver.fail_fetch_after(
        "from events",
        vec![
            CustomDbRow::from_pairs([("ID", RowValues::Int(1))]),
            CustomDbRow::from_pairs([("ID", RowValues::Int(2))]),
        ],
        "communication link failure",
    );
    let mut conn = open(&driver, ConnectOptions::default().with_idcap(true));
    let mut stmt = conn.prepare("select ID from events")?;
    stmt.execute()?;

    let Err(err) = stmt.fetch_all() else {
        panic!("fetch_all should not return the rows read before the failure");
    };
    assert!(
        matches!(err, DbMakerError::DriverExecutionError(ref msg) if msg == "communication link failure"),
        "{err:?}"
    );
    Ok(())
}

#[test]
fn blobs_pass_through_unchanged() -> Result<(), DbMakerError> {
    let bytes = vec![0xff, 0x00, 0x80, 0x41];
    let driver = MockDriver::new();
    driver.on_query(
        "from files",
        vec![CustomDbRow::from_pairs([("DATA", RowValues::Blob(bytes.clone()))])],
    );
    let mut conn = open(&driver, ConnectOptions::default());

    let mut insert = conn.prepare("insert into files(data) values (:data)")?;
    insert.bind_value(ParamKey::from(":data"), RowValues::Blob(bytes.clone()));
    insert.execute()?;
    assert_eq!(driver.executed()[0].params, vec![RowValues::Blob(bytes.clone())]);

    let mut select = conn.prepare("select data from files")?;
    select.execute()?;
    let rows = select.fetch_all()?;
    assert_eq!(rows[0].get("DATA").and_then(RowValues::as_blob), Some(bytes.as_slice()));
    Ok(())
}

use dbmaker_middleware::prelude::*;
use dbmaker_middleware::test_utils::{MockDriver, MockEvent, MockNativeFactory};

fn config() -> DbMakerConfig {
    DbMakerConfig::builder("TESTDB")
        .credentials("SYSADM", "")
        .dbidcap(true)
        .finish()
}

#[test]
fn native_failure_falls_back_to_emulation() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let native = MockNativeFactory::failing("driver not installed");
    let connector = Connector::new(OdbcConnectionFactory::new(driver.clone()))
        .with_native(native.clone());

    let conn = connector.connect(&config())?;

    assert_eq!(conn.kind(), ConnectionKind::Emulated);
    assert_eq!(native.attempted_dsns(), ["odbc:TESTDB"]);
    assert_eq!(driver.opened_dsns(), ["TESTDB"]);

    let attempts = native.attempts();
    assert!(attempts[0].1.dbidcap);
    Ok(())
}

#[test]
fn native_success_skips_the_fallback() -> Result<(), DbMakerError> {
    let native_driver = MockDriver::new();
    let fallback_driver = MockDriver::new();
    let connector = Connector::new(OdbcConnectionFactory::new(fallback_driver.clone()))
        .with_native(MockNativeFactory::backed_by(native_driver.clone()));

    let db = connector.connect_database(&config())?;

    assert_eq!(db.kind(), ConnectionKind::Native);
    assert!(fallback_driver.opened_dsns().is_empty());
    assert_eq!(native_driver.opened_dsns(), ["odbc:TESTDB"]);
    Ok(())
}

#[test]
fn an_existing_odbc_prefix_is_not_doubled() {
    let native = MockNativeFactory::failing("no");
    let connector = Connector::new(OdbcConnectionFactory::new(MockDriver::new()))
        .with_native(native.clone());
    connector
        .connect(&DbMakerConfig::new("odbc:TESTDB"))
        .unwrap();
    assert_eq!(native.attempted_dsns(), ["odbc:TESTDB"]);
}

#[test]
fn fallback_failure_is_a_connection_error() {
    let driver = MockDriver::new();
    driver.fail_open("data source name not found");
    let connector = Connector::new(OdbcConnectionFactory::new(driver))
        .with_native(MockNativeFactory::failing("driver not installed"));

    let Err(err) = connector.connect(&config()) else {
        panic!("connect should fail when both strategies fail");
    };
    assert!(matches!(err, DbMakerError::ConnectionError(_)), "{err:?}");
}

#[test]
fn empty_dsn_is_rejected_before_any_attempt() {
    let driver = MockDriver::new();
    let connector = Connector::new(OdbcConnectionFactory::new(driver.clone()));
    let Err(err) = connector.connect(&DbMakerConfig::new("")) else {
        panic!("an empty dsn should be rejected");
    };
    assert!(matches!(err, DbMakerError::ConfigError(_)));
    assert!(driver.events().is_empty());
}

#[test]
fn commit_keeps_autocommit_off_but_rollback_restores_it() -> Result<(), DbMakerError> {
    let driver = MockDriver::new();
    let mut conn = Connector::new(OdbcConnectionFactory::new(driver.clone())).connect(&config())?;

    conn.begin_transaction()?;
    conn.commit()?;
    assert!(!driver.autocommit());

    conn.begin_transaction()?;
    conn.roll_back()?;
    assert!(driver.autocommit());

    assert_eq!(
        driver.events(),
        vec![
            MockEvent::Open("TESTDB".into()),
            MockEvent::SetAutocommit(false),
            MockEvent::Commit,
            MockEvent::SetAutocommit(false),
            MockEvent::Rollback,
            MockEvent::SetAutocommit(true),
        ]
    );
    Ok(())
}

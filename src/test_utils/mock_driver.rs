//! Scriptable in-memory ODBC driver.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::driver::{OdbcConnectionHandle, OdbcDriver, OdbcStatementHandle};
use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// Something the driver was asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Open(String),
    SetAutocommit(bool),
    Commit,
    Rollback,
    Prepare(String),
    Execute(ExecutedStatement),
}

/// One execution as the driver saw it: translated SQL plus positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<RowValues>,
}

#[derive(Debug, Clone)]
enum Outcome {
    Rows(Vec<CustomDbRow>),
    RowsThenFail(Vec<CustomDbRow>, String),
    Affected(i64),
    Fail(String),
}

#[derive(Debug)]
struct MockState {
    autocommit: bool,
    events: Vec<MockEvent>,
    // (substring, outcome); later rules win.
    rules: Vec<(String, Outcome)>,
    open_failure: Option<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            autocommit: true,
            events: Vec::new(),
            rules: Vec::new(),
            open_failure: None,
        }
    }
}

/// An [`OdbcDriver`] whose results are scripted by SQL substring.
///
/// Clones share state, so a test keeps one handle for scripting and assertions while the
/// connection under test owns another.
/// ```rust
/// use dbmaker_middleware::prelude::*;
/// use dbmaker_middleware::test_utils::MockDriver;
///
/// let driver = MockDriver::new();
/// driver.on_query("from users", vec![CustomDbRow::from_pairs([("ID", RowValues::Int(1))])]);
/// let mut conn = EmulatedConnection::open(&driver, "TESTDB", "", "", ConnectOptions::default())?;
/// let mut stmt = conn.prepare("select ID from users")?;
/// stmt.execute()?;
/// assert_eq!(stmt.fetch_all()?.len(), 1);
/// # Ok::<(), DbMakerError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executions whose SQL contains `pattern` yield `rows`.
    pub fn on_query(&self, pattern: &str, rows: Vec<CustomDbRow>) {
        self.lock()
            .rules
            .push((pattern.to_string(), Outcome::Rows(rows)));
    }

    /// Executions whose SQL contains `pattern` open a cursor over `rows`; the fetch after the
    /// last row fails with `message`.
    pub fn fail_fetch_after(&self, pattern: &str, rows: Vec<CustomDbRow>, message: &str) {
        self.lock().rules.push((
            pattern.to_string(),
            Outcome::RowsThenFail(rows, message.to_string()),
        ));
    }

    /// Executions whose SQL contains `pattern` report `affected` rows and no result set.
    pub fn on_statement(&self, pattern: &str, affected: i64) {
        self.lock()
            .rules
            .push((pattern.to_string(), Outcome::Affected(affected)));
    }

    /// Executions whose SQL contains `pattern` fail with `message`.
    pub fn fail_on(&self, pattern: &str, message: &str) {
        self.lock()
            .rules
            .push((pattern.to_string(), Outcome::Fail(message.to_string())));
    }

    /// Every later `open` fails with `message`.
    pub fn fail_open(&self, message: &str) {
        self.lock().open_failure = Some(message.to_string());
    }

    #[must_use]
    pub fn autocommit(&self) -> bool {
        self.lock().autocommit
    }

    #[must_use]
    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().events.clone()
    }

    #[must_use]
    pub fn opened_dsns(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Open(dsn) => Some(dsn.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn prepared_sql(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Prepare(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Execute(executed) => Some(executed.clone()),
                _ => None,
            })
            .collect()
    }

    /// SQL text of every execution, in order.
    #[must_use]
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed().into_iter().map(|e| e.sql).collect()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    fn record(&self, event: MockEvent) {
        self.lock().events.push(event);
    }
}

impl OdbcDriver for MockDriver {
    fn open(
        &self,
        dsn: &str,
        _username: &str,
        _password: &str,
    ) -> Result<Box<dyn OdbcConnectionHandle>, DbMakerError> {
        if let Some(message) = self.lock().open_failure.clone() {
            return Err(DbMakerError::ConnectionError(format!(
                "{message} (dsn `{dsn}`)"
            )));
        }
        self.record(MockEvent::Open(dsn.to_string()));
        Ok(Box::new(MockConnection {
            driver: self.clone(),
        }))
    }
}

struct MockConnection {
    driver: MockDriver,
}

impl OdbcConnectionHandle for MockConnection {
    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DbMakerError> {
        let mut state = self.driver.lock();
        state.autocommit = enabled;
        state.events.push(MockEvent::SetAutocommit(enabled));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbMakerError> {
        self.driver.record(MockEvent::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DbMakerError> {
        self.driver.record(MockEvent::Rollback);
        Ok(())
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn OdbcStatementHandle>, DbMakerError> {
        self.driver.record(MockEvent::Prepare(sql.to_string()));
        Ok(Box::new(MockStatement {
            driver: self.driver.clone(),
            sql: sql.to_string(),
            cursor: VecDeque::new(),
            fetch_failure: None,
            row_count: -1,
        }))
    }
}

struct MockStatement {
    driver: MockDriver,
    sql: String,
    cursor: VecDeque<CustomDbRow>,
    fetch_failure: Option<String>,
    row_count: i64,
}

impl OdbcStatementHandle for MockStatement {
    fn execute(&mut self, params: &[RowValues]) -> Result<(), DbMakerError> {
        let outcome = {
            let mut state = self.driver.lock();
            state.events.push(MockEvent::Execute(ExecutedStatement {
                sql: self.sql.clone(),
                params: params.to_vec(),
            }));
            state
                .rules
                .iter()
                .rev()
                .find(|(pattern, _)| self.sql.contains(pattern.as_str()))
                .map(|(_, outcome)| outcome.clone())
        };

        self.cursor.clear();
        self.fetch_failure = None;
        match outcome {
            Some(Outcome::Rows(rows)) => {
                self.row_count = i64::try_from(rows.len()).unwrap_or(i64::MAX);
                self.cursor = rows.into();
            }
            Some(Outcome::RowsThenFail(rows, message)) => {
                self.row_count = -1;
                self.cursor = rows.into();
                self.fetch_failure = Some(message);
            }
            Some(Outcome::Affected(affected)) => self.row_count = affected,
            Some(Outcome::Fail(message)) => {
                self.row_count = -1;
                return Err(DbMakerError::DriverExecutionError(message));
            }
            None => self.row_count = 0,
        }
        Ok(())
    }

    fn fetch_row(&mut self) -> Result<Option<CustomDbRow>, DbMakerError> {
        if let Some(row) = self.cursor.pop_front() {
            return Ok(Some(row));
        }
        match self.fetch_failure.take() {
            Some(message) => Err(DbMakerError::DriverExecutionError(message)),
            None => Ok(None),
        }
    }

    fn row_count(&mut self) -> Result<i64, DbMakerError> {
        Ok(self.row_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_rules_override_earlier_ones() {
        let driver = MockDriver::new();
        driver.on_statement("from t", 1);
        driver.on_statement("delete from t", 4);
        let mut conn = driver.open("TESTDB", "", "").unwrap();
        let mut stmt = conn.prepare("delete from t").unwrap();
        stmt.execute(&[]).unwrap();
        assert_eq!(stmt.row_count().unwrap(), 4);
    }

    #[test]
    fn fetch_failure_follows_the_scripted_rows() {
        let driver = MockDriver::new();
        driver.fail_fetch_after(
            "from t",
            vec![CustomDbRow::from_pairs([("ID", RowValues::Int(1))])],
            "connection reset",
        );
        let mut conn = driver.open("TESTDB", "", "").unwrap();
        let mut stmt = conn.prepare("select ID from t").unwrap();
        stmt.execute(&[]).unwrap();
        assert!(stmt.fetch_row().unwrap().is_some());
        assert!(stmt.fetch_row().is_err());

        stmt.execute(&[]).unwrap();
        assert!(stmt.fetch_row().unwrap().is_some());
    }

    #[test]
    fn open_failure_records_nothing() {
        let driver = MockDriver::new();
        driver.fail_open("refused");
        assert!(driver.open("TESTDB", "", "").is_err());
        assert!(driver.opened_dsns().is_empty());
    }
}

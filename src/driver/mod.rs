//! Call-based driver boundary.
//!
//! These traits are the ODBC-style primitives the emulation layer is built on: open a connection,
//! toggle autocommit, commit/rollback, prepare, execute with positional values, fetch one row,
//! read the row count. They report failure through `Result` rather than status codes.

#[cfg(feature = "odbc")]
pub mod odbc;

use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

#[cfg(feature = "odbc")]
pub use odbc::OdbcApiDriver;

/// Entry point of a call-based driver.
pub trait OdbcDriver: Send + Sync {
    /// Open a raw connection for `dsn`.
    ///
    /// # Errors
    /// Returns `DbMakerError::ConnectionError` if the driver cannot connect.
    fn open(
        &self,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn OdbcConnectionHandle>, DbMakerError>;
}

/// An open raw connection.
pub trait OdbcConnectionHandle: Send {
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver rejects the change.
    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DbMakerError>;

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the commit fails.
    fn commit(&mut self) -> Result<(), DbMakerError>;

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the rollback fails.
    fn rollback(&mut self) -> Result<(), DbMakerError>;

    /// Prepare SQL that uses positional `?` placeholders.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver cannot prepare the text.
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn OdbcStatementHandle>, DbMakerError>;
}

/// A prepared raw statement. Reusable across execute cycles.
pub trait OdbcStatementHandle: Send {
    /// Execute with positional values, opening a cursor when the statement yields rows.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if execution fails.
    fn execute(&mut self, params: &[RowValues]) -> Result<(), DbMakerError>;

    /// Pull exactly one row from the open cursor; `None` once exhausted or when no cursor is
    /// open.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the fetch fails.
    fn fetch_row(&mut self) -> Result<Option<CustomDbRow>, DbMakerError>;

    /// Driver row count of the last execution. `-1` when the driver does not know.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver call fails.
    fn row_count(&mut self) -> Result<i64, DbMakerError>;
}

//! The standard connection/statement contract the query layer talks to.
//!
//! Emulated connections ([`crate::emulation`]) and any host-supplied native driver implement
//! these traits; [`DbMakerConnection`] wraps whichever one the connector picked.

pub mod database;
pub mod shared;

pub use database::DbMakerConnection;
pub use shared::SharedConnection;

use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::{ConnectionKind, ParamKey, RowValues};

/// A prepared statement with named or positional parameters.
pub trait DbStatement: Send {
    /// Bind (or re-bind) a parameter. An existing key keeps its position; a new key is appended.
    fn bind_value(&mut self, key: ParamKey, value: RowValues);

    /// Execute with the currently bound values.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver rejects the execution.
    fn execute(&mut self) -> Result<(), DbMakerError>;

    /// Next row of the current result, or `None` once exhausted.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the fetch fails.
    fn fetch(&mut self) -> Result<Option<CustomDbRow>, DbMakerError>;

    /// Drain the remaining rows.
    ///
    /// # Errors
    /// Returns the first fetch error; rows fetched before it are discarded.
    fn fetch_all(&mut self) -> Result<Vec<CustomDbRow>, DbMakerError>;

    /// Rows affected by the last execution. For a `SELECT` this may be an estimate or `-1`.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver call fails.
    fn row_count(&mut self) -> Result<i64, DbMakerError>;

    /// Bind `values` to positions `1..=n`.
    fn bind_positional(&mut self, values: &[RowValues]) {
        for (idx, value) in values.iter().enumerate() {
            self.bind_value(ParamKey::Positional(idx + 1), value.clone());
        }
    }
}

/// An open connection.
pub trait DbConnection: Send {
    /// Prepare `sql`, which may use `:name` or `?` placeholders.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver cannot prepare the text.
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DbStatement>, DbMakerError>;

    /// Run `sql` without parameters.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` on prepare or execute failure.
    fn exec(&mut self, sql: &str) -> Result<(), DbMakerError>;

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if autocommit cannot be switched off.
    fn begin_transaction(&mut self) -> Result<(), DbMakerError>;

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the commit fails.
    fn commit(&mut self) -> Result<(), DbMakerError>;

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the rollback fails.
    fn roll_back(&mut self) -> Result<(), DbMakerError>;

    /// Which connector path produced this connection.
    fn kind(&self) -> ConnectionKind;
}

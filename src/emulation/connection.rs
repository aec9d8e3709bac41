use tracing::debug;

use super::statement::EmulatedStatement;
use crate::config::ConnectOptions;
use crate::connection::{DbConnection, DbStatement};
use crate::driver::{OdbcConnectionHandle, OdbcDriver};
use crate::error::DbMakerError;
use crate::types::ConnectionKind;

/// A standard connection emulated on an ODBC connection handle.
///
/// Transactions are autocommit toggles: `begin_transaction` switches autocommit off and
/// `roll_back` switches it back on. `commit` leaves autocommit off, so work after a commit keeps
/// running inside an implicit transaction until the next rollback.
pub struct EmulatedConnection {
    handle: Box<dyn OdbcConnectionHandle>,
    options: ConnectOptions,
}

impl EmulatedConnection {
    /// Open a raw connection through `driver`.
    ///
    /// # Errors
    /// Returns `DbMakerError::ConnectionError` if the driver cannot connect.
    pub fn open(
        driver: &dyn OdbcDriver,
        dsn: &str,
        username: &str,
        password: &str,
        options: ConnectOptions,
    ) -> Result<Self, DbMakerError> {
        let handle = driver.open(dsn, username, password)?;
        debug!(dsn, idcap = options.idcap, "emulated connection open");
        Ok(Self { handle, options })
    }

    #[must_use]
    pub fn options(&self) -> ConnectOptions {
        self.options
    }

    /// Prepare without boxing; same as [`DbConnection::prepare`].
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver cannot prepare the text.
    pub fn prepare_emulated(&mut self, sql: &str) -> Result<EmulatedStatement, DbMakerError> {
        EmulatedStatement::new(self.handle.as_mut(), sql, self.options)
    }
}

impl DbConnection for EmulatedConnection {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DbStatement>, DbMakerError> {
        Ok(Box::new(self.prepare_emulated(sql)?))
    }

    fn exec(&mut self, sql: &str) -> Result<(), DbMakerError> {
        self.prepare_emulated(sql)?.execute()
    }

    fn begin_transaction(&mut self) -> Result<(), DbMakerError> {
        self.handle.set_autocommit(false)
    }

    fn commit(&mut self) -> Result<(), DbMakerError> {
        self.handle.commit()
    }

    fn roll_back(&mut self) -> Result<(), DbMakerError> {
        self.handle.rollback()?;
        self.handle.set_autocommit(true)
    }

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Emulated
    }
}

impl std::fmt::Debug for EmulatedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulatedConnection")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

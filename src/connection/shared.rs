use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::DbMakerConnection;
use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// Async handle to a [`DbMakerConnection`].
///
/// Driver calls block, so every operation runs on tokio's blocking pool while holding the
/// connection lock. Clones share the same connection and queue behind one another.
#[derive(Clone)]
pub struct SharedConnection {
    inner: Arc<Mutex<DbMakerConnection>>,
}

impl SharedConnection {
    #[must_use]
    pub fn new(conn: DbMakerConnection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `func` against the connection on the blocking pool.
    ///
    /// # Errors
    /// Returns the error from `func`, or `DbMakerError::Other` if the blocking task panicked or
    /// was cancelled.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, DbMakerError>
    where
        F: FnOnce(&mut DbMakerConnection) -> Result<R, DbMakerError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.blocking_lock();
            func(&mut guard)
        })
        .await
        .map_err(|e| DbMakerError::Other(format!("DBMaker spawn_blocking join error: {e}")))?
    }

    /// # Errors
    /// Same as [`DbMakerConnection::select`].
    pub async fn select(
        &self,
        sql: &str,
        bindings: Vec<RowValues>,
    ) -> Result<Vec<CustomDbRow>, DbMakerError> {
        let sql = sql.to_string();
        self.with_connection(move |conn| conn.select(&sql, &bindings))
            .await
    }

    /// # Errors
    /// Same as [`DbMakerConnection::affecting_statement`].
    pub async fn affecting_statement(
        &self,
        sql: &str,
        bindings: Vec<RowValues>,
    ) -> Result<i64, DbMakerError> {
        let sql = sql.to_string();
        self.with_connection(move |conn| conn.affecting_statement(&sql, &bindings))
            .await
    }

    /// # Errors
    /// Same as [`DbMakerConnection::statement`].
    pub async fn statement(&self, sql: &str, bindings: Vec<RowValues>) -> Result<(), DbMakerError> {
        let sql = sql.to_string();
        self.with_connection(move |conn| conn.statement(&sql, &bindings))
            .await
    }
}

impl fmt::Debug for SharedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConnection").finish_non_exhaustive()
    }
}
